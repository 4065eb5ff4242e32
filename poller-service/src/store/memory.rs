use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use gdb_client::domain::{SeriesId, SeriesPoint};
use time::OffsetDateTime;

use crate::store::{SeriesSum, StatisticsStore, StoreError};
use crate::MergePlan;

/// In-memory statistics store with the same append-only, all-or-nothing
/// semantics as the QuestDB store. Test double.
#[derive(Default)]
pub struct MemoryStore {
    series: Mutex<HashMap<SeriesId, Vec<SeriesPoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one series, ascending by timestamp.
    pub fn points(&self, series: SeriesId) -> Vec<SeriesPoint> {
        self.series
            .lock()
            .expect("memory store poisoned")
            .get(&series)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl StatisticsStore for MemoryStore {
    async fn last_point(&self, series: SeriesId) -> Result<Option<SeriesPoint>, StoreError> {
        let guard = self.series.lock().expect("memory store poisoned");
        Ok(guard.get(&series).and_then(|points| points.last().copied()))
    }

    async fn sum_during_period(
        &self,
        series: SeriesId,
        from: OffsetDateTime,
        to: Option<OffsetDateTime>,
    ) -> Result<Option<SeriesSum>, StoreError> {
        let guard = self.series.lock().expect("memory store poisoned");
        let hit = guard.get(&series).and_then(|points| {
            points
                .iter()
                .find(|p| p.start >= from && to.map_or(true, |t| p.start <= t))
        });
        Ok(hit.map(|p| SeriesSum {
            value: p.value,
            sum: p.sum,
        }))
    }

    async fn append_plan(&self, plan: &MergePlan) -> Result<(), StoreError> {
        let mut guard = self.series.lock().expect("memory store poisoned");

        // Validate every series before touching any, to keep the append
        // all-or-nothing.
        for id in SeriesId::ALL {
            let existing = guard.get(&id).map(Vec::as_slice).unwrap_or_default();
            let mut last = existing.last().map(|p| p.start);
            for p in plan.series(id) {
                if let Some(last) = last {
                    if p.start <= last {
                        return Err(StoreError::Integrity(format!(
                            "series {id}: appended point at {} does not advance past {last}",
                            p.start
                        )));
                    }
                }
                last = Some(p.start);
            }
        }

        for id in SeriesId::ALL {
            guard.entry(id).or_default().extend_from_slice(plan.series(id));
        }
        Ok(())
    }
}
