use async_trait::async_trait;
use gdb_client::domain::{SeriesId, SeriesPoint};
use time::OffsetDateTime;

use crate::reconcile::SeriesTails;
use crate::MergePlan;

pub mod memory;
pub mod questdb;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("statistics store unavailable: {0}")]
    Unavailable(String),
    #[error("statistics integrity violation: {0}")]
    Integrity(String),
}

/// Per-day figure and running sum recovered by a period query.
#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct SeriesSum {
    pub value: f64,
    pub sum: f64,
}

/// Append/query interface over the persisted cumulative series.
///
/// History is never rewritten: the only mutation is appending the
/// points of a [`MergePlan`], and that append covers all three series
/// as one atomic unit.
#[async_trait]
pub trait StatisticsStore: Send + Sync {
    /// Most recent point of a series.
    async fn last_point(&self, series: SeriesId) -> Result<Option<SeriesPoint>, StoreError>;

    /// Earliest point at or after `from` (and at or before `to`, when
    /// bounded).
    async fn sum_during_period(
        &self,
        series: SeriesId,
        from: OffsetDateTime,
        to: Option<OffsetDateTime>,
    ) -> Result<Option<SeriesSum>, StoreError>;

    /// Durably record a plan's points for all three series, or none of
    /// them.
    async fn append_plan(&self, plan: &MergePlan) -> Result<(), StoreError>;
}

/// Read the tails that seed a reconciliation cycle.
///
/// Whether prior state exists is decided from the energy-consumption
/// series alone. The running sums are then recovered from each series'
/// row at the committed boundary day instead of trusting raw last
/// points, so leftovers of an interrupted write cannot skew the seeds.
/// A series that exists without the others violates the lockstep
/// invariant and aborts the cycle.
pub async fn read_tails(store: &dyn StatisticsStore) -> Result<SeriesTails, StoreError> {
    let Some(energy_last) = store.last_point(SeriesId::EnergyConsumption).await? else {
        // Only a first run if the other two series are absent as well;
        // committed cost/volume points without energy would otherwise be
        // reseeded from 0.0 and double-counted.
        for id in [SeriesId::Cost, SeriesId::Volume] {
            if store.last_point(id).await?.is_some() {
                return Err(StoreError::Integrity(format!(
                    "series {id} has committed points but series {} has none",
                    SeriesId::EnergyConsumption
                )));
            }
        }
        return Ok(SeriesTails::default());
    };
    let boundary = energy_last.start;

    let mut tails = SeriesTails::default();
    for id in SeriesId::ALL {
        let recovered = store
            .sum_during_period(id, boundary, None)
            .await?
            .ok_or_else(|| {
                StoreError::Integrity(format!(
                    "series {id} has no point at or after the committed boundary day {boundary}"
                ))
            })?;
        let point = SeriesPoint {
            start: boundary,
            value: recovered.value,
            sum: recovered.sum,
        };
        match id {
            SeriesId::Cost => tails.cost = Some(point),
            SeriesId::EnergyConsumption => tails.energy = Some(point),
            SeriesId::Volume => tails.volume = Some(point),
        }
    }

    Ok(tails)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdb_client::domain::start_of_day;
    use time::macros::date;

    /// Store where cost and volume carry committed points but the
    /// energy-consumption series is empty, as a crashed legacy writer
    /// could leave behind.
    struct LopsidedStore;

    #[async_trait]
    impl StatisticsStore for LopsidedStore {
        async fn last_point(&self, series: SeriesId) -> Result<Option<SeriesPoint>, StoreError> {
            Ok(match series {
                SeriesId::EnergyConsumption => None,
                SeriesId::Cost | SeriesId::Volume => Some(SeriesPoint {
                    start: start_of_day(date!(2024 - 03 - 10)),
                    value: 5.0,
                    sum: 500.0,
                }),
            })
        }

        async fn sum_during_period(
            &self,
            _series: SeriesId,
            _from: OffsetDateTime,
            _to: Option<OffsetDateTime>,
        ) -> Result<Option<SeriesSum>, StoreError> {
            Ok(None)
        }

        async fn append_plan(&self, _plan: &MergePlan) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn committed_series_without_energy_abort_instead_of_reseeding() {
        let err = read_tails(&LopsidedStore).await.unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));
        assert!(err.to_string().contains("energy_consumption"));
    }
}
