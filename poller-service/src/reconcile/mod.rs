//! Incremental reconciliation of fetched daily readings into the three
//! cumulative series (cost, energy-consumption, volume).
//!
//! Pure: no I/O, no clock. The caller reads the series tails, fetches
//! and normalizes the candidate window, and persists the returned plan
//! atomically.

use gdb_client::domain::{start_of_day, DailyUsage, SeriesId, SeriesPoint};
use time::Date;

/// Most recently persisted point of each series, if any.
///
/// Whether prior state exists is decided by the energy-consumption
/// tail alone; the other two are required to agree because the three
/// series are always written together.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeriesTails {
    pub cost: Option<SeriesPoint>,
    pub energy: Option<SeriesPoint>,
    pub volume: Option<SeriesPoint>,
}

impl SeriesTails {
    /// Last committed day, when prior state exists.
    pub fn boundary(&self) -> Option<Date> {
        self.energy.map(|p| p.date())
    }
}

/// Contract violations in `merge` inputs. These indicate a bug or a
/// corrupted store, never a condition to recover from at runtime.
#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    #[error("series tails disagree on whether prior state exists: {0}")]
    InconsistentTails(String),
    #[error("candidate readings out of ascending date order at {0}")]
    UnsortedCandidates(Date),
}

/// Points to append, per series, in ascending timestamp order.
///
/// The three vectors always have the same length and timestamps: one
/// reading contributes exactly one point to each series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergePlan {
    pub cost: Vec<SeriesPoint>,
    pub energy: Vec<SeriesPoint>,
    pub volume: Vec<SeriesPoint>,
}

impl MergePlan {
    pub fn is_empty(&self) -> bool {
        self.energy.is_empty()
    }

    /// Number of new days per series.
    pub fn len(&self) -> usize {
        self.energy.len()
    }

    pub fn series(&self, id: SeriesId) -> &[SeriesPoint] {
        match id {
            SeriesId::Cost => &self.cost,
            SeriesId::EnergyConsumption => &self.energy,
            SeriesId::Volume => &self.volume,
        }
    }
}

/// Merge freshly fetched readings into the existing cumulative series.
///
/// Running sums are seeded from the tails (0.0 on first run). Readings
/// dated on or before the last committed day are discarded: the fetch
/// window deliberately re-covers that day, and the source may have
/// revised its value since it was committed. Re-summing it would
/// double-count, so late corrections for an already-committed day are
/// dropped rather than back-filled.
pub fn merge(tails: &SeriesTails, readings: &[DailyUsage]) -> Result<MergePlan, MergeError> {
    check_tails(tails)?;

    let boundary = tails.boundary();
    let mut cost_sum = tails.cost.map_or(0.0, |p| p.sum);
    let mut energy_sum = tails.energy.map_or(0.0, |p| p.sum);
    let mut volume_sum = tails.volume.map_or(0.0, |p| p.sum);

    let mut plan = MergePlan::default();
    let mut prev: Option<Date> = None;

    for read in readings {
        if let Some(prev) = prev {
            if read.date <= prev {
                return Err(MergeError::UnsortedCandidates(read.date));
            }
        }
        prev = Some(read.date);

        if let Some(boundary) = boundary {
            if read.date <= boundary {
                tracing::debug!(date = %read.date, "skipping already-committed day");
                continue;
            }
        }

        cost_sum += read.price_eur;
        energy_sum += read.energy_kwh;
        volume_sum += read.volume_m3;

        let start = start_of_day(read.date);
        plan.cost.push(SeriesPoint {
            start,
            value: read.price_eur,
            sum: cost_sum,
        });
        plan.energy.push(SeriesPoint {
            start,
            value: read.energy_kwh,
            sum: energy_sum,
        });
        plan.volume.push(SeriesPoint {
            start,
            value: read.volume_m3,
            sum: volume_sum,
        });
    }

    Ok(plan)
}

fn check_tails(tails: &SeriesTails) -> Result<(), MergeError> {
    let presence = [
        (SeriesId::Cost, tails.cost.is_some()),
        (SeriesId::EnergyConsumption, tails.energy.is_some()),
        (SeriesId::Volume, tails.volume.is_some()),
    ];
    if presence.iter().all(|(_, p)| *p) || presence.iter().all(|(_, p)| !*p) {
        return Ok(());
    }

    let detail = presence
        .iter()
        .map(|(id, p)| format!("{id}={}", if *p { "present" } else { "missing" }))
        .collect::<Vec<_>>()
        .join(", ");
    Err(MergeError::InconsistentTails(detail))
}
