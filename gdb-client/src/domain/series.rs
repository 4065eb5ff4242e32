use std::fmt;

use time::{macros::offset, Date, OffsetDateTime, UtcOffset};

/// The supplier reports local civil dates for a single region
/// (Bordeaux). Day boundaries are anchored at this fixed offset.
pub const SOURCE_UTC_OFFSET: UtcOffset = offset!(+1);

/// Start-of-day instant for a source-local calendar date.
pub fn start_of_day(date: Date) -> OffsetDateTime {
    date.midnight().assume_offset(SOURCE_UTC_OFFSET)
}

/// The three cumulative series kept for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesId {
    Cost,
    EnergyConsumption,
    Volume,
}

impl SeriesId {
    pub const ALL: [SeriesId; 3] = [
        SeriesId::Cost,
        SeriesId::EnergyConsumption,
        SeriesId::Volume,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SeriesId::Cost => "gazdebordeaux:energy_cost",
            SeriesId::EnergyConsumption => "gazdebordeaux:energy_consumption",
            SeriesId::Volume => "gazdebordeaux:volume",
        }
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted point of a cumulative series.
///
/// Append-only: once written, neither `value` nor `sum` is ever
/// rewritten. `sum` is the running total across the whole series up to
/// and including this point.
#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct SeriesPoint {
    pub start: OffsetDateTime,
    pub value: f64,
    pub sum: f64,
}

impl SeriesPoint {
    /// Source-local calendar date of this point.
    pub fn date(&self) -> Date {
        self.start.to_offset(SOURCE_UTC_OFFSET).date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn start_of_day_is_midnight_at_source_offset() {
        let ts = start_of_day(date!(2024 - 03 - 10));
        assert_eq!(ts.date(), date!(2024 - 03 - 10));
        assert_eq!(ts.hour(), 0);
        assert_eq!(ts.offset(), SOURCE_UTC_OFFSET);
    }

    #[test]
    fn series_point_date_round_trips() {
        let p = SeriesPoint {
            start: start_of_day(date!(2024 - 03 - 10)),
            value: 5.0,
            sum: 505.0,
        };
        assert_eq!(p.date(), date!(2024 - 03 - 10));
    }

    #[test]
    fn series_ids_are_distinct() {
        let ids: Vec<&str> = SeriesId::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|s| s.starts_with("gazdebordeaux:")));
    }
}
