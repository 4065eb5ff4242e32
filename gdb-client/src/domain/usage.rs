use time::Date;

/// One day of gas consumption as reported by the supplier.
///
/// Ephemeral: produced by the normalizer each cycle and discarded once
/// folded into the persisted series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyUsage {
    pub date: Date,
    pub energy_kwh: f64,
    pub volume_m3: f64,
    pub price_eur: f64,
    pub ratio: f64,
    pub temperature: f64,
}

/// Current-billing-period aggregate. Display only, never reconciled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalUsage {
    pub energy_kwh: f64,
    pub volume_m3: f64,
    pub price_eur: f64,
}
