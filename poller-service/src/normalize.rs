use gdb_client::api::raw::{RawUsagePayload, TOTAL_KEY};
use gdb_client::domain::{DailyUsage, TotalUsage};
use time::{format_description::FormatItem, macros::format_description, Date};

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(thiserror::Error, Debug)]
pub enum NormalizeError {
    #[error("malformed date key {key:?} in consumptions payload: {reason}")]
    BadDateKey { key: String, reason: String },
}

/// Convert a daily-breakdown payload into typed readings, ascending by
/// date. The `"total"` pseudo-key is skipped; anything else that does
/// not parse as an ISO date is corrupted source data and aborts the
/// cycle rather than being dropped.
pub fn daily_usage(payload: &RawUsagePayload) -> Result<Vec<DailyUsage>, NormalizeError> {
    let mut reads = Vec::with_capacity(payload.len());

    // BTreeMap iteration over ISO date keys is already chronological.
    for (key, entry) in payload {
        if key == TOTAL_KEY {
            continue;
        }
        let date = Date::parse(key, &DATE_FORMAT).map_err(|e| NormalizeError::BadDateKey {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        reads.push(DailyUsage {
            date,
            energy_kwh: entry.kwh,
            volume_m3: entry.volume_of_energy,
            price_eur: entry.price,
            ratio: entry.ratio,
            temperature: entry.temperature,
        });
    }

    Ok(reads)
}

/// Extract the billing-period aggregate from a year-scale payload.
///
/// The source omits `"total"` outside a billing period; that is the one
/// absence that legitimately means "nothing to show" rather than a
/// malformed response.
pub fn total_usage(payload: &RawUsagePayload) -> Option<TotalUsage> {
    payload.get(TOTAL_KEY).map(|entry| TotalUsage {
        energy_kwh: entry.kwh,
        volume_m3: entry.volume_of_energy,
        price_eur: entry.price,
    })
}
