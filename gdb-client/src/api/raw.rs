use std::collections::BTreeMap;

use serde::Deserialize;

/// Pseudo-key the consumptions endpoint mixes into the date-keyed
/// mapping for the billing-period aggregate.
pub const TOTAL_KEY: &str = "total";

/// One raw entry of the consumptions payload, keyed by an ISO date
/// string (or [`TOTAL_KEY`]).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawUsageEntry {
    pub kwh: f64,
    #[serde(rename = "volumeOfEnergy")]
    pub volume_of_energy: f64,
    pub price: f64,
    #[serde(default)]
    pub ratio: f64,
    #[serde(default)]
    pub temperature: f64,
}

/// Raw consumptions payload. `BTreeMap` keeps the ISO date keys in
/// chronological order, which downstream normalization relies on.
pub type RawUsagePayload = BTreeMap<String, RawUsageEntry>;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileResponse {
    #[serde(default)]
    pub selected_house: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_deserializes_dates_and_total() {
        let json = r#"{
            "2024-03-11": {"kwh": 3.0, "volumeOfEnergy": 0.3, "price": 0.4, "ratio": 11.2, "temperature": 9.5},
            "2024-03-10": {"kwh": 5.0, "volumeOfEnergy": 0.5, "price": 0.6, "ratio": 11.2, "temperature": 8.0},
            "total": {"kwh": 120.0, "volumeOfEnergy": 12.0, "price": 96.0}
        }"#;

        let payload: RawUsagePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.len(), 3);
        assert!(payload.contains_key(TOTAL_KEY));
        // Absent ratio/temperature on the aggregate default to zero.
        assert_eq!(payload[TOTAL_KEY].ratio, 0.0);

        // Date keys come back in chronological order.
        let dates: Vec<&str> = payload.keys().map(String::as_str).collect();
        assert_eq!(dates, vec!["2024-03-10", "2024-03-11", "total"]);
    }

    #[test]
    fn login_response_allows_null_token() {
        let resp: LoginResponse = serde_json::from_str(r#"{"token": null}"#).unwrap();
        assert!(resp.token.is_none());
    }
}
