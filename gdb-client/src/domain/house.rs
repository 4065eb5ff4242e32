use serde::Deserialize;

/// A house linked to the account, as returned by the house listing
/// endpoint. Used at setup time to pick the address to poll.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct House {
    pub remote_address_id: String,
    pub address_street: String,
    /// Marked by the supplier as the currently selected house.
    #[serde(default)]
    pub selected: bool,
    pub contract_type: ContractType,
    #[serde(default)]
    pub price_category: Option<String>,
    /// Off-peak tariff windows as `("HH:MM", "HH:MM")` pairs.
    #[serde(default)]
    pub off_peak_times: Vec<(String, String)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractType {
    pub category: String,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn house_deserializes_from_api_shape() {
        let json = r#"{
            "remoteAddressId": "/houses/1234",
            "addressStreet": "12 rue Sainte-Catherine",
            "selected": true,
            "contractType": { "category": "gas", "code": "B1" },
            "priceCategory": "standard",
            "offPeakTimes": [["22:00", "06:00"]]
        }"#;

        let house: House = serde_json::from_str(json).unwrap();
        assert_eq!(house.remote_address_id, "/houses/1234");
        assert!(house.selected);
        assert_eq!(house.contract_type.category, "gas");
        assert_eq!(house.off_peak_times, vec![("22:00".to_string(), "06:00".to_string())]);
    }

    #[test]
    fn house_tolerates_missing_optional_fields() {
        let json = r#"{
            "remoteAddressId": "/houses/9",
            "addressStreet": "1 quai des Chartrons",
            "contractType": { "category": "gas", "code": "B0" }
        }"#;

        let house: House = serde_json::from_str(json).unwrap();
        assert!(!house.selected);
        assert!(house.price_category.is_none());
        assert!(house.off_peak_times.is_empty());
    }
}
