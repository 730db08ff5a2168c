use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Label {
    Cancerous,
    Normal,
}

/// Body of a successful `POST /predict`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionResponse {
    pub is_cancerous: bool,
    /// Percentage in `[0, 100]`, two decimals.
    pub confidence: f64,
    /// Probability in `[0, 1]`, four decimals.
    pub raw_probability: f64,
    pub label: Label,
    pub indicators: Vec<String>,
    /// Short prefix of the upload's content fingerprint.
    pub image_hash: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub system: String,
    pub cancer_samples: usize,
    pub normal_samples: usize,
    pub started_at: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn label_round_trips_through_its_display_form() {
        assert_eq!(Label::Cancerous.to_string(), "Cancerous");
        assert_eq!(Label::from_str("Normal").unwrap(), Label::Normal);
        assert!(Label::from_str("benign").is_err());
    }

    #[test]
    fn prediction_response_uses_wire_field_names() {
        let response = PredictionResponse {
            is_cancerous: false,
            confidence: 80.0,
            raw_probability: 0.2,
            label: Label::Normal,
            indicators: vec!["No significant nodules detected.".into()],
            image_hash: "deadbeef".into(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["label"], "Normal");
        assert_eq!(json["image_hash"], "deadbeef");
        assert_eq!(json["raw_probability"], 0.2);
        assert_eq!(json["is_cancerous"], false);
    }
}
