use shared::{Label, PredictionResponse};

use super::scoring::ScoreResult;

pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub is_positive: bool,
    pub confidence_percent: f64,
    pub label: Label,
    pub probability: f64,
    pub indicators: Vec<String>,
    pub fingerprint: String,
}

impl Verdict {
    pub fn from_score(score: ScoreResult, fingerprint: String) -> Self {
        let probability = score.probability.clamp(0.0, 1.0);
        // 0.5 exactly is Normal.
        let is_positive = probability > DECISION_THRESHOLD;
        let confidence = if is_positive {
            probability * 100.0
        } else {
            (1.0 - probability) * 100.0
        };

        Self {
            is_positive,
            confidence_percent: round_to(confidence, 2).clamp(0.0, 100.0),
            label: if is_positive { Label::Cancerous } else { Label::Normal },
            probability,
            indicators: score.indicators,
            fingerprint,
        }
    }

    pub fn short_fingerprint(&self) -> &str {
        prefix(&self.fingerprint, 8)
    }

    pub fn to_response(&self) -> PredictionResponse {
        PredictionResponse {
            is_cancerous: self.is_positive,
            confidence: self.confidence_percent,
            raw_probability: round_to(self.probability, 4),
            label: self.label,
            indicators: self.indicators.clone(),
            image_hash: self.short_fingerprint().to_string(),
        }
    }
}

pub(crate) fn prefix(s: &str, n: usize) -> &str {
    s.get(..n).unwrap_or(s)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
