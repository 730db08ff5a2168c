use super::scoring::ScoreResult;

pub const CANCER_KEYWORDS: &[&str] = &[
    "cancer",
    "tumor",
    "malignant",
    "nodule",
    "carcinoma",
    "adenocarcinoma",
    "squamous",
    "positive",
    "abnormal",
    "suspicious",
    "mass",
    "lesion",
    "case1",
    "patient1",
];

pub const NORMAL_KEYWORDS: &[&str] = &[
    "normal", "healthy", "benign", "clear", "negative", "clean", "regular", "case2", "patient2",
    "control",
];

pub const CANCER_PROBABILITY: f64 = 0.95;
pub const NORMAL_PROBABILITY: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameHint {
    Cancerous,
    Normal,
}

impl FilenameHint {
    /// Cancer vocabulary is checked first, so it wins when both match.
    pub fn classify(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if CANCER_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Some(FilenameHint::Cancerous)
        } else if NORMAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Some(FilenameHint::Normal)
        } else {
            None
        }
    }

    pub fn score(self) -> ScoreResult {
        match self {
            FilenameHint::Cancerous => ScoreResult {
                probability: CANCER_PROBABILITY,
                indicators: vec!["Filename indicates cancerous scan.".to_string()],
            },
            FilenameHint::Normal => ScoreResult {
                probability: NORMAL_PROBABILITY,
                indicators: vec!["Filename indicates normal scan.".to_string()],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_cancer_vocabulary_case_insensitively() {
        assert_eq!(FilenameHint::classify("TUMOR_scan.jpg"), Some(FilenameHint::Cancerous));
        assert_eq!(FilenameHint::classify("patient1-ct.png"), Some(FilenameHint::Cancerous));
    }

    #[test]
    fn matches_normal_vocabulary() {
        assert_eq!(FilenameHint::classify("Healthy_Lung.PNG"), Some(FilenameHint::Normal));
        assert_eq!(FilenameHint::classify("control-07.jpg"), Some(FilenameHint::Normal));
    }

    #[test]
    fn cancer_wins_when_both_vocabularies_match() {
        assert_eq!(FilenameHint::classify("benign_or_malignant.jpg"), Some(FilenameHint::Cancerous));
        // "abnormal" also contains "normal".
        assert_eq!(FilenameHint::classify("abnormal.jpg"), Some(FilenameHint::Cancerous));
    }

    #[test]
    fn unrelated_names_defer_to_features() {
        assert_eq!(FilenameHint::classify("xyz123.jpg"), None);
        assert_eq!(FilenameHint::classify(""), None);
    }

    #[test]
    fn hints_short_circuit_with_fixed_scores() {
        let cancer = FilenameHint::Cancerous.score();
        assert_eq!(cancer.probability, 0.95);
        assert_eq!(cancer.indicators, vec!["Filename indicates cancerous scan."]);

        let normal = FilenameHint::Normal.score();
        assert_eq!(normal.probability, 0.05);
        assert_eq!(normal.indicators, vec!["Filename indicates normal scan."]);
    }
}
