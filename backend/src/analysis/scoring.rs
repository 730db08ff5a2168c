use super::features::FeatureSet;

pub const BASELINE: f64 = 0.20;

const LARGE_MASS_AREA: f64 = 300.0;
const TEXTURE_IRREGULARITY: f64 = 500.0;

/// Open interval treated as too close to call.
const AMBIGUOUS_LOW: f64 = 0.4;
const AMBIGUOUS_HIGH: f64 = 0.6;
const TIE_BREAK_TEXTURE: f64 = 600.0;
const TIE_BREAK_NUDGE: f64 = 0.20;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub probability: f64,
    pub indicators: Vec<String>,
}

/// One additive scoring rule. `weight` and `indicator` are only consulted
/// when `fires` returns true.
pub struct Rule {
    pub name: &'static str,
    pub fires: fn(&FeatureSet) -> bool,
    pub weight: fn(&FeatureSet) -> f64,
    pub indicator: fn(&FeatureSet) -> String,
}

impl Rule {
    pub fn evaluate(&self, features: &FeatureSet) -> Option<(f64, String)> {
        (self.fires)(features).then(|| ((self.weight)(features), (self.indicator)(features)))
    }
}

/// Applied in order; indicator order follows this table.
pub const RULES: &[Rule] = &[
    Rule {
        name: "nodular_blobs",
        fires: has_nodules,
        weight: nodule_weight,
        indicator: nodule_indicator,
    },
    Rule {
        name: "large_mass",
        fires: has_large_mass,
        weight: |_| 0.20,
        indicator: |_| "Large mass detected.".to_string(),
    },
    Rule {
        name: "no_nodules",
        fires: |f| !has_nodules(f) && !has_large_mass(f),
        weight: |_| 0.0,
        indicator: |_| "No significant nodules detected.".to_string(),
    },
    Rule {
        name: "texture_irregularity",
        fires: |f| f.texture_variance > TEXTURE_IRREGULARITY,
        weight: |_| 0.15,
        indicator: |_| "Tissue texture irregularity.".to_string(),
    },
];

fn has_nodules(f: &FeatureSet) -> bool {
    f.nodular_blob_count > 0
}

fn has_large_mass(f: &FeatureSet) -> bool {
    f.max_blob_area > LARGE_MASS_AREA
}

fn nodule_weight(f: &FeatureSet) -> f64 {
    (f.nodular_blob_count as f64 * 0.15).min(0.50)
}

fn nodule_indicator(f: &FeatureSet) -> String {
    match f.nodular_blob_count {
        1 => "1 nodular structure detected.".to_string(),
        n => format!("{n} nodular structures detected."),
    }
}

pub fn score(features: &FeatureSet) -> ScoreResult {
    score_with(RULES, features)
}

pub fn score_with(rules: &[Rule], features: &FeatureSet) -> ScoreResult {
    let initial = ScoreResult {
        probability: BASELINE,
        indicators: Vec::new(),
    };
    let mut result = rules.iter().fold(initial, |mut acc, rule| {
        if let Some((weight, indicator)) = rule.evaluate(features) {
            log::trace!("rule {} fired: {:+.2}", rule.name, weight);
            acc.probability += weight;
            acc.indicators.push(indicator);
        }
        acc
    });

    tie_break(&mut result, features);
    result.probability = result.probability.clamp(0.0, 1.0);
    result
}

/// Pushes a borderline probability out of the ambiguous band, toward
/// positive when texture is strongly irregular and toward negative otherwise.
fn tie_break(result: &mut ScoreResult, features: &FeatureSet) {
    if result.probability <= AMBIGUOUS_LOW || result.probability >= AMBIGUOUS_HIGH {
        return;
    }
    if features.texture_variance > TIE_BREAK_TEXTURE {
        result.probability += TIE_BREAK_NUDGE;
        result
            .indicators
            .push("Borderline score resolved toward positive by texture irregularity.".to_string());
    } else {
        result.probability -= TIE_BREAK_NUDGE;
        result
            .indicators
            .push("Borderline score resolved toward negative by regular texture.".to_string());
    }
}
