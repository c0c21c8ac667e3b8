use serde::Serialize;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{HeartRiskError, Result};
use crate::features::{Features, FEATURE_COUNT};
use crate::model::{Classifier, POSITIVE_CLASS};

/// Probability above which the moderate message is shown.
pub const MODERATE_THRESHOLD: f64 = 0.5;
/// Probability above which the very-high message is shown.
pub const HIGH_THRESHOLD: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskCategory {
    High,
    Low,
}

impl RiskCategory {
    pub fn from_label(label: i32) -> Self {
        if label == POSITIVE_CLASS {
            RiskCategory::High
        } else {
            RiskCategory::Low
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            RiskCategory::High => "High Risk Detected",
            RiskCategory::Low => "Low Risk",
        }
    }

    pub fn explanation(self) -> &'static str {
        match self {
            RiskCategory::High => "The model predicts presence of heart disease.",
            RiskCategory::Low => "The model predicts no heart disease.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Low,
    Moderate,
    VeryHigh,
}

impl Severity {
    pub fn from_probability(probability: f64) -> Self {
        if probability > HIGH_THRESHOLD {
            Severity::VeryHigh
        } else if probability > MODERATE_THRESHOLD {
            Severity::Moderate
        } else {
            Severity::Low
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Severity::VeryHigh => "Very high risk — strongly recommend seeing a cardiologist.",
            Severity::Moderate => {
                "Moderate to high risk — consider lifestyle changes and medical checkup."
            }
            Severity::Low => "Low risk — maintain healthy habits!",
        }
    }
}

/// Outcome of one prediction request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    pub label: i32,
    pub probability: f64,
    pub category: RiskCategory,
    pub severity: Severity,
}

impl Assessment {
    pub fn new(label: i32, probability: f64) -> Self {
        Assessment {
            label,
            probability,
            category: RiskCategory::from_label(label),
            severity: Severity::from_probability(probability),
        }
    }

    /// Probability as a percentage with one decimal, e.g. `54.0%`.
    pub fn percent(&self) -> String {
        format!("{:.1}%", self.probability * 100.0)
    }
}

/// Run the classifier on a single patient.
pub fn assess(model: &dyn Classifier, features: &Features) -> Result<Assessment> {
    if model.n_features() != FEATURE_COUNT {
        return Err(HeartRiskError::Prediction {
            reason: format!(
                "model expects {} features, got {FEATURE_COUNT}",
                model.n_features()
            ),
        });
    }
    let x = DenseMatrix::new(1, FEATURE_COUNT, features.to_row().to_vec(), false);
    let label = first(model.predict(&x)?)?;
    let probability = first(model.predict_proba(&x)?)?;
    if !(0.0..=1.0).contains(&probability) {
        return Err(HeartRiskError::Prediction {
            reason: format!("probability {probability} is outside 0..=1"),
        });
    }
    Ok(Assessment::new(label, probability))
}

fn first<T>(values: Vec<T>) -> Result<T> {
    values
        .into_iter()
        .next()
        .ok_or_else(|| HeartRiskError::Prediction {
            reason: "classifier returned no rows".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::RawFeatures;

    /// Returns canned answers and remembers the row it was given.
    struct Canned {
        label: i32,
        probability: f64,
        seen: std::sync::Mutex<Vec<f64>>,
    }

    impl Canned {
        fn new(label: i32, probability: f64) -> Self {
            Canned {
                label,
                probability,
                seen: Default::default(),
            }
        }
    }

    impl Classifier for Canned {
        fn n_features(&self) -> usize {
            FEATURE_COUNT
        }

        fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<i32>> {
            use smartcore::linalg::basic::arrays::Array;
            let mut seen = self.seen.lock().unwrap();
            *seen = (0..FEATURE_COUNT).map(|c| *x.get((0, c))).collect();
            Ok(vec![self.label])
        }

        fn predict_proba(&self, _x: &DenseMatrix<f64>) -> Result<Vec<f64>> {
            Ok(vec![self.probability])
        }
    }

    #[test]
    fn severity_thresholds_are_exclusive_below() {
        assert_eq!(Severity::from_probability(0.0), Severity::Low);
        assert_eq!(Severity::from_probability(0.5), Severity::Low);
        assert_eq!(Severity::from_probability(0.500001), Severity::Moderate);
        assert_eq!(Severity::from_probability(0.75), Severity::Moderate);
        assert_eq!(Severity::from_probability(0.750001), Severity::VeryHigh);
        assert_eq!(Severity::from_probability(1.0), Severity::VeryHigh);
    }

    #[test]
    fn category_follows_the_label_only() {
        // label and probability can disagree; the headline follows the label
        let high = Assessment::new(1, 0.3);
        assert_eq!(high.category, RiskCategory::High);
        assert_eq!(high.severity, Severity::Low);

        let low = Assessment::new(0, 0.9);
        assert_eq!(low.category, RiskCategory::Low);
        assert_eq!(low.severity, Severity::VeryHigh);
    }

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(Assessment::new(0, 0.54).percent(), "54.0%");
        assert_eq!(Assessment::new(1, 0.8766).percent(), "87.7%");
        assert_eq!(Assessment::new(0, 0.0).percent(), "0.0%");
    }

    #[test]
    fn assess_passes_the_fixed_order_row() {
        let model = Canned::new(1, 0.8);
        let features = Features::try_from(RawFeatures {
            age: 63,
            chol: 233,
            ..Default::default()
        })
        .unwrap();
        let assessment = assess(&model, &features).unwrap();
        assert_eq!(assessment.category, RiskCategory::High);
        assert_eq!(assessment.severity, Severity::VeryHigh);
        assert_eq!(*model.seen.lock().unwrap(), features.to_row().to_vec());
    }

    #[test]
    fn rejects_impossible_probabilities() {
        let model = Canned::new(0, 1.5);
        let features = Features::try_from(RawFeatures::default()).unwrap();
        assert!(matches!(
            assess(&model, &features),
            Err(HeartRiskError::Prediction { .. })
        ));
    }
}
