use std::path::{Path, PathBuf};

use heart_risk::TreeEnsemble;

/// Two stumps: cholesterol above 250 and max heart rate at or below 140
/// both push towards the positive class.
///
/// | chol | thalach | probability |
/// |------|---------|-------------|
/// | 240  | 150     | 0.225       |
/// | 300  | 150     | 0.575       |
/// | 300  | 120     | 0.825       |
pub const MODEL_JSON: &str = r#"{
    "model_name": "fixture-forest",
    "n_features": 13,
    "classes": [0, 1],
    "trees": [
        {
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [4, -2, -2],
            "threshold": [250.0, -2.0, -2.0],
            "value": [[9, 11], [8, 2], [1, 9]]
        },
        {
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [7, -2, -2],
            "threshold": [140.0, -2.0, -2.0],
            "value": [[4, 4], [1, 3], [3, 1]]
        }
    ]
}"#;

#[allow(dead_code)]
pub fn model() -> TreeEnsemble {
    TreeEnsemble::from_json(MODEL_JSON).expect("fixture model")
}

#[allow(dead_code)]
pub fn write_model(dir: &Path) -> PathBuf {
    let path = dir.join("heart_disease.json");
    std::fs::write(&path, MODEL_JSON).expect("write model");
    path
}
