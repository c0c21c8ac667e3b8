//! Pre-trained classifier artifacts.
//!
//! An artifact is a JSON tree ensemble: every tree is stored as parallel
//! per-node arrays (`children_left`, `children_right`, `feature`, `threshold`,
//! `value`), the layout a fitted random forest exposes for each of its
//! estimators. Leaves have `-1` children. A sample goes left when
//! `x[feature] <= threshold`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use lazy_static::lazy_static;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{HeartRiskError, Result};
use crate::features::FEATURE_COUNT;

/// Label denoting predicted presence of heart disease.
pub const POSITIVE_CLASS: i32 = 1;

pub const DEFAULT_MODEL_PATH: &str = "heart_disease.json";

/// A binary classifier over feature matrices, one sample per row.
pub trait Classifier: Send + Sync {
    fn n_features(&self) -> usize;

    /// Predicted label per row.
    fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<i32>>;

    /// Probability of [`POSITIVE_CLASS`] per row.
    fn predict_proba(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Class weights per node, one entry per ensemble class.
    pub value: Vec<Vec<f64>>,
}

impl Tree {
    fn validate(&self, index: usize, n_features: usize, n_classes: usize) -> Result<()> {
        let invalid = |reason: String| HeartRiskError::InvalidModel {
            reason: format!("tree {index}: {reason}"),
        };

        let n_nodes = self.children_left.len();
        if n_nodes == 0 {
            return Err(invalid("has no nodes".to_string()));
        }
        if self.children_right.len() != n_nodes
            || self.feature.len() != n_nodes
            || self.threshold.len() != n_nodes
            || self.value.len() != n_nodes
        {
            return Err(invalid("node arrays differ in length".to_string()));
        }

        for node in 0..n_nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if self.value[node].len() != n_classes {
                return Err(invalid(format!(
                    "node {node} has {} class weights, expected {n_classes}",
                    self.value[node].len()
                )));
            }
            if left < 0 && right < 0 {
                let weights = &self.value[node];
                if weights.iter().any(|w| !(*w >= 0.0)) || weights.iter().sum::<f64>() <= 0.0 {
                    return Err(invalid(format!("leaf {node} has no usable class weights")));
                }
                continue;
            }
            // children must point forward, which also rules out cycles
            for child in [left, right] {
                if child <= node as i64 || child >= n_nodes as i64 {
                    return Err(invalid(format!("node {node} has bad child {child}")));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(invalid(format!("node {node} splits on feature {feature}")));
            }
            if self.threshold[node].is_nan() {
                return Err(invalid(format!("node {node} has a NaN threshold")));
            }
        }
        Ok(())
    }

    fn leaf(&self, row: &[f64]) -> usize {
        let mut node = 0;
        loop {
            let left = self.children_left[node];
            if left < 0 {
                return node;
            }
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }

    /// Class probabilities of the leaf `row` lands in.
    fn proba(&self, row: &[f64]) -> impl Iterator<Item = f64> + '_ {
        let weights = &self.value[self.leaf(row)];
        let total: f64 = weights.iter().sum();
        weights.iter().map(move |w| w / total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub model_name: String,
    pub n_features: usize,
    pub classes: Vec<i32>,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TreeEnsemble> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| HeartRiskError::io(path, e))?;
        let model = TreeEnsemble::from_json(&json)?;
        debug!(
            "loaded {:?} from {:?}: {} trees, classes {:?}",
            model.model_name,
            path,
            model.trees.len(),
            model.classes
        );
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<TreeEnsemble> {
        let model: TreeEnsemble = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| HeartRiskError::InvalidModel {
            reason: reason.to_string(),
        };
        if self.n_features != FEATURE_COUNT {
            return Err(HeartRiskError::InvalidModel {
                reason: format!(
                    "expects {} features, the form provides {FEATURE_COUNT}",
                    self.n_features
                ),
            });
        }
        if self.classes.len() < 2 {
            return Err(invalid("needs at least two classes"));
        }
        if !self.classes.contains(&POSITIVE_CLASS) {
            return Err(invalid("positive class 1 is missing"));
        }
        if self.trees.is_empty() {
            return Err(invalid("has no trees"));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.n_features, self.classes.len())?;
        }
        Ok(())
    }

    /// Mean of the per-tree class probabilities for one sample.
    pub fn class_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut sum = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.proba(row)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        sum.iter_mut().for_each(|p| *p /= n_trees);
        sum
    }

    fn positive_index(&self) -> usize {
        // validate() guarantees the positive class is present
        self.classes
            .iter()
            .position(|c| *c == POSITIVE_CLASS)
            .unwrap_or_default()
    }

    fn rows(&self, x: &DenseMatrix<f64>) -> Result<Vec<Vec<f64>>> {
        let (nrows, ncols) = x.shape();
        if ncols != self.n_features {
            return Err(HeartRiskError::Prediction {
                reason: format!("got {ncols} features, model expects {}", self.n_features),
            });
        }
        Ok((0..nrows)
            .map(|r| (0..ncols).map(|c| *x.get((r, c))).collect())
            .collect())
    }
}

impl Classifier for TreeEnsemble {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<i32>> {
        Ok(self
            .rows(x)?
            .iter()
            .map(|row| {
                let proba = self.class_proba(row);
                // first class wins ties
                let best = proba
                    .iter()
                    .enumerate()
                    .fold(0, |best, (i, p)| if *p > proba[best] { i } else { best });
                self.classes[best]
            })
            .collect())
    }

    fn predict_proba(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>> {
        let positive = self.positive_index();
        Ok(self
            .rows(x)?
            .iter()
            .map(|row| self.class_proba(row)[positive])
            .collect())
    }
}

lazy_static! {
    static ref MODEL_CACHE: Mutex<HashMap<PathBuf, Arc<TreeEnsemble>>> =
        Mutex::new(HashMap::new());
}

/// Load an artifact once per process; later calls with the same file share the handle.
pub fn load_cached<P: AsRef<Path>>(path: P) -> Result<Arc<TreeEnsemble>> {
    let path = path.as_ref();
    let key = fs::canonicalize(path).map_err(|e| HeartRiskError::io(path, e))?;

    let mut cache = MODEL_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(model) = cache.get(&key) {
        debug!("model cache hit for {:?}", key);
        return Ok(Arc::clone(model));
    }

    let model = Arc::new(TreeEnsemble::load(&key)?);
    info!(
        "model {:?} ready ({} trees) from {:?}",
        model.model_name,
        model.trees.len(),
        key
    );
    cache.insert(key, Arc::clone(&model));
    Ok(model)
}
