//! Heart disease risk form: thirteen clinical inputs, a pre-trained tree
//! ensemble, and thresholded messaging over its probability.

pub mod assessment;
pub mod batch;
pub mod error;
pub mod features;
pub mod model;
pub mod records;
pub mod render;
pub mod server;

pub use assessment::{assess, Assessment, RiskCategory, Severity};
pub use error::{HeartRiskError, Result};
pub use features::{Features, RawFeatures, FEATURE_COUNT, FEATURE_NAMES};
pub use model::{load_cached, Classifier, TreeEnsemble, POSITIVE_CLASS};
