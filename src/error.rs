use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HeartRiskError>;

#[derive(Error, Debug)]
pub enum HeartRiskError {
    #[error("cannot open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid model: {reason}")]
    InvalidModel { reason: String },
    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} = {value} is not one of the allowed choices")]
    InvalidChoice { field: &'static str, value: i64 },
    #[error("{field} = {value} is not a whole number")]
    NotWholeNumber { field: &'static str, value: f64 },
    #[error("unknown feature {name:?}")]
    UnknownFeature { name: String },
    #[error("prediction failed: {reason}")]
    Prediction { reason: String },
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("server error: {0}")]
    Server(#[source] std::io::Error),
    #[error("invalid dataset: {reason}")]
    Dataset { reason: String },
}

impl HeartRiskError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HeartRiskError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by user input rather than by the model or the host.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            HeartRiskError::OutOfRange { .. }
                | HeartRiskError::InvalidChoice { .. }
                | HeartRiskError::NotWholeNumber { .. }
                | HeartRiskError::UnknownFeature { .. }
        )
    }
}
