//! Patient datasets on disk.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use polars::prelude::{CsvReader, DataFrame, DataType, Field, Schema, SerReader};
use serde::Serialize;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::assessment::{Assessment, RiskCategory, Severity};
use crate::error::{HeartRiskError, Result};
use crate::features::{RawFeatures, FEATURE_COUNT, FEATURE_NAMES};

/// Label column of the labelled dataset.
pub static TARGET_COLUMN: &str = "target";

pub struct HeartRecord {}

impl HeartRecord {
    /// Column types of a patient file; `labelled` adds the target column.
    pub fn schema(labelled: bool) -> Schema {
        let features = FEATURE_NAMES
            .iter()
            .map(|name| Field::new(name, DataType::Float64));
        let target = labelled.then(|| Field::new(TARGET_COLUMN, DataType::Int32));
        Schema::from_iter(features.chain(target))
    }
}

pub fn read_csv<P: AsRef<Path>>(path: P, schema: Schema) -> Result<DataFrame> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| HeartRiskError::io(path, e))?;

    Ok(CsvReader::new(file)
        .has_header(true)
        .with_dtypes(Some(Arc::new(schema)))
        .finish()?)
}

fn require_column(df: &DataFrame, name: &str) -> Result<()> {
    if df.get_column_names().contains(&name) {
        Ok(())
    } else {
        Err(HeartRiskError::Dataset {
            reason: format!("column {name:?} is missing"),
        })
    }
}

/// Feature matrix in classifier column order, whatever the order of the file.
pub fn convert_features_to_matrix(df: &DataFrame) -> Result<DenseMatrix<f64>> {
    let nrows = df.height();
    let mut xs: Vec<f64> = Vec::with_capacity(nrows * FEATURE_COUNT);

    // columns are appended one after the other, hence column-major
    for name in FEATURE_NAMES {
        require_column(df, name)?;
        let series = df.column(name)?.cast(&DataType::Float64)?;
        if series.null_count() > 0 {
            return Err(HeartRiskError::Dataset {
                reason: format!("column {name:?} has {} empty cells", series.null_count()),
            });
        }
        xs.extend(series.f64()?.into_no_null_iter());
    }

    Ok(DenseMatrix::new(nrows, FEATURE_COUNT, xs, true))
}

pub fn target_vector(df: &DataFrame) -> Result<Vec<i32>> {
    require_column(df, TARGET_COLUMN)?;
    let series = df.column(TARGET_COLUMN)?.cast(&DataType::Int32)?;
    if series.null_count() > 0 {
        return Err(HeartRiskError::Dataset {
            reason: format!("column {TARGET_COLUMN:?} has empty cells"),
        });
    }
    let target: Vec<i32> = series.i32()?.into_no_null_iter().collect();
    Ok(target)
}

pub fn feature_and_target(df: &DataFrame) -> Result<(DenseMatrix<f64>, Vec<i32>)> {
    Ok((convert_features_to_matrix(df)?, target_vector(df)?))
}

/// Raw inputs of every row of a feature matrix; a bad cell fails only its own row.
pub fn rows_as_features(x: &DenseMatrix<f64>) -> Vec<Result<RawFeatures>> {
    use smartcore::linalg::basic::arrays::Array;

    let (nrows, _) = x.shape();
    (0..nrows)
        .map(|r| {
            RawFeatures::from_named(
                FEATURE_NAMES
                    .iter()
                    .enumerate()
                    .map(|(c, name)| (*name, *x.get((r, c)))),
            )
        })
        .collect()
}

/// One output line of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub row: usize,
    pub age: i64,
    pub sex: i64,
    pub cp: i64,
    pub trestbps: i64,
    pub chol: i64,
    pub fbs: i64,
    pub restecg: i64,
    pub thalach: i64,
    pub exang: i64,
    pub oldpeak: f64,
    pub slope: i64,
    pub ca: i64,
    pub thal: i64,
    pub label: i32,
    pub probability: f64,
    pub category: RiskCategory,
    pub severity: Severity,
}

impl PredictionRecord {
    pub fn new(row: usize, raw: &RawFeatures, assessment: &Assessment) -> Self {
        PredictionRecord {
            row,
            age: raw.age,
            sex: raw.sex,
            cp: raw.cp,
            trestbps: raw.trestbps,
            chol: raw.chol,
            fbs: raw.fbs,
            restecg: raw.restecg,
            thalach: raw.thalach,
            exang: raw.exang,
            oldpeak: raw.oldpeak,
            slope: raw.slope,
            ca: raw.ca,
            thal: raw.thal,
            label: assessment.label,
            probability: assessment.probability,
            category: assessment.category,
            severity: assessment.severity,
        }
    }
}
