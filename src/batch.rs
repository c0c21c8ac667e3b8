//! Offline runs of the classifier over whole datasets.

use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;
use smartcore::metrics::accuracy;
use sysinfo::{get_current_pid, ProcessExt, System, SystemExt};

use crate::assessment::{assess, RiskCategory};
use crate::error::{HeartRiskError, Result};
use crate::features::Features;
use crate::model::{Classifier, POSITIVE_CLASS};
use crate::records::{
    convert_features_to_matrix, feature_and_target, read_csv, rows_as_features, HeartRecord,
    PredictionRecord,
};

/// Resident memory of this process in bytes, when the platform reports it.
pub fn monitor_memory() -> Option<u64> {
    let pid = get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_process(pid);
    sys.process(pid).map(|process| process.memory())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub rows: usize,
    pub predicted: usize,
    pub skipped: usize,
    pub high_risk: usize,
}

/// Predict every row of `input` and write one CSV line per valid row to `output`.
///
/// Rows whose values the form would not accept (out of bounds, unknown codes,
/// fractional or empty codes) are skipped and logged.
pub fn predict_file<P: AsRef<Path>, Q: AsRef<Path>>(
    model: &dyn Classifier,
    input: P,
    output: Q,
) -> Result<BatchSummary> {
    let df = read_csv(input.as_ref(), HeartRecord::schema(false))?;
    let x = convert_features_to_matrix(&df)?;
    let rows = rows_as_features(&x);

    let output = output.as_ref();
    let file = File::create(output).map_err(|e| HeartRiskError::io(output, e))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut summary = BatchSummary {
        rows: rows.len(),
        ..Default::default()
    };
    for (i, raw) in rows.into_iter().enumerate() {
        let features = match raw.and_then(Features::try_from) {
            Ok(features) => features,
            Err(e) if e.is_input_error() => {
                warn!("row {i} skipped: {e}");
                summary.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        let assessment = assess(model, &features)?;
        if assessment.category == RiskCategory::High {
            summary.high_risk += 1;
        }
        summary.predicted += 1;
        writer.serialize(PredictionRecord::new(i, &features.raw(), &assessment))?;
    }
    writer.flush().map_err(|e| HeartRiskError::io(output, e))?;

    info!(
        "{} of {} rows predicted into {:?} ({} skipped)",
        summary.predicted, summary.rows, output, summary.skipped
    );
    Ok(summary)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub rows: usize,
    pub accuracy: f64,
    pub positive_rate: f64,
    pub elapsed: Duration,
    pub memory_bytes: Option<u64>,
}

/// Score the classifier against the `target` column of a labelled dataset.
pub fn evaluate_file<P: AsRef<Path>>(model: &dyn Classifier, input: P) -> Result<Evaluation> {
    let start_time = Instant::now();

    let df = read_csv(input.as_ref(), HeartRecord::schema(true))?;
    let (x, y) = feature_and_target(&df)?;
    if y.is_empty() {
        return Err(HeartRiskError::Dataset {
            reason: "no rows to evaluate".to_string(),
        });
    }

    let predictions = model.predict(&x)?;
    let positives = predictions.iter().filter(|p| **p == POSITIVE_CLASS).count();
    debug!("{} predictions, {} positive", predictions.len(), positives);

    Ok(Evaluation {
        rows: y.len(),
        accuracy: accuracy(&y, &predictions),
        positive_rate: positives as f64 / y.len() as f64,
        elapsed: start_time.elapsed(),
        memory_bytes: monitor_memory(),
    })
}
