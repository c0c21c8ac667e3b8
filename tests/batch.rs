mod common;

use std::fs;

use heart_risk::batch::{evaluate_file, predict_file};
use heart_risk::{load_cached, HeartRiskError};

const HEADER: &str = "age,sex,cp,trestbps,chol,fbs,restecg,thalach,exang,oldpeak,slope,ca,thal";

#[test]
fn batch_writes_one_line_per_valid_row() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let model = load_cached(common::write_model(dir.path())).unwrap();

    let input = dir.path().join("patients.csv");
    fs::write(
        &input,
        format!(
            "{HEADER}\n\
             63,1,3,145,300,1,0,120,0,2.3,0,0,1\n\
             41,0,1,130,204,0,0,172,0,1.4,2,0,2\n\
             57,1,0,140,192,0,1,148,0,0.4,1,0,0\n"
        ),
    )
    .unwrap();
    let output = dir.path().join("predictions.csv");

    let summary = predict_file(model.as_ref(), &input, &output).unwrap();
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.predicted, 2);
    // thal 0 is not a form choice
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.high_risk, 1);

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "row");
    assert_eq!(&headers[14], "label");
    assert_eq!(&headers[16], "category");

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "0");
    assert_eq!(&rows[0][14], "1");
    assert_eq!(&rows[0][16], "High");
    assert_eq!(&rows[0][17], "VeryHigh");
    assert_eq!(&rows[1][0], "1");
    assert_eq!(&rows[1][16], "Low");
    assert_eq!(&rows[1][17], "Low");
}

#[test]
fn batch_skips_empty_and_fractional_codes() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let model = load_cached(common::write_model(dir.path())).unwrap();

    let input = dir.path().join("patients.csv");
    fs::write(
        &input,
        format!(
            "{HEADER}\n\
             63,1,3,145,300,1,0,120,0,2.3,0,0,1\n\
             41,NaN,1,130,204,0,0,172,0,1.4,2,0,2\n\
             57,1,0.4,140,192,0,1,148,0,0.4,1,0,2\n"
        ),
    )
    .unwrap();
    let output = dir.path().join("predictions.csv");

    let summary = predict_file(model.as_ref(), &input, &output).unwrap();
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.predicted, 1);
    assert_eq!(summary.skipped, 2);

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "0");
}

#[test]
fn evaluation_scores_against_the_target_column() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let model = load_cached(common::write_model(dir.path())).unwrap();

    let input = dir.path().join("labelled.csv");
    // predictions: 1, 0, 1, 0
    fs::write(
        &input,
        format!(
            "{HEADER},target\n\
             63,1,3,145,300,1,0,120,0,2.3,0,0,1,1\n\
             41,0,1,130,204,0,0,172,0,1.4,2,0,2,0\n\
             67,1,0,160,286,0,0,108,1,1.5,1,3,2,0\n\
             37,1,2,130,250,0,1,187,0,3.5,0,0,2,0\n"
        ),
    )
    .unwrap();

    let evaluation = evaluate_file(model.as_ref(), &input).unwrap();
    assert_eq!(evaluation.rows, 4);
    assert!((evaluation.accuracy - 0.75).abs() < 1e-12);
    assert!((evaluation.positive_rate - 0.5).abs() < 1e-12);
}

#[test]
fn evaluation_needs_a_target_column() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let model = load_cached(common::write_model(dir.path())).unwrap();

    let input = dir.path().join("unlabelled.csv");
    fs::write(&input, format!("{HEADER}\n63,1,3,145,300,1,0,120,0,2.3,0,0,1\n")).unwrap();

    // refused either while reading with the labelled schema or when extracting the target
    let err = evaluate_file(model.as_ref(), &input).unwrap_err();
    assert!(
        matches!(err, HeartRiskError::Dataset { .. } | HeartRiskError::Polars(_)),
        "{err}"
    );
}
