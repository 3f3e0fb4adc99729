mod common;

use common::{date, trained_model};
use river_forecast::{FittedModel, FixedClock, ForecastError, PredictionService};
use std::fs;
use tempfile::tempdir;

/// Serialized artifact with the value of the first `"key":` replaced
fn artifact_with_first(key: &str, value: usize) -> Vec<u8> {
    let mut buffer = Vec::new();
    trained_model().to_writer(&mut buffer).unwrap();
    let json = String::from_utf8(buffer).unwrap();

    let needle = format!("\"{}\":", key);
    let start = json.find(&needle).unwrap() + needle.len();
    let end = start + json[start..].find(|c: char| !c.is_ascii_digit()).unwrap();
    format!("{}{}{}", &json[..start], value, &json[end..]).into_bytes()
}

#[test]
fn test_save_load_reproduces_predictions() {
    let model = trained_model();
    let dir = tempdir().unwrap();
    let path = dir.path().join("modelo_nivel_rio.pkl");

    model.save(&path).unwrap();
    let restored: FittedModel = FittedModel::load(&path).unwrap();

    assert_eq!(restored.schema(), model.schema());
    assert_eq!(restored.span(), model.span());

    let service = PredictionService::with_clock(FixedClock(date(2025, 8, 15)));
    for (y, m, d) in [(2025, 8, 20), (2024, 2, 29), (2030, 1, 1)] {
        let before = service.predict_day(&model, y, m, d).unwrap();
        let after = service.predict_day(&restored, y, m, d).unwrap();
        assert_eq!(before.level.to_bits(), after.level.to_bits());
    }
}

#[test]
fn test_missing_artifact_is_load_error() {
    let dir = tempdir().unwrap();
    let result: river_forecast::Result<FittedModel> =
        FittedModel::load(dir.path().join("absent.pkl"));

    match result {
        Err(ForecastError::ModelLoad { path, .. }) => assert!(path.ends_with("absent.pkl")),
        other => panic!("expected ModelLoad, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_corrupt_artifact_is_load_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.pkl");
    fs::write(&path, b"\x80\x04\x95 pickled bytes").unwrap();

    let result: river_forecast::Result<FittedModel> = FittedModel::load(&path);
    assert!(matches!(result, Err(ForecastError::ModelLoad { .. })));
}

#[test]
fn test_dangling_child_index_is_load_error() {
    let artifact = artifact_with_first("left", 999_999);
    let result: river_forecast::Result<FittedModel> =
        FittedModel::from_reader(artifact.as_slice(), "artifact");

    match result {
        Err(ForecastError::ModelLoad { reason, .. }) => assert!(reason.contains("999999")),
        other => panic!("expected ModelLoad, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_cyclic_tree_is_load_error() {
    // The root of the first tree pointing back at itself
    let artifact = artifact_with_first("left", 0);
    let result: river_forecast::Result<FittedModel> =
        FittedModel::from_reader(artifact.as_slice(), "artifact");
    assert!(matches!(result, Err(ForecastError::ModelLoad { .. })));
}

#[test]
fn test_unknown_split_feature_is_load_error() {
    let artifact = artifact_with_first("feature", 8);
    let result: river_forecast::Result<FittedModel> =
        FittedModel::from_reader(artifact.as_slice(), "artifact");
    assert!(matches!(result, Err(ForecastError::ModelLoad { .. })));
}
