use std::fs;
use std::path::Path;

use salary_predictor::prediction::loader::{read_artifact, read_scaler};
use salary_predictor::prediction::{
    ArtifactLoadError, ArtifactPaths, ModelArtifact, ModelLoader, Regressor, FEATURE_COUNT,
};
use serde_json::{json, Value};
use tempfile::tempdir;

fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("artifact directory created");
    }
    fs::write(path, serde_json::to_vec_pretty(value).expect("json encodes"))
        .expect("artifact written");
}

fn linear_model(intercept: f64) -> Value {
    json!({
        "kind": "linear_regression",
        "coefficients": [5000.0, 1500.0, 4000.0, 800.0, 250.0, 1200.0],
        "intercept": intercept
    })
}

fn standard_scaler(width: usize) -> Value {
    json!({
        "kind": "standard_scaler",
        "mean": vec![0.0; width],
        "scale": vec![1.0; width]
    })
}

#[test]
fn empty_directory_loads_nothing() {
    let dir = tempdir().expect("tempdir");
    let loaded = ModelLoader::new(ArtifactPaths::under(dir.path())).load();

    assert!(loaded.model.is_none());
    assert!(loaded.scaler.is_none());
    assert!(loaded.metadata.is_none());
}

#[test]
fn primary_artifacts_and_metadata_are_installed() {
    let dir = tempdir().expect("tempdir");
    let paths = ArtifactPaths::under(dir.path());
    write_json(&paths.model, &linear_model(30000.0));
    write_json(&paths.scaler, &standard_scaler(FEATURE_COUNT));
    write_json(
        &paths.metadata,
        &json!({ "trained_on": "2025-06-01", "r2_score": 0.87 }),
    );

    let loaded = ModelLoader::new(paths).load();

    let model = loaded.model.as_ref().expect("model loaded");
    assert_eq!(model.model_type(), "LinearRegression");
    assert_eq!(loaded.scaler_feature_count(), Some(FEATURE_COUNT));
    let metadata = loaded.metadata.expect("metadata loaded");
    assert_eq!(metadata["trained_on"], "2025-06-01");
}

#[test]
fn missing_primary_falls_back() {
    let dir = tempdir().expect("tempdir");
    let paths = ArtifactPaths::under(dir.path());
    write_json(&paths.model_fallback, &linear_model(10.0));
    write_json(&paths.scaler_fallback, &standard_scaler(FEATURE_COUNT));

    let loaded = ModelLoader::new(paths).load();

    let model = loaded.model.expect("fallback model loaded");
    assert_eq!(model.predict(&[0.0; FEATURE_COUNT]), Ok(10.0));
    assert!(loaded.scaler.is_some());
}

#[test]
fn corrupt_primary_falls_back() {
    let dir = tempdir().expect("tempdir");
    let paths = ArtifactPaths::under(dir.path());
    fs::create_dir_all(paths.model.parent().expect("model dir")).expect("dir created");
    fs::write(&paths.model, b"\x80\x04pickle bytes").expect("corrupt model written");
    write_json(&paths.model_fallback, &linear_model(20.0));

    let loaded = ModelLoader::new(paths).load();
    let model = loaded.model.expect("fallback model loaded");
    assert_eq!(model.predict(&[0.0; FEATURE_COUNT]), Ok(20.0));
}

#[test]
fn scaler_failure_does_not_block_model() {
    let dir = tempdir().expect("tempdir");
    let paths = ArtifactPaths::under(dir.path());
    write_json(&paths.model, &linear_model(30000.0));
    write_json(&paths.scaler, &json!({ "kind": "robust_scaler" }));

    let loaded = ModelLoader::new(paths).load();
    assert!(loaded.model.is_some());
    assert!(loaded.scaler.is_none());
}

#[test]
fn model_failure_does_not_block_scaler() {
    let dir = tempdir().expect("tempdir");
    let paths = ArtifactPaths::under(dir.path());
    write_json(&paths.model, &json!({ "kind": "linear_regression" }));
    write_json(&paths.scaler, &standard_scaler(FEATURE_COUNT));

    let loaded = ModelLoader::new(paths).load();
    assert!(loaded.model.is_none());
    assert!(loaded.scaler.is_some());
}

#[test]
fn mismatched_scaler_is_still_installed() {
    let dir = tempdir().expect("tempdir");
    let paths = ArtifactPaths::under(dir.path());
    write_json(&paths.model, &linear_model(30000.0));
    write_json(&paths.scaler, &standard_scaler(1));

    let loaded = ModelLoader::new(paths).load();
    assert_eq!(loaded.scaler_feature_count(), Some(1));
}

#[test]
fn scaler_declaring_a_width_it_lacks_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let paths = ArtifactPaths::under(dir.path());
    write_json(&paths.model, &linear_model(30000.0));
    write_json(
        &paths.scaler,
        &json!({
            "kind": "standard_scaler",
            "mean": [0.0, 0.0, 0.0],
            "scale": [1.0, 1.0, 1.0],
            "n_features_in": FEATURE_COUNT
        }),
    );

    let loaded = ModelLoader::new(paths.clone()).load();
    assert!(loaded.scaler.is_none());
    assert!(matches!(
        read_scaler(&paths.scaler),
        Err(ArtifactLoadError::InvalidScaler { .. })
    ));

    write_json(&paths.scaler_fallback, &standard_scaler(FEATURE_COUNT));
    let loaded = ModelLoader::new(paths).load();
    assert_eq!(loaded.scaler_feature_count(), Some(FEATURE_COUNT));
}

#[test]
fn malformed_metadata_is_ignored() {
    let dir = tempdir().expect("tempdir");
    let paths = ArtifactPaths::under(dir.path());
    write_json(&paths.metadata, &json!(["not", "a", "map"]));

    let loaded = ModelLoader::new(paths).load();
    assert!(loaded.metadata.is_none());
}

#[test]
fn read_artifact_distinguishes_missing_from_undecodable() {
    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("absent.json");
    assert!(matches!(
        read_artifact::<ModelArtifact>(&missing),
        Err(ArtifactLoadError::Missing { .. })
    ));

    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, b"{ not json").expect("garbage written");
    assert!(matches!(
        read_artifact::<ModelArtifact>(&garbage),
        Err(ArtifactLoadError::Decode { .. })
    ));
}

#[test]
fn files_check_reports_each_location() {
    let dir = tempdir().expect("tempdir");
    let paths = ArtifactPaths::under(dir.path());
    write_json(&paths.scaler_fallback, &standard_scaler(FEATURE_COUNT));

    let check = paths.files_check();
    assert_eq!(check.len(), 5);
    assert_eq!(
        check.get(&paths.scaler_fallback.display().to_string()),
        Some(&true)
    );
    assert_eq!(check.get(&paths.model.display().to_string()), Some(&false));
}
