use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::SalaryInput;
use super::encoder::FEATURE_COLUMNS;
use super::loader::ModelMetadata;

/// Load state of the artifacts currently installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub scaler_loaded: bool,
    pub scaler_feature_count: Option<usize>,
    pub feature_mismatch: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub features: Vec<&'static str>,
    pub status: &'static str,
    /// Predictions logged so far; the wire name predates the history store.
    #[serde(
        rename = "training_data_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub predictions_served: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaler_features: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_mismatch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ModelMetadata>,
}

/// Everything an operator needs to work out why the model is not in use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub model_loaded: bool,
    pub scaler_loaded: bool,
    pub model_type: Option<String>,
    pub scaler_type: Option<String>,
    pub expected_features: Vec<&'static str>,
    pub files_check: BTreeMap<String, bool>,
    pub metadata: Option<ModelMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaler_features_expected: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_mismatch: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    pub message: &'static str,
    pub model_loaded: bool,
    pub scaler_loaded: bool,
    pub scaler_features: Option<usize>,
    pub feature_mismatch: Option<bool>,
}

impl From<ModelStatus> for ReloadSummary {
    fn from(status: ModelStatus) -> Self {
        Self {
            message: "Model reload completed",
            model_loaded: status.model_loaded,
            scaler_loaded: status.scaler_loaded,
            scaler_features: status.scaler_feature_count,
            feature_mismatch: status.feature_mismatch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthView {
    pub status: &'static str,
    pub model_loaded: bool,
    pub model_features: Option<Vec<&'static str>>,
    pub scaler_features: Option<usize>,
}

impl From<&ModelStatus> for HealthView {
    fn from(status: &ModelStatus) -> Self {
        Self {
            status: "healthy",
            model_loaded: status.model_loaded,
            model_features: status.model_loaded.then(|| FEATURE_COLUMNS.to_vec()),
            scaler_features: status.scaler_feature_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WelcomeView {
    pub message: &'static str,
    pub status: &'static str,
    pub model_loaded: bool,
    pub available_endpoints: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    pub predicted_salary: f64,
    pub input_data: SalaryInput,
    pub confidence_score: f64,
}
