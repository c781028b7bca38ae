use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::artifacts::{FeatureScaler, ModelError, Regressor, ScalerError};
use super::domain::SalaryInput;
use super::encoder::{encode, FEATURE_COLUMNS, FEATURE_COUNT};
use super::estimator::{self, round_to};
use super::history::{HistoryStore, PredictionRecord, StatisticsSummary};
use super::loader::{LoadedArtifacts, ModelLoader};
use super::views::{Diagnostics, ModelInfo, ModelStatus, ReloadSummary};

pub const MODEL_CONFIDENCE: f64 = 0.85;
pub const MOCK_CONFIDENCE: f64 = 0.60;
pub const CONFIDENCE_SPREAD: f64 = 0.03;
pub const CONFIDENCE_FLOOR: f64 = 0.50;
pub const CONFIDENCE_CEILING: f64 = 0.98;

/// Which path produced a salary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    Model,
    Mock,
}

impl PredictionSource {
    pub const fn baseline_confidence(self) -> f64 {
        match self {
            Self::Model => MODEL_CONFIDENCE,
            Self::Mock => MOCK_CONFIDENCE,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionOutcome {
    pub predicted_salary: f64,
    pub confidence_score: f64,
    pub source: PredictionSource,
    pub record_id: u64,
}

/// A prediction that could not be produced. Neither case is retried or
/// downgraded to the mock path: both point at broken artifacts.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(
        "feature scaling error: {source}; rebuild the model artifacts for the current feature layout"
    )]
    FeatureScaling {
        #[source]
        source: ScalerError,
    },
    #[error("model prediction error: {source}")]
    ModelPrediction {
        #[source]
        source: ModelError,
    },
}

/// Owns the installed artifacts, the prediction log and the random source
/// used for jitter.
pub struct PredictionEngine {
    loader: ModelLoader,
    artifacts: RwLock<Arc<LoadedArtifacts>>,
    history: HistoryStore,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl PredictionEngine {
    /// Run the loader once and install whatever it finds.
    pub fn load(loader: ModelLoader) -> Self {
        let artifacts = loader.load();
        Self::new(loader, artifacts)
    }

    pub fn new(loader: ModelLoader, artifacts: LoadedArtifacts) -> Self {
        Self {
            loader,
            artifacts: RwLock::new(Arc::new(artifacts)),
            history: HistoryStore::new(),
            rng: Mutex::new(Box::new(StdRng::from_entropy())),
        }
    }

    /// Replace the random source, e.g. with a seeded generator.
    pub fn with_rng(self, rng: impl RngCore + Send + 'static) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
            ..self
        }
    }

    pub fn loader(&self) -> &ModelLoader {
        &self.loader
    }

    /// Snapshot of the installed pair. A reload never mutates a snapshot.
    pub fn artifacts(&self) -> Arc<LoadedArtifacts> {
        let guard = self
            .artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in a complete set of artifacts.
    pub fn install(&self, artifacts: LoadedArtifacts) {
        let mut guard = self
            .artifacts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(artifacts);
    }

    fn rng(&self) -> MutexGuard<'_, Box<dyn RngCore + Send>> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Predict a salary for an already validated input and log it to history.
    pub fn predict(&self, input: &SalaryInput) -> Result<PredictionOutcome, PredictionError> {
        info!(
            name = %input.name,
            education = %input.education,
            years_of_experience = input.years_of_experience,
            location = %input.location,
            job_title = %input.job_title,
            age = input.age,
            gender = %input.gender,
            "prediction request received"
        );

        let artifacts = self.artifacts();
        let (predicted_salary, source) = match &artifacts.model {
            Some(model) => {
                info!("using trained model");
                let salary = predict_with_model(&**model, artifacts.scaler.as_deref(), input)?;
                (salary, PredictionSource::Model)
            }
            None => {
                warn!("model not loaded; using mock prediction");
                let salary = estimator::estimate(input, &mut **self.rng());
                (salary, PredictionSource::Mock)
            }
        };

        let record = self
            .history
            .append(input.clone(), predicted_salary, timestamp());
        let confidence_score = self.confidence(source);

        info!(
            id = record.id,
            predicted_salary,
            confidence_score,
            source = source.label(),
            "prediction completed"
        );

        Ok(PredictionOutcome {
            predicted_salary,
            confidence_score,
            source,
            record_id: record.id,
        })
    }

    /// Baseline for the path taken, perturbed by N(0, 0.03), clamped and
    /// rounded to three decimals.
    fn confidence(&self, source: PredictionSource) -> f64 {
        let noise = Normal::new(0.0, CONFIDENCE_SPREAD)
            .map(|normal| normal.sample(&mut **self.rng()))
            .unwrap_or(0.0);
        let score = (source.baseline_confidence() + noise)
            .clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING);
        round_to(score, 3)
    }

    pub fn status(&self) -> ModelStatus {
        let artifacts = self.artifacts();
        let scaler_feature_count = artifacts.scaler_feature_count();
        ModelStatus {
            model_loaded: artifacts.model.is_some(),
            scaler_loaded: artifacts.scaler.is_some(),
            scaler_feature_count,
            feature_mismatch: scaler_feature_count.map(|count| count != FEATURE_COUNT),
        }
    }

    pub fn model_info(&self) -> ModelInfo {
        let artifacts = self.artifacts();
        let status = self.status();
        let served = self.history.len();
        ModelInfo {
            model_type: artifacts
                .model
                .as_ref()
                .map_or_else(|| "MockModel".to_string(), |model| model.model_type().to_string()),
            features: FEATURE_COLUMNS.to_vec(),
            status: if status.model_loaded {
                "loaded"
            } else {
                "using_mock"
            },
            predictions_served: (served > 0).then_some(served),
            scaler_features: status.scaler_feature_count,
            feature_mismatch: status.feature_mismatch,
            metadata: artifacts.metadata.clone(),
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let artifacts = self.artifacts();
        let status = self.status();
        Diagnostics {
            model_loaded: status.model_loaded,
            scaler_loaded: status.scaler_loaded,
            model_type: artifacts
                .model
                .as_ref()
                .map(|model| model.model_type().to_string()),
            scaler_type: artifacts
                .scaler
                .as_ref()
                .map(|scaler| scaler.scaler_type().to_string()),
            expected_features: FEATURE_COLUMNS.to_vec(),
            files_check: self.loader.paths().files_check(),
            metadata: artifacts.metadata.clone(),
            scaler_features_expected: status.scaler_feature_count,
            feature_mismatch: status.feature_mismatch,
        }
    }

    /// Reload from disk; the new pair is built completely before the swap.
    pub fn reload(&self) -> ReloadSummary {
        info!("reloading model artifacts");
        self.install(self.loader.load());
        self.status().into()
    }

    pub fn history(&self, limit: i64) -> Vec<PredictionRecord> {
        self.history.recent(limit)
    }

    pub fn clear_history(&self) {
        self.history.clear();
        info!("prediction history cleared");
    }

    pub fn statistics(&self) -> StatisticsSummary {
        self.history.statistics()
    }
}

fn predict_with_model(
    model: &dyn Regressor,
    scaler: Option<&dyn FeatureScaler>,
    input: &SalaryInput,
) -> Result<f64, PredictionError> {
    let features = encode(input);
    debug!(features = ?features.as_slice(), "encoded features");

    let scaled;
    let row = match scaler {
        Some(scaler) => {
            scaled = scaler.transform(features.as_slice()).map_err(|source| {
                error!(error = %source, "feature scaling failed");
                PredictionError::FeatureScaling { source }
            })?;
            debug!(features = ?scaled, "scaled features");
            scaled.as_slice()
        }
        None => {
            warn!("no scaler available; predicting on raw features");
            features.as_slice()
        }
    };

    model.predict(row).map_err(|source| {
        error!(error = %source, "model prediction failed");
        PredictionError::ModelPrediction { source }
    })
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::artifacts::{
        LinearRegression, ModelArtifact, ScalerArtifact, StandardScaler,
    };
    use crate::prediction::domain::JobTitle;
    use crate::prediction::loader::ArtifactPaths;
    use rand_chacha::ChaCha8Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoModel {
        calls: AtomicUsize,
    }

    impl Regressor for EchoModel {
        fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(features.iter().sum())
        }

        fn model_type(&self) -> &str {
            "EchoModel"
        }
    }

    struct BrokenModel;

    impl Regressor for BrokenModel {
        fn predict(&self, _features: &[f64]) -> Result<f64, ModelError> {
            Err(ModelError::NonFinite(f64::NAN))
        }

        fn model_type(&self) -> &str {
            "BrokenModel"
        }
    }

    fn engine(artifacts: LoadedArtifacts) -> PredictionEngine {
        let loader = ModelLoader::new(ArtifactPaths::under("/nonexistent/salary-predictor"));
        PredictionEngine::new(loader, artifacts).with_rng(ChaCha8Rng::seed_from_u64(42))
    }

    fn linear_model() -> Arc<dyn Regressor> {
        Arc::new(ModelArtifact::LinearRegression(LinearRegression {
            coefficients: vec![1000.0; FEATURE_COUNT],
            intercept: 40000.0,
        }))
    }

    fn identity_scaler(width: usize) -> Arc<dyn FeatureScaler> {
        Arc::new(ScalerArtifact::StandardScaler(StandardScaler {
            mean: vec![0.0; width],
            scale: vec![1.0; width],
            n_features_in: None,
        }))
    }

    #[test]
    fn mock_path_scores_around_sixty_percent() {
        let engine = engine(LoadedArtifacts::default());
        for _ in 0..200 {
            let outcome = engine.predict(&SalaryInput::sample()).expect("mock succeeds");
            assert_eq!(outcome.source, PredictionSource::Mock);
            assert!((CONFIDENCE_FLOOR..=CONFIDENCE_CEILING).contains(&outcome.confidence_score));
            assert!((outcome.confidence_score - MOCK_CONFIDENCE).abs() < 0.2);
        }
        assert_eq!(engine.statistics().total_predictions, 200);
    }

    #[test]
    fn model_path_uses_scaled_features() {
        let model = Arc::new(EchoModel {
            calls: AtomicUsize::new(0),
        });
        let artifacts = LoadedArtifacts::new(
            Some(model.clone()),
            Some(identity_scaler(FEATURE_COUNT)),
            None,
        );
        let engine = engine(artifacts);

        let outcome = engine.predict(&SalaryInput::sample()).expect("model succeeds");
        // sample encodes to [1, 5, 2, 3, 30, 1]
        assert_eq!(outcome.predicted_salary, 42.0);
        assert_eq!(outcome.source, PredictionSource::Model);
        assert!((outcome.confidence_score - MODEL_CONFIDENCE).abs() < 0.2);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.record_id, 1);
    }

    #[test]
    fn model_without_scaler_predicts_on_raw_features() {
        let engine = engine(LoadedArtifacts::new(Some(linear_model()), None, None));
        let outcome = engine.predict(&SalaryInput::sample()).expect("raw path succeeds");
        assert_eq!(outcome.predicted_salary, 40000.0 + 42.0 * 1000.0);
    }

    #[test]
    fn narrow_scaler_fails_every_prediction() {
        let engine = engine(LoadedArtifacts::new(
            Some(linear_model()),
            Some(identity_scaler(3)),
            None,
        ));

        for _ in 0..3 {
            match engine.predict(&SalaryInput::sample()) {
                Err(PredictionError::FeatureScaling {
                    source: ScalerError::DimensionMismatch { expected, found },
                }) => {
                    assert_eq!(expected, 3);
                    assert_eq!(found, FEATURE_COUNT);
                }
                other => panic!("expected scaling error, got {other:?}"),
            }
        }
        assert!(engine.history(10).is_empty(), "failures are not recorded");
    }

    #[test]
    fn model_failures_surface_and_skip_history() {
        let engine = engine(LoadedArtifacts::new(Some(Arc::new(BrokenModel)), None, None));
        assert!(matches!(
            engine.predict(&SalaryInput::sample()),
            Err(PredictionError::ModelPrediction { .. })
        ));
        assert_eq!(engine.statistics().total_predictions, 0);
    }

    #[test]
    fn status_reports_scaler_width_mismatch() {
        let engine = engine(LoadedArtifacts::new(
            Some(linear_model()),
            Some(identity_scaler(3)),
            None,
        ));
        let status = engine.status();
        assert!(status.model_loaded);
        assert!(status.scaler_loaded);
        assert_eq!(status.scaler_feature_count, Some(3));
        assert_eq!(status.feature_mismatch, Some(true));
    }

    #[test]
    fn model_info_falls_back_to_mock_description() {
        let engine = engine(LoadedArtifacts::default());
        let info = engine.model_info();
        assert_eq!(info.model_type, "MockModel");
        assert_eq!(info.status, "using_mock");
        assert_eq!(info.features.len(), FEATURE_COUNT);
        assert!(info.predictions_served.is_none());
    }

    #[test]
    fn history_records_inputs_in_order() {
        let engine = engine(LoadedArtifacts::default());
        for job_title in [JobTitle::Manager, JobTitle::Manager, JobTitle::Analyst] {
            let input = SalaryInput {
                job_title,
                ..SalaryInput::sample()
            };
            engine.predict(&input).expect("mock succeeds");
        }

        let history = engine.history(10);
        let ids: Vec<u64> = history.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(history[2].input.job_title, JobTitle::Analyst);
        assert_eq!(engine.statistics().most_common_job, "Manager");

        engine.clear_history();
        let outcome = engine.predict(&SalaryInput::sample()).expect("mock succeeds");
        assert_eq!(outcome.record_id, 1);
    }

    #[test]
    fn reload_swaps_to_loader_result() {
        let engine = engine(LoadedArtifacts::new(Some(linear_model()), None, None));
        assert!(engine.status().model_loaded);

        let summary = engine.reload();
        assert!(!summary.model_loaded);
        assert!(!summary.scaler_loaded);
        assert_eq!(summary.scaler_features, None);
        assert_eq!(engine.model_info().model_type, "MockModel");
    }

    #[test]
    fn snapshots_outlive_reload() {
        let engine = engine(LoadedArtifacts::new(
            Some(linear_model()),
            Some(identity_scaler(FEATURE_COUNT)),
            None,
        ));
        let before = engine.artifacts();
        engine.install(LoadedArtifacts::default());

        assert!(before.model.is_some());
        assert!(before.scaler.is_some());
        assert!(engine.artifacts().model.is_none());
    }
}
