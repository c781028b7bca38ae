//! Salary prediction pipeline: input validation, feature encoding, model or
//! heuristic inference, confidence scoring and the in-memory prediction log.

pub mod artifacts;
pub mod domain;
pub mod encoder;
pub mod engine;
pub mod estimator;
pub mod history;
pub mod loader;
pub mod router;
pub mod views;

pub use artifacts::{
    FeatureScaler, ModelArtifact, ModelError, Regressor, ScalerArtifact, ScalerError,
};
pub use domain::{Category, Education, Gender, JobTitle, Location, SalaryInput, ValidationError};
pub use encoder::{encode, FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
pub use engine::{PredictionEngine, PredictionError, PredictionOutcome, PredictionSource};
pub use history::{HistoryStore, PredictionRecord, SalaryRange, StatisticsSummary};
pub use loader::{
    ArtifactCheck, ArtifactLoadError, ArtifactPaths, LoadedArtifacts, ModelLoader, ModelMetadata,
};
pub use router::prediction_router;
pub use views::{Diagnostics, ModelInfo, ModelStatus, ReloadSummary};
