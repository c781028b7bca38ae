use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use super::artifacts::{FeatureScaler, ModelArtifact, Regressor, ScalerArtifact, ScalerError};
use super::encoder::FEATURE_COUNT;

/// Free-form key/value document published next to the model.
pub type ModelMetadata = Map<String, Value>;

/// Where the loader looks for each artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub model_fallback: PathBuf,
    pub scaler: PathBuf,
    pub scaler_fallback: PathBuf,
    pub metadata: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            model: PathBuf::from("model/model.json"),
            model_fallback: PathBuf::from("best_model.json"),
            scaler: PathBuf::from("model/scaler.json"),
            scaler_fallback: PathBuf::from("scaler.json"),
            metadata: PathBuf::from("model/metadata.json"),
        }
    }
}

impl ArtifactPaths {
    /// Every path rooted under `dir`, keeping the default file layout.
    pub fn under(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let defaults = Self::default();
        Self {
            model: dir.join(defaults.model),
            model_fallback: dir.join(defaults.model_fallback),
            scaler: dir.join(defaults.scaler),
            scaler_fallback: dir.join(defaults.scaler_fallback),
            metadata: dir.join(defaults.metadata),
        }
    }

    /// Existence of each configured file, keyed by path.
    pub fn files_check(&self) -> BTreeMap<String, bool> {
        [
            &self.model,
            &self.scaler,
            &self.metadata,
            &self.model_fallback,
            &self.scaler_fallback,
        ]
        .into_iter()
        .map(|path| (path.display().to_string(), path.exists()))
        .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactLoadError {
    #[error("{path} does not exist")]
    Missing { path: PathBuf },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("rejected scaler {path}: {source}")]
    InvalidScaler {
        path: PathBuf,
        #[source]
        source: ScalerError,
    },
}

/// Model, scaler and metadata as installed together.
#[derive(Clone, Default)]
pub struct LoadedArtifacts {
    pub model: Option<Arc<dyn Regressor>>,
    pub scaler: Option<Arc<dyn FeatureScaler>>,
    pub metadata: Option<ModelMetadata>,
}

impl LoadedArtifacts {
    pub fn new(
        model: Option<Arc<dyn Regressor>>,
        scaler: Option<Arc<dyn FeatureScaler>>,
        metadata: Option<ModelMetadata>,
    ) -> Self {
        Self {
            model,
            scaler,
            metadata,
        }
    }

    pub fn scaler_feature_count(&self) -> Option<usize> {
        self.scaler.as_ref().map(|scaler| scaler.feature_count())
    }
}

impl fmt::Debug for LoadedArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedArtifacts")
            .field("model", &self.model.as_ref().map(|model| model.model_type()))
            .field(
                "scaler",
                &self.scaler.as_ref().map(|scaler| scaler.scaler_type()),
            )
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Outcome of reading one configured artifact file on its own.
#[derive(Debug)]
pub struct ArtifactCheck {
    pub artifact: &'static str,
    pub path: PathBuf,
    pub outcome: Result<(), ArtifactLoadError>,
}

/// Resolves artifacts from their primary location, then the fallback.
#[derive(Debug, Clone)]
pub struct ModelLoader {
    paths: ArtifactPaths,
}

impl ModelLoader {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Never fails: anything that cannot be loaded is left absent.
    pub fn load(&self) -> LoadedArtifacts {
        info!(
            model = %self.paths.model.display(),
            scaler = %self.paths.scaler.display(),
            metadata = %self.paths.metadata.display(),
            "loading model artifacts"
        );

        let metadata = self.load_metadata();
        let model = load_with_fallback(
            "model",
            &self.paths.model,
            &self.paths.model_fallback,
            read_artifact::<ModelArtifact>,
        )
        .map(|model| {
            info!(model_type = model.model_type(), "model installed");
            Arc::new(model) as Arc<dyn Regressor>
        });
        let scaler = load_with_fallback(
            "scaler",
            &self.paths.scaler,
            &self.paths.scaler_fallback,
            read_scaler,
        )
        .map(|scaler| {
            check_scaler_width(&scaler);
            Arc::new(scaler) as Arc<dyn FeatureScaler>
        });

        match (&model, &scaler) {
            (Some(_), Some(_)) => info!("model and scaler loaded"),
            (Some(_), None) => {
                warn!("model loaded without a scaler; predictions may be inaccurate")
            }
            (None, _) => warn!("no model available; serving mock predictions"),
        }

        LoadedArtifacts::new(model, scaler, metadata)
    }

    /// Read every configured file independently and report why each one is,
    /// or is not, usable. Nothing is installed.
    pub fn check(&self) -> Vec<ArtifactCheck> {
        let model = |path: &Path| read_artifact::<ModelArtifact>(path).map(drop);
        let scaler = |path: &Path| read_scaler(path).map(drop);
        let metadata = |path: &Path| read_artifact::<ModelMetadata>(path).map(drop);

        vec![
            ArtifactCheck::run("model", &self.paths.model, model),
            ArtifactCheck::run("model (fallback)", &self.paths.model_fallback, model),
            ArtifactCheck::run("scaler", &self.paths.scaler, scaler),
            ArtifactCheck::run("scaler (fallback)", &self.paths.scaler_fallback, scaler),
            ArtifactCheck::run("metadata", &self.paths.metadata, metadata),
        ]
    }

    fn load_metadata(&self) -> Option<ModelMetadata> {
        let path = &self.paths.metadata;
        if !path.exists() {
            info!(path = %path.display(), "no model metadata published");
            return None;
        }
        match read_artifact::<ModelMetadata>(path) {
            Ok(metadata) => {
                info!(keys = metadata.len(), "model metadata loaded");
                Some(metadata)
            }
            Err(err) => {
                warn!(error = %err, "could not load model metadata");
                None
            }
        }
    }
}

impl ArtifactCheck {
    fn run(
        artifact: &'static str,
        path: &Path,
        read: impl Fn(&Path) -> Result<(), ArtifactLoadError>,
    ) -> Self {
        Self {
            artifact,
            path: path.to_path_buf(),
            outcome: read(path),
        }
    }
}

fn check_scaler_width(scaler: &ScalerArtifact) {
    let count = scaler.feature_count();
    if count == FEATURE_COUNT {
        info!(features = count, "scaler feature count matches encoder");
    } else {
        error!(
            expected = FEATURE_COUNT,
            found = count,
            "scaler feature count mismatch; predictions will fail until the artifacts are rebuilt"
        );
    }
}

fn load_with_fallback<T>(
    label: &'static str,
    primary: &Path,
    fallback: &Path,
    read: impl Fn(&Path) -> Result<T, ArtifactLoadError>,
) -> Option<T> {
    for (attempt, path) in [("primary", primary), ("fallback", fallback)] {
        match read(path) {
            Ok(artifact) => {
                info!(artifact = label, attempt, path = %path.display(), "artifact loaded");
                return Some(artifact);
            }
            Err(err @ ArtifactLoadError::Missing { .. }) => {
                warn!(artifact = label, attempt, error = %err, "artifact not found")
            }
            Err(err) => error!(artifact = label, attempt, error = %err, "artifact failed to load"),
        }
    }
    error!(artifact = label, "no usable artifact found");
    None
}

/// Decode a scaler and check its parameters describe a single fitted transform.
pub fn read_scaler(path: &Path) -> Result<ScalerArtifact, ArtifactLoadError> {
    let scaler: ScalerArtifact = read_artifact(path)?;
    scaler.validate().map_err(|source| ArtifactLoadError::InvalidScaler {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(scaler)
}

pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactLoadError> {
    let raw = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ArtifactLoadError::Missing {
            path: path.to_path_buf(),
        },
        _ => ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    serde_json::from_slice(&raw).map_err(|source| ArtifactLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
