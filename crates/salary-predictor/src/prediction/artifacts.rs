//! Capability interfaces for the trained artifacts plus the JSON-backed
//! implementations the loader decodes from disk.

use serde::{Deserialize, Serialize};

/// Fitted regression model: one feature row in, one salary out.
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError>;
    fn model_type(&self) -> &str;
}

/// Fitted feature transform applied before the model.
pub trait FeatureScaler: Send + Sync {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ScalerError>;
    /// Number of input columns the scaler was fitted on.
    fn feature_count(&self) -> usize;
    fn scaler_type(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("input has {found} features, but the model expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("malformed tree: {0}")]
    MalformedTree(String),
    #[error("model produced a non-finite value ({0})")]
    NonFinite(f64),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScalerError {
    #[error("input has {found} features, but the scaler expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("scaler parameters disagree: {centers} centers, {scales} scales")]
    ParameterLengths { centers: usize, scales: usize },
    #[error("scaler declares {declared} input features but carries {columns} columns")]
    DeclaredWidth { declared: usize, columns: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LinearRegression(LinearRegression),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl Regressor for ModelArtifact {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        let value = match self {
            Self::LinearRegression(model) => model.predict(features)?,
            Self::DecisionTree(tree) => tree.predict(features)?,
            Self::RandomForest(forest) => forest.predict(features)?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ModelError::NonFinite(value))
        }
    }

    fn model_type(&self) -> &str {
        match self {
            Self::LinearRegression(_) => "LinearRegression",
            Self::DecisionTree(_) => "DecisionTreeRegressor",
            Self::RandomForest(_) => "RandomForestRegressor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegression {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.coefficients.len(),
                found: features.len(),
            });
        }
        Ok(self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (weight, value)| acc + weight * value))
    }
}

/// Flattened tree; node 0 is the root. Rows go left when
/// `features[feature] <= threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub n_features: usize,
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl DecisionTree {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                found: features.len(),
            });
        }

        let mut index = 0;
        // A well-formed tree reaches a leaf in fewer hops than it has nodes.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).ok_or_else(|| {
                        ModelError::MalformedTree(format!(
                            "node {index} splits on missing feature {feature}"
                        ))
                    })?;
                    index = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ModelError::MalformedTree(format!(
                        "node {index} does not exist"
                    )))
                }
            }
        }

        Err(ModelError::MalformedTree(
            "traversal did not reach a leaf".to_string(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::MalformedTree("forest has no trees".to_string()));
        }
        let total = self
            .trees
            .iter()
            .map(|tree| tree.predict(features))
            .sum::<Result<f64, _>>()?;
        Ok(total / self.trees.len() as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    StandardScaler(StandardScaler),
    MinMaxScaler(MinMaxScaler),
}

impl ScalerArtifact {
    fn columns(&self) -> usize {
        let (centers, scales) = self.parameter_lengths();
        centers.min(scales)
    }

    fn parameter_lengths(&self) -> (usize, usize) {
        match self {
            Self::StandardScaler(scaler) => (scaler.mean.len(), scaler.scale.len()),
            Self::MinMaxScaler(scaler) => (scaler.min.len(), scaler.scale.len()),
        }
    }

    fn declared(&self) -> Option<usize> {
        match self {
            Self::StandardScaler(scaler) => scaler.n_features_in,
            Self::MinMaxScaler(scaler) => scaler.n_features_in,
        }
    }

    /// Reject a document whose parameters cannot describe one fitted scaler:
    /// parameter vectors of different lengths, or an `n_features_in` that
    /// disagrees with them.
    pub fn validate(&self) -> Result<(), ScalerError> {
        let (centers, scales) = self.parameter_lengths();
        if centers != scales {
            return Err(ScalerError::ParameterLengths { centers, scales });
        }
        match self.declared() {
            Some(declared) if declared != centers => Err(ScalerError::DeclaredWidth {
                declared,
                columns: centers,
            }),
            _ => Ok(()),
        }
    }
}

impl FeatureScaler for ScalerArtifact {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ScalerError> {
        let expected = self.columns();
        if features.len() != expected {
            return Err(ScalerError::DimensionMismatch {
                expected,
                found: features.len(),
            });
        }

        let scaled = match self {
            Self::StandardScaler(scaler) => features
                .iter()
                .zip(scaler.mean.iter().zip(&scaler.scale))
                .map(|(value, (mean, scale))| {
                    let scale = if *scale == 0.0 { 1.0 } else { *scale };
                    (value - mean) / scale
                })
                .collect(),
            Self::MinMaxScaler(scaler) => features
                .iter()
                .zip(scaler.min.iter().zip(&scaler.scale))
                .map(|(value, (min, scale))| value * scale + min)
                .collect(),
        };
        Ok(scaled)
    }

    fn feature_count(&self) -> usize {
        self.columns()
    }

    fn scaler_type(&self) -> &str {
        match self {
            Self::StandardScaler(_) => "StandardScaler",
            Self::MinMaxScaler(_) => "MinMaxScaler",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features_in: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub min: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features_in: Option<usize>,
}
