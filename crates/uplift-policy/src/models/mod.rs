//! Read-only outcome models consumed by the scoring service.
//!
//! Training happens elsewhere; this module only loads exported model bundles
//! and runs inference. A bundle directory holds `meta.json`, `preprocess.json`,
//! `treated.json` and `control.json`.

mod bundle;
mod encoder;
mod meta;
mod spec;

pub use bundle::ModelBundle;
pub use encoder::{FeatureEncoder, FeatureMatrix};
pub use meta::{ModelMetadata, PreprocessSpec};
pub use spec::{ForestModel, LinearModel, ModelSpec, RegressionTree, TreeNode};

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Inference capability for one arm of the uplift model.
///
/// Implementations are shared across concurrent requests and must not mutate
/// themselves while predicting.
pub trait PredictiveModel: Send + Sync {
    /// Number of encoded feature columns expected, when the model knows it.
    fn input_width(&self) -> Option<usize> {
        None
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError>;
}

/// Which potential outcome a model predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelArm {
    Treated,
    Control,
}

impl ModelArm {
    pub fn label(&self) -> &'static str {
        match self {
            ModelArm::Treated => "treated",
            ModelArm::Control => "control",
        }
    }
}

impl fmt::Display for ModelArm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid model file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{arm} model expects {expected} features but the encoder produces {actual}")]
    WidthMismatch {
        arm: ModelArm,
        expected: usize,
        actual: usize,
    },
    #[error("{arm} model returned {actual} predictions for {expected} rows")]
    OutputLength {
        arm: ModelArm,
        expected: usize,
        actual: usize,
    },
    #[error("tree {tree}, node {node}: {reason}")]
    InvalidTree {
        tree: usize,
        node: usize,
        reason: String,
    },
    #[error("model inference failed: {0}")]
    Inference(String),
}

/// Run one arm and check the output lines up with the input rows.
pub(crate) fn predict_checked<M: PredictiveModel + ?Sized>(
    arm: ModelArm,
    model: &M,
    features: &FeatureMatrix,
) -> Result<Vec<f64>, ModelError> {
    if let Some(expected) = model.input_width() {
        if expected != features.width() {
            return Err(ModelError::WidthMismatch {
                arm,
                expected,
                actual: features.width(),
            });
        }
    }

    let predictions = model.predict(features)?;
    if predictions.len() != features.rows() {
        return Err(ModelError::OutputLength {
            arm,
            expected: features.rows(),
            actual: predictions.len(),
        });
    }
    Ok(predictions)
}
