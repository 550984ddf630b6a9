use super::encoder::FeatureMatrix;
use super::{ModelArm, ModelError, PredictiveModel};
use serde::{Deserialize, Serialize};

/// Exported regression model for one arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear(LinearModel),
    Forest(ForestModel),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default)]
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

/// Averaging ensemble of regression trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub trees: Vec<RegressionTree>,
}

/// Flat node array; node 0 is the root and children come after their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
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

impl ModelSpec {
    /// Structural checks against the encoder width, run once at load time.
    pub fn validate(&self, arm: ModelArm, width: usize) -> Result<(), ModelError> {
        match self {
            ModelSpec::Linear(model) => {
                if model.coefficients.len() != width {
                    return Err(ModelError::WidthMismatch {
                        arm,
                        expected: model.coefficients.len(),
                        actual: width,
                    });
                }
                Ok(())
            }
            ModelSpec::Forest(forest) => {
                if forest.trees.is_empty() {
                    return Err(ModelError::InvalidTree {
                        tree: 0,
                        node: 0,
                        reason: format!("{arm} forest has no trees"),
                    });
                }
                forest
                    .trees
                    .iter()
                    .enumerate()
                    .try_for_each(|(index, tree)| tree.validate(index, width))
            }
        }
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        match self {
            ModelSpec::Linear(model) => Ok(model.intercept
                + model
                    .coefficients
                    .iter()
                    .zip(row)
                    .map(|(weight, value)| weight * value)
                    .sum::<f64>()),
            ModelSpec::Forest(forest) => {
                if forest.trees.is_empty() {
                    return Err(ModelError::InvalidTree {
                        tree: 0,
                        node: 0,
                        reason: "forest has no trees".to_string(),
                    });
                }
                let mut total = 0.0;
                for (index, tree) in forest.trees.iter().enumerate() {
                    total += tree.predict_row(index, row)?;
                }
                Ok(total / forest.trees.len() as f64)
            }
        }
    }
}

impl PredictiveModel for ModelSpec {
    fn input_width(&self) -> Option<usize> {
        match self {
            ModelSpec::Linear(model) => Some(model.coefficients.len()),
            ModelSpec::Forest(_) => None,
        }
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        features.iter_rows().map(|row| self.predict_row(row)).collect()
    }
}

impl RegressionTree {
    fn validate(&self, tree: usize, width: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::InvalidTree {
                tree,
                node: 0,
                reason: "tree has no nodes".to_string(),
            });
        }

        for (node, entry) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = *entry
            {
                let invalid = |reason: String| ModelError::InvalidTree { tree, node, reason };
                if feature >= width {
                    return Err(invalid(format!(
                        "split feature {feature} is outside {width} encoded columns"
                    )));
                }
                for child in [left, right] {
                    if child <= node || child >= self.nodes.len() {
                        return Err(invalid(format!("child index {child} is out of order")));
                    }
                }
            }
        }

        Ok(())
    }

    /// A NaN feature reached at a split makes the whole prediction NaN.
    ///
    /// Walks only forward through the node array, so a tree that skipped
    /// validation fails with [`ModelError::InvalidTree`] instead of looping.
    fn predict_row(&self, tree: usize, row: &[f64]) -> Result<f64, ModelError> {
        let mut index = 0;
        loop {
            let invalid = move |reason: String| ModelError::InvalidTree {
                tree,
                node: index,
                reason,
            };
            let node = self
                .nodes
                .get(index)
                .ok_or_else(|| invalid("node index is out of range".to_string()))?;

            match node {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = *row.get(*feature).ok_or_else(|| {
                        invalid(format!(
                            "split feature {feature} is outside {} encoded columns",
                            row.len()
                        ))
                    })?;
                    if value.is_nan() {
                        return Ok(f64::NAN);
                    }
                    let next = if value <= *threshold { *left } else { *right };
                    if next <= index {
                        return Err(invalid(format!("child index {next} is out of order")));
                    }
                    index = next;
                }
            }
        }
    }
}
