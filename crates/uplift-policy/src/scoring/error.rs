use super::domain::{EconomicsError, IndividualId, PolicyError};
use crate::models::ModelError;
use serde::Serialize;

/// Failure that aborts a whole scoring invocation.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Problems with the caller-supplied table or parameters.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read input table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("input table is missing required feature columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("row {row}: column '{column}' holds non-numeric value '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
    #[error(
        "{rejected} of {total} rows have non-finite scores, above the allowed fraction {max_fraction}"
    )]
    TooManyInvalidPredictions {
        rejected: usize,
        total: usize,
        max_fraction: f64,
    },
    #[error("max invalid fraction must be within [0, 1], got {0}")]
    InvalidFraction(f64),
    #[error(transparent)]
    Economics(#[from] EconomicsError),
}

/// A row excluded from scoring because a prediction or its derived uplift is not finite.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("non-finite score for individual {id} (row {row}): y1_hat={y1_hat}, y0_hat={y0_hat}")]
pub struct InvalidPrediction {
    pub row: usize,
    pub id: IndividualId,
    pub y1_hat: f64,
    pub y0_hat: f64,
}
