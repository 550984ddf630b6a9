use super::domain::{ContactPolicy, Economics, OutcomePrediction};
use super::error::{InvalidPrediction, ScoringError};
use super::policy::{PolicyResult, PolicySelector};
use super::ranker::rank;
use super::summary::Summary;
use super::uplift::{UpliftCalculator, DEFAULT_MAX_INVALID_FRACTION};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Per-invocation parameters supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringRequest {
    pub margin: f64,
    pub cost: f64,
    pub policy: ContactPolicy,
    pub top_n: Option<usize>,
    pub id_column: Option<String>,
}

impl ScoringRequest {
    pub fn new(margin: f64, cost: f64, policy: ContactPolicy) -> Self {
        Self {
            margin,
            cost,
            policy,
            top_n: None,
            id_column: None,
        }
    }

    pub fn with_top_n(mut self, top_n: Option<usize>) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_id_column(mut self, id_column: Option<String>) -> Self {
        self.id_column = id_column;
        self
    }

    pub fn economics(&self) -> Result<Economics, ScoringError> {
        Economics::new(self.margin, self.cost).map_err(|err| ScoringError::Input(err.into()))
    }
}

/// Operator-level knobs that stay fixed across invocations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringSettings {
    pub max_invalid_fraction: f64,
    pub allow_empty_best_n: bool,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            max_invalid_fraction: DEFAULT_MAX_INVALID_FRACTION,
            allow_empty_best_n: false,
        }
    }
}

/// Everything one invocation produces. Nothing is returned on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringOutcome {
    pub selection: PolicyResult,
    pub summary: Summary,
    pub rejected: Vec<InvalidPrediction>,
    /// Rows that made it through to ranking.
    pub scored: usize,
}

/// predictions -> uplift records -> ranking -> policy selection -> summary.
pub fn evaluate(
    predictions: Vec<OutcomePrediction>,
    request: &ScoringRequest,
    settings: &ScoringSettings,
) -> Result<ScoringOutcome, ScoringError> {
    let economics = request.economics()?;
    let total = predictions.len();

    let batch = UpliftCalculator::new(economics)
        .with_max_invalid_fraction(settings.max_invalid_fraction)?
        .compute(predictions)?;
    let scored = batch.records.len();

    let ranked = rank(batch.records);
    let selection = PolicySelector::new(economics)
        .allow_empty_best_n(settings.allow_empty_best_n)
        .select(ranked, request.policy, request.top_n);
    let summary = Summary::from_selection(&selection.records, economics);

    info!(
        total,
        scored,
        rejected = batch.rejected.len(),
        policy = %request.policy,
        contacts = summary.contacts,
        expected_profit = summary.expected_profit,
        "scored batch"
    );

    Ok(ScoringOutcome {
        selection,
        summary,
        rejected: batch.rejected,
        scored,
    })
}
