use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque key identifying one individual across the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndividualId(pub String);

impl IndividualId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Dense `0..N-1` identifiers for tables without an identifier column.
    pub fn sequence(len: usize) -> Vec<IndividualId> {
        (0..len).map(|index| IndividualId(index.to_string())).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IndividualId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for IndividualId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Predicted outcomes for one individual under treatment and under control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomePrediction {
    pub id: IndividualId,
    pub y1_hat: f64,
    pub y0_hat: f64,
}

impl OutcomePrediction {
    pub fn new(id: impl Into<IndividualId>, y1_hat: f64, y0_hat: f64) -> Self {
        Self {
            id: id.into(),
            y1_hat,
            y0_hat,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.y1_hat.is_finite() && self.y0_hat.is_finite()
    }
}

/// Unit economics of a contact: revenue per unit of outcome and fixed cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Economics {
    margin: f64,
    cost: f64,
}

impl Economics {
    pub fn new(margin: f64, cost: f64) -> Result<Self, EconomicsError> {
        if !margin.is_finite() {
            return Err(EconomicsError::Margin(margin));
        }
        if !cost.is_finite() {
            return Err(EconomicsError::Cost(cost));
        }
        Ok(Self { margin, cost })
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn profit_per_contact(&self, uplift: f64) -> f64 {
        self.margin * uplift - self.cost
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EconomicsError {
    #[error("margin must be a finite number, got {0}")]
    Margin(f64),
    #[error("cost must be a finite number, got {0}")]
    Cost(f64),
}

/// Signed treatment-effect estimate and the per-contact economics derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpliftRecord {
    pub id: IndividualId,
    pub y1_hat: f64,
    pub y0_hat: f64,
    pub uplift: f64,
    pub exp_incremental_revenue: f64,
    pub exp_profit_per_contact: f64,
}

/// An uplift record placed in the descending-uplift ordering.
///
/// Serializes with the column names of the contact list table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecord {
    pub row_id: IndividualId,
    pub rank: usize,
    pub uplift_hat: f64,
    pub y1_hat: f64,
    pub y0_hat: f64,
    pub exp_incremental_revenue: f64,
    pub exp_profit_per_contact: f64,
}

impl RankedRecord {
    pub fn from_uplift(record: UpliftRecord, rank: usize) -> Self {
        Self {
            row_id: record.id,
            rank,
            uplift_hat: record.uplift,
            y1_hat: record.y1_hat,
            y0_hat: record.y0_hat,
            exp_incremental_revenue: record.exp_incremental_revenue,
            exp_profit_per_contact: record.exp_profit_per_contact,
        }
    }
}

/// Rule deciding which ranked individuals get contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactPolicy {
    /// Contact everyone with strictly positive expected profit.
    #[serde(rename = "pos", alias = "threshold")]
    Threshold,
    /// Contact the prefix that maximizes cumulative expected profit.
    #[serde(rename = "bestN", alias = "best_n")]
    BestN,
}

impl ContactPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            ContactPolicy::Threshold => "pos",
            ContactPolicy::BestN => "bestN",
        }
    }
}

impl fmt::Display for ContactPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ContactPolicy {
    type Err = PolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "pos" | "threshold" => Ok(ContactPolicy::Threshold),
            "bestN" | "best_n" => Ok(ContactPolicy::BestN),
            other => Err(PolicyError::Unrecognized(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("policy must be 'pos' or 'bestN', got '{0}'")]
    Unrecognized(String),
}
