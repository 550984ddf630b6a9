use super::domain::{ContactPolicy, Economics, PolicyError, RankedRecord};
use super::ranker::rerank;
use serde::Serialize;
use tracing::{debug, warn};

/// How the `BestN` prefix length was settled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BestNDecision {
    /// Nothing was ranked, so no search ran.
    Empty,
    /// The prefix maximizing cumulative expected profit.
    Optimized { n: usize, profit: f64 },
    /// An operator budget replaced the optimization.
    Override { requested: usize, applied: usize },
}

impl BestNDecision {
    pub fn cutoff(&self) -> usize {
        match self {
            BestNDecision::Empty => 0,
            BestNDecision::Optimized { n, .. } => *n,
            BestNDecision::Override { applied, .. } => *applied,
        }
    }
}

/// Chosen contacts, re-ranked from 1, plus the decision value for `BestN`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyResult {
    pub policy: ContactPolicy,
    pub records: Vec<RankedRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<BestNDecision>,
}

impl PolicyResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Prefix length used by `BestN`; `None` under `Threshold`.
    pub fn best_n(&self) -> Option<usize> {
        self.decision.map(|decision| decision.cutoff())
    }
}

/// Selects the contact subset from ranked records under a [`ContactPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct PolicySelector {
    economics: Economics,
    allow_empty_best_n: bool,
}

impl PolicySelector {
    pub fn new(economics: Economics) -> Self {
        Self {
            economics,
            allow_empty_best_n: false,
        }
    }

    /// Let the `BestN` search pick zero contacts when no prefix is profitable.
    ///
    /// Off by default: the search ranges over `n >= 1`, so at least one contact
    /// is chosen even when every individual has negative expected profit.
    pub fn allow_empty_best_n(mut self, allow: bool) -> Self {
        self.allow_empty_best_n = allow;
        self
    }

    pub fn select_named(
        &self,
        ranked: Vec<RankedRecord>,
        policy: &str,
        top_n: Option<usize>,
    ) -> Result<PolicyResult, PolicyError> {
        let policy = policy.parse::<ContactPolicy>()?;
        Ok(self.select(ranked, policy, top_n))
    }

    /// `top_n` only applies to `BestN`, where it takes precedence over the
    /// optimized prefix length. It is clamped to the number of ranked records.
    pub fn select(
        &self,
        ranked: Vec<RankedRecord>,
        policy: ContactPolicy,
        top_n: Option<usize>,
    ) -> PolicyResult {
        match policy {
            ContactPolicy::Threshold => {
                if let Some(requested) = top_n {
                    warn!(requested, "top_n is only honored by the bestN policy; ignoring");
                }
                self.threshold(ranked)
            }
            ContactPolicy::BestN => self.best_prefix(ranked, top_n),
        }
    }

    fn threshold(&self, ranked: Vec<RankedRecord>) -> PolicyResult {
        let mut records: Vec<RankedRecord> = ranked
            .into_iter()
            .filter(|record| record.exp_profit_per_contact > 0.0)
            .collect();
        rerank(&mut records);
        debug!(contacts = records.len(), "threshold policy selected contacts");

        PolicyResult {
            policy: ContactPolicy::Threshold,
            records,
            decision: None,
        }
    }

    fn best_prefix(&self, mut ranked: Vec<RankedRecord>, top_n: Option<usize>) -> PolicyResult {
        let decision = if ranked.is_empty() {
            BestNDecision::Empty
        } else if let Some(requested) = top_n {
            BestNDecision::Override {
                requested,
                applied: requested.min(ranked.len()),
            }
        } else {
            let (n, profit) = optimal_prefix(&ranked, self.economics, self.allow_empty_best_n);
            BestNDecision::Optimized { n, profit }
        };

        ranked.truncate(decision.cutoff());
        rerank(&mut ranked);
        debug!(?decision, "bestN policy selected contacts");

        PolicyResult {
            policy: ContactPolicy::BestN,
            records: ranked,
            decision: Some(decision),
        }
    }
}

/// `profit(n) = margin * Σ u_1..u_n - cost * n` for `n = 1..=N`.
pub fn profit_curve(ranked: &[RankedRecord], economics: Economics) -> Vec<f64> {
    let mut cumulative = 0.0;
    ranked
        .iter()
        .enumerate()
        .map(|(index, record)| {
            cumulative += record.uplift_hat;
            prefix_profit(cumulative, index + 1, economics)
        })
        .collect()
}

fn prefix_profit(cumulative_uplift: f64, n: usize, economics: Economics) -> f64 {
    economics.margin() * cumulative_uplift - economics.cost() * n as f64
}

/// Linear scan for the first prefix length reaching the maximum profit.
///
/// `ranked` must be non-empty. With `allow_empty` the scan starts from
/// `profit(0) = 0`, otherwise from the one-contact prefix.
fn optimal_prefix(ranked: &[RankedRecord], economics: Economics, allow_empty: bool) -> (usize, f64) {
    let (mut best_n, mut best_profit) = if allow_empty {
        (0, 0.0)
    } else {
        (0, f64::NEG_INFINITY)
    };

    let mut cumulative = 0.0;
    for (index, record) in ranked.iter().enumerate() {
        cumulative += record.uplift_hat;
        let n = index + 1;
        let profit = prefix_profit(cumulative, n, economics);
        if profit > best_profit {
            best_n = n;
            best_profit = profit;
        }
    }

    (best_n, best_profit)
}
