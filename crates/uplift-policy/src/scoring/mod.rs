//! Uplift scoring and contact-policy selection.
//!
//! Data flows strictly forward: prediction pairs become [`UpliftRecord`]s,
//! which are ranked, filtered by a [`ContactPolicy`], and summarized.

pub mod domain;
mod error;
mod pipeline;
pub mod policy;
pub mod ranker;
mod service;
pub mod summary;
pub mod uplift;

pub use domain::{
    ContactPolicy, Economics, EconomicsError, IndividualId, OutcomePrediction, PolicyError,
    RankedRecord, UpliftRecord,
};
pub use error::{InputError, InvalidPrediction, ScoringError};
pub use pipeline::{evaluate, ScoringOutcome, ScoringRequest, ScoringSettings};
pub use policy::{profit_curve, BestNDecision, PolicyResult, PolicySelector};
pub use ranker::rank;
pub use service::ScoringService;
pub use summary::Summary;
pub use uplift::{UpliftBatch, UpliftCalculator, DEFAULT_MAX_INVALID_FRACTION};
