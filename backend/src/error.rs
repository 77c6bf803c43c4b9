//! Error taxonomy for the settlement batch engine
//!
//! Every error here is scoped to a single batch workflow. None of them is
//! fatal to the process, and a rejected call never leaves the engine in a
//! half-mutated state: preconditions are checked before anything changes.

use crate::models::{BatchId, BatchState, CandidateId, MerchantId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the candidate loader collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Precondition violations raised by the selection state machine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Merchant {0} is not in the known merchant list")]
    InvalidMerchant(MerchantId),

    #[error("Candidate {0} is not in the loaded candidate list")]
    UnknownCandidate(CandidateId),

    #[error("Submission not allowed: state {state}, {selected} selected")]
    SubmitNotAllowed { state: BatchState, selected: usize },

    #[error("A batch submission is already in flight")]
    AlreadySubmitting,

    #[error("Cannot reset while a batch submission is in flight")]
    ResetWhileSubmitting,

    #[error("No batch submission is in flight")]
    NoBatchInFlight,

    #[error("Settlement result for batch {received} does not match in-flight batch {expected}")]
    BatchMismatch { expected: BatchId, received: BatchId },

    /// Candidate loading failed; the engine has already recovered to `Ready`
    /// with an empty candidate list.
    #[error("Candidate load failed: {0}")]
    CandidateLoad(#[from] FetchError),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid urgency thresholds: critical {critical_days} must be within 0..={warning_days}")]
    InvalidUrgencyThresholds { critical_days: i64, warning_days: i64 },

    #[error("Invalid decimal places: {0} (max 6)")]
    InvalidDecimalPlaces(u32),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, SelectionError>;
