//! Domain models for the settlement batch engine

pub mod batch;
pub mod candidate;
pub mod event;

// Re-exports
pub use batch::{compute_idempotency_key, Batch, BatchId, BatchState, SettlementOutcome};
pub use candidate::{CandidateId, MerchantId, MerchantSummary, TransactionCandidate};
pub use event::{Event, EventLog, LoggedEvent};
