//! Settlement Batch Engine
//!
//! Selection, aggregation and submission gating for merchant settlement
//! batches, plus date-window status derivation for dated records such as
//! pricing-scheme assignments.
//!
//! # Architecture
//!
//! - **models**: Domain types (candidates, merchants, batches, events)
//! - **selection**: Candidate & Selection Manager state machine
//! - **totals**: Derived totals and amount formatting
//! - **temporal**: Effective/expiry status and urgency tiers
//! - **workflow**: Async driver over the external payments backend
//! - **config**: Presentation configuration
//!
//! # Critical Invariants
//!
//! 1. Candidate amounts are i64 (minor units); totals are summed in i128
//! 2. At most one batch is in flight per workflow
//! 3. "Now" is always injected, never read from the system clock

pub mod config;
pub mod error;
pub mod models;
pub mod selection;
pub mod temporal;
pub mod totals;
pub mod workflow;

// Re-exports for convenience
pub use config::{AmountFormat, EngineConfig, UrgencyThresholds};
pub use error::{ConfigError, EngineResult, FetchError, SelectionError};
pub use models::{
    Batch, BatchId, BatchState, CandidateId, Event, EventLog, LoggedEvent, MerchantId,
    MerchantSummary, SettlementOutcome, TransactionCandidate,
};
pub use selection::{EngineView, LoadOutcome, LoadTicket, SelectionManager};
pub use temporal::{
    days_left, resolve_all, resolve_status, sort_for_display, urgency_tier, DatedRecord,
    ExpiryNotice, SchemeAssignment, TemporalStatus, UrgencyTier,
};
pub use totals::{format_amount, FormattedTotals, Totals};
pub use workflow::{MockCall, MockSettlementBackend, SettlementBackend, SettlementWorkflow};
