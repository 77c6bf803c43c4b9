//! Temporal status resolution
//!
//! Derives discrete statuses for date-bounded records (pricing-scheme
//! assignments, credential expiry) purely from an injected "now". Nothing in
//! this module reads the system clock.

pub mod status;
pub mod urgency;

pub use status::{
    resolve_all, resolve_status, sort_for_display, DatedRecord, SchemeAssignment, TemporalStatus,
};
pub use urgency::{days_left, urgency_tier, ExpiryNotice, UrgencyTier};
