//! Event log for the batch workflow
//!
//! Every operation on the selection manager, accepted or rejected, appends
//! an event. The UI layer drains them to drive notifications and audit
//! trails without polling state.
//!
//! # Example
//!
//! ```rust
//! use settlement_batch_engine::models::{Event, EventLog, MerchantId};
//!
//! let mut log = EventLog::new();
//! log.log(Event::LoadRequested {
//!     merchant_id: MerchantId::from("M-001"),
//!     generation: 1,
//! });
//!
//! assert_eq!(log.events()[0].seq, 1);
//! assert_eq!(log.events()[0].event.event_type(), "LoadRequested");
//! ```

use crate::models::batch::BatchId;
use crate::models::candidate::{CandidateId, MerchantId};
use serde::{Deserialize, Serialize};

/// Workflow event capturing a state change or a rejected call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Known merchant list replaced
    MerchantsUpdated { count: usize },

    /// Candidate load started for a merchant
    LoadRequested {
        merchant_id: MerchantId,
        generation: u64,
    },

    /// Candidate load applied
    CandidatesLoaded {
        merchant_id: MerchantId,
        count: usize,
    },

    /// Response for a superseded load request was ignored
    LoadDiscarded {
        merchant_id: MerchantId,
        generation: u64,
    },

    /// Candidate load failed; candidates are now empty
    LoadFailed {
        merchant_id: MerchantId,
        error: String,
    },

    /// Candidate membership flipped
    SelectionToggled {
        candidate_id: CandidateId,
        selected: bool,
    },

    /// Selection replaced in bulk (select all / clear)
    SelectionReplaced { count: usize },

    /// Batch handed to the payments backend
    BatchSubmitted {
        batch_id: BatchId,
        merchant_id: MerchantId,
        count: usize,
        total_net: i128,
    },

    /// Backend confirmed settlement
    BatchSettled { batch_id: BatchId },

    /// Backend reported failure; selection preserved for retry
    BatchFailed { batch_id: BatchId, reason: String },

    /// Selection cleared and any pending batch discarded
    Reset,

    /// A call was refused; state is unchanged
    Rejected { operation: String, reason: String },
}

impl Event {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::MerchantsUpdated { .. } => "MerchantsUpdated",
            Event::LoadRequested { .. } => "LoadRequested",
            Event::CandidatesLoaded { .. } => "CandidatesLoaded",
            Event::LoadDiscarded { .. } => "LoadDiscarded",
            Event::LoadFailed { .. } => "LoadFailed",
            Event::SelectionToggled { .. } => "SelectionToggled",
            Event::SelectionReplaced { .. } => "SelectionReplaced",
            Event::BatchSubmitted { .. } => "BatchSubmitted",
            Event::BatchSettled { .. } => "BatchSettled",
            Event::BatchFailed { .. } => "BatchFailed",
            Event::Reset => "Reset",
            Event::Rejected { .. } => "Rejected",
        }
    }

    /// Batch this event refers to, if any
    pub fn batch_id(&self) -> Option<BatchId> {
        match self {
            Event::BatchSubmitted { batch_id, .. }
            | Event::BatchSettled { batch_id }
            | Event::BatchFailed { batch_id, .. } => Some(*batch_id),
            _ => None,
        }
    }
}

/// Event with its position in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub seq: u64,
    pub event: Event,
}

/// Append-only event log; sequence numbers survive draining
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<LoggedEvent>,
    next_seq: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_seq: 1,
        }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        let seq = self.next_seq.max(1);
        self.next_seq = seq + 1;
        self.events.push(LoggedEvent { seq, event });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[LoggedEvent] {
        &self.events
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&LoggedEvent> {
        self.events
            .iter()
            .filter(|e| e.event.event_type() == event_type)
            .collect()
    }

    /// Get events for a specific batch
    pub fn events_for_batch(&self, batch_id: BatchId) -> Vec<&LoggedEvent> {
        self.events
            .iter()
            .filter(|e| e.event.batch_id() == Some(batch_id))
            .collect()
    }

    /// Take all pending events, leaving the log empty
    pub fn drain(&mut self) -> Vec<LoggedEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_survives_drain() {
        let mut log = EventLog::new();
        log.log(Event::Reset);
        log.log(Event::SelectionReplaced { count: 0 });
        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(log.is_empty());

        log.log(Event::Reset);
        assert_eq!(log.events()[0].seq, 3);
    }

    #[test]
    fn test_default_log_starts_at_one() {
        let mut log = EventLog::default();
        log.log(Event::Reset);
        assert_eq!(log.events()[0].seq, 1);
    }

    #[test]
    fn test_events_for_batch() {
        let mut log = EventLog::new();
        let batch_a = BatchId::new();
        let batch_b = BatchId::new();
        log.log(Event::BatchSettled { batch_id: batch_a });
        log.log(Event::BatchFailed {
            batch_id: batch_b,
            reason: "declined".to_string(),
        });
        log.log(Event::Reset);

        assert_eq!(log.events_for_batch(batch_a).len(), 1);
        assert_eq!(log.events_for_batch(batch_b).len(), 1);
        assert_eq!(log.events_of_type("Reset").len(), 1);
    }
}
