//! Batch model
//!
//! A batch is one settlement submission attempt: a snapshot of the selected
//! candidates for one merchant, taken at submit time.

use crate::models::candidate::{CandidateId, MerchantId};
use crate::totals::Totals;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Batch identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for BatchId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Lifecycle of the batch workflow
///
/// ```text
/// Idle → CandidatesLoading → Ready ⇄ Ready (toggle) → Submitting → {Settled, Failed}
/// Settled/Failed → Ready on next load or reset
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchState {
    Idle,
    CandidatesLoading,
    Ready,
    Submitting,
    Settled,
    Failed,
}

impl BatchState {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchState::Idle => "idle",
            BatchState::CandidatesLoading => "candidates_loading",
            BatchState::Ready => "ready",
            BatchState::Submitting => "submitting",
            BatchState::Settled => "settled",
            BatchState::Failed => "failed",
        }
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result reported by the payments backend for one batch
///
/// Timeouts and transport failures arrive here as `Failed` too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementOutcome {
    Settled,
    Failed { reason: String },
}

impl SettlementOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        SettlementOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, SettlementOutcome::Settled)
    }
}

/// One submission attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    id: BatchId,
    merchant_id: MerchantId,

    /// Selected candidates at submit time, in candidate-list order
    candidate_ids: Vec<CandidateId>,

    totals: Totals,
    state: BatchState,

    /// SHA256 over merchant and sorted candidate ids
    idempotency_key: String,
}

impl Batch {
    pub fn new(merchant_id: MerchantId, candidate_ids: Vec<CandidateId>, totals: Totals) -> Self {
        let idempotency_key = compute_idempotency_key(&merchant_id, &candidate_ids);
        Self {
            id: BatchId::new(),
            merchant_id,
            candidate_ids,
            totals,
            state: BatchState::Submitting,
            idempotency_key,
        }
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn merchant_id(&self) -> &MerchantId {
        &self.merchant_id
    }

    pub fn candidate_ids(&self) -> &[CandidateId] {
        &self.candidate_ids
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn idempotency_key(&self) -> &str {
        &self.idempotency_key
    }

    pub(crate) fn resolve(&mut self, outcome: &SettlementOutcome) {
        self.state = if outcome.is_settled() {
            BatchState::Settled
        } else {
            BatchState::Failed
        };
    }
}

/// Deterministic fingerprint of a batch's contents
///
/// Independent of selection order, so retrying the same selection yields
/// the same key.
pub fn compute_idempotency_key(merchant_id: &MerchantId, candidate_ids: &[CandidateId]) -> String {
    let mut sorted: Vec<&str> = candidate_ids.iter().map(CandidateId::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(merchant_id.as_str().as_bytes());
    for id in sorted {
        hasher.update(b"\n");
        hasher.update(id.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<CandidateId> {
        raw.iter().map(|id| CandidateId::from(*id)).collect()
    }

    #[test]
    fn test_new_batch_is_submitting() {
        let batch = Batch::new(MerchantId::from("M-1"), ids(&["1", "2"]), Totals::default());
        assert_eq!(batch.state(), BatchState::Submitting);
        assert_eq!(batch.candidate_ids().len(), 2);
        assert_eq!(batch.idempotency_key().len(), 64);
    }

    #[test]
    fn test_idempotency_key_ignores_order() {
        let merchant = MerchantId::from("M-1");
        assert_eq!(
            compute_idempotency_key(&merchant, &ids(&["a", "b", "c"])),
            compute_idempotency_key(&merchant, &ids(&["c", "a", "b"]))
        );
    }

    #[test]
    fn test_idempotency_key_depends_on_merchant_and_contents() {
        let key = compute_idempotency_key(&MerchantId::from("M-1"), &ids(&["a"]));
        assert_ne!(key, compute_idempotency_key(&MerchantId::from("M-2"), &ids(&["a"])));
        assert_ne!(key, compute_idempotency_key(&MerchantId::from("M-1"), &ids(&["a", "b"])));
    }

    #[test]
    fn test_resolve_marks_state() {
        let mut batch = Batch::new(MerchantId::from("M-1"), ids(&["1"]), Totals::default());
        batch.resolve(&SettlementOutcome::failed("timeout"));
        assert_eq!(batch.state(), BatchState::Failed);
        batch.resolve(&SettlementOutcome::Settled);
        assert_eq!(batch.state(), BatchState::Settled);
    }
}
