//! Scriptable in-memory payments backend
//!
//! Responses are queued per call kind and returned in FIFO order. A response
//! can be held back until a trigger fires, which lets tests interleave
//! overlapping loads and submissions deterministically.

use crate::error::FetchError;
use crate::models::{
    Batch, CandidateId, MerchantId, MerchantSummary, SettlementOutcome, TransactionCandidate,
};
use crate::workflow::backend::SettlementBackend;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::oneshot;

type CandidateResult = Result<Vec<TransactionCandidate>, FetchError>;

/// A queued response that can optionally wait for a trigger
enum MockResponse<T> {
    Immediate(T),
    Triggered {
        response: T,
        trigger: oneshot::Receiver<()>,
    },
}

impl<T> MockResponse<T> {
    async fn resolve(self) -> T {
        match self {
            MockResponse::Immediate(response) => response,
            MockResponse::Triggered { response, trigger } => {
                // Dropping the sender also releases the response.
                let _ = trigger.await;
                response
            }
        }
    }
}

/// Record of a call made to the mock backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    FetchMerchantSummaries,
    FetchCandidates(MerchantId),
    SubmitBatch {
        merchant_id: MerchantId,
        candidate_ids: Vec<CandidateId>,
        idempotency_key: String,
    },
}

#[derive(Default)]
struct MockState {
    merchants: Vec<MerchantSummary>,
    candidates: HashMap<MerchantId, VecDeque<MockResponse<CandidateResult>>>,
    settlements: VecDeque<MockResponse<SettlementOutcome>>,
    calls: Vec<MockCall>,
}

/// In-memory `SettlementBackend` for tests and demos
///
/// Unscripted candidate fetches fail with `NotFound`; unscripted
/// submissions fail with a descriptive reason.
#[derive(Clone, Default)]
pub struct MockSettlementBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockSettlementBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_merchants(&self, merchants: Vec<MerchantSummary>) {
        self.state.lock().merchants = merchants;
    }

    /// Queue a candidate response for a merchant
    pub fn add_candidates(&self, merchant_id: impl Into<MerchantId>, response: CandidateResult) {
        self.state
            .lock()
            .candidates
            .entry(merchant_id.into())
            .or_default()
            .push_back(MockResponse::Immediate(response));
    }

    /// Queue a candidate response that completes only when the returned
    /// sender fires (or is dropped)
    pub fn add_candidates_with_trigger(
        &self,
        merchant_id: impl Into<MerchantId>,
        response: CandidateResult,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .candidates
            .entry(merchant_id.into())
            .or_default()
            .push_back(MockResponse::Triggered {
                response,
                trigger: rx,
            });
        tx
    }

    pub fn add_settlement(&self, outcome: SettlementOutcome) {
        self.state
            .lock()
            .settlements
            .push_back(MockResponse::Immediate(outcome));
    }

    pub fn add_settlement_with_trigger(&self, outcome: SettlementOutcome) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .settlements
            .push_back(MockResponse::Triggered {
                response: outcome,
                trigger: rx,
            });
        tx
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    /// Number of `submit_batch` calls received
    pub fn submit_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, MockCall::SubmitBatch { .. }))
            .count()
    }
}

#[async_trait]
impl SettlementBackend for MockSettlementBackend {
    async fn fetch_merchant_summaries(&self) -> Result<Vec<MerchantSummary>, FetchError> {
        let mut state = self.state.lock();
        state.calls.push(MockCall::FetchMerchantSummaries);
        Ok(state.merchants.clone())
    }

    async fn fetch_candidates(
        &self,
        merchant_id: &MerchantId,
    ) -> Result<Vec<TransactionCandidate>, FetchError> {
        let queued = {
            let mut state = self.state.lock();
            state.calls.push(MockCall::FetchCandidates(merchant_id.clone()));
            state
                .candidates
                .get_mut(merchant_id)
                .and_then(VecDeque::pop_front)
        };

        match queued {
            Some(response) => response.resolve().await,
            None => Err(FetchError::NotFound(format!(
                "no mock candidates configured for {}",
                merchant_id
            ))),
        }
    }

    async fn submit_batch(&self, batch: &Batch) -> SettlementOutcome {
        let queued = {
            let mut state = self.state.lock();
            state.calls.push(MockCall::SubmitBatch {
                merchant_id: batch.merchant_id().clone(),
                candidate_ids: batch.candidate_ids().to_vec(),
                idempotency_key: batch.idempotency_key().to_string(),
            });
            state.settlements.pop_front()
        };

        match queued {
            Some(response) => response.resolve().await,
            None => SettlementOutcome::failed("no mock settlement configured"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unscripted_responses() {
        let mock = MockSettlementBackend::new();
        let result = mock.fetch_candidates(&MerchantId::from("M-1")).await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
        assert_eq!(mock.calls(), vec![MockCall::FetchCandidates("M-1".into())]);
    }

    #[tokio::test]
    async fn test_responses_are_fifo() {
        let mock = MockSettlementBackend::new();
        mock.add_candidates("M-1", Ok(vec![]));
        mock.add_candidates("M-1", Err(FetchError::Network("reset".to_string())));

        assert_eq!(mock.fetch_candidates(&"M-1".into()).await, Ok(vec![]));
        assert_eq!(
            mock.fetch_candidates(&"M-1".into()).await,
            Err(FetchError::Network("reset".to_string()))
        );
    }

    #[tokio::test]
    async fn test_triggered_response_waits() {
        let mock = MockSettlementBackend::new();
        let trigger = mock.add_candidates_with_trigger("M-1", Ok(vec![]));

        let merchant_id: MerchantId = "M-1".into();
        let fetch = mock.fetch_candidates(&merchant_id);
        let release = async {
            tokio::task::yield_now().await;
            let _ = trigger.send(());
        };
        let (result, ()) = tokio::join!(fetch, release);
        assert_eq!(result, Ok(vec![]));
    }
}
