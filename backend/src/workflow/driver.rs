//! Settlement workflow driver
//!
//! Serialises state transitions behind a mutex so that several producers
//! (UI events, background refreshes) can call in concurrently. External
//! calls run without the lock held; their results are re-validated against
//! the state machine when they return.
//!
//! A settlement runs on its own task. Dropping the `submit` future stops the
//! caller from waiting but never stops the outcome from being applied.

use crate::error::{EngineResult, FetchError};
use crate::models::{BatchState, CandidateId, LoggedEvent, MerchantId, SettlementOutcome};
use crate::selection::{EngineView, LoadOutcome, SelectionManager};
use crate::totals::Totals;
use crate::workflow::backend::SettlementBackend;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Drives a `SelectionManager` against a `SettlementBackend`
pub struct SettlementWorkflow<B> {
    manager: Arc<Mutex<SelectionManager>>,
    backend: Arc<B>,
}

impl<B> Clone for SettlementWorkflow<B> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            backend: self.backend.clone(),
        }
    }
}

impl<B: SettlementBackend + 'static> SettlementWorkflow<B> {
    /// Create a workflow with no known merchants yet
    pub fn new(backend: B) -> Self {
        Self::with_manager(SelectionManager::new(Vec::new()), backend)
    }

    pub fn with_manager(manager: SelectionManager, backend: B) -> Self {
        Self {
            manager: Arc::new(Mutex::new(manager)),
            backend: Arc::new(backend),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Pull the merchant list from the backend
    #[tracing::instrument(skip(self))]
    pub async fn refresh_merchants(&self) -> Result<usize, FetchError> {
        let merchants = self.backend.fetch_merchant_summaries().await?;
        let count = merchants.len();
        self.manager.lock().set_merchants(merchants);
        debug!(count, "Merchant list refreshed");
        Ok(count)
    }

    /// Load candidates for a merchant
    ///
    /// If another load is requested before this one returns, this response
    /// is discarded and `LoadOutcome::Discarded` is returned.
    #[tracing::instrument(skip(self))]
    pub async fn load_candidates(&self, merchant_id: MerchantId) -> EngineResult<LoadOutcome> {
        let ticket = self.manager.lock().begin_load(merchant_id)?;
        let result = self.backend.fetch_candidates(ticket.merchant_id()).await;
        self.manager.lock().complete_load(&ticket, result)
    }

    /// Submit the current selection and apply the backend's outcome
    ///
    /// A concurrent second call fails with `AlreadySubmitting` without
    /// reaching the backend. Must be called from within a tokio runtime.
    #[tracing::instrument(skip(self))]
    pub async fn submit(&self) -> EngineResult<BatchState> {
        let batch = self.manager.lock().submit()?;
        let batch_id = batch.id();
        let manager = Arc::clone(&self.manager);
        let backend = Arc::clone(&self.backend);

        let settlement = tokio::spawn(
            async move {
                let outcome = backend.submit_batch(&batch).await;
                info!(batch_id = %batch_id, settled = outcome.is_settled(), "Settlement outcome received");
                manager.lock().on_settlement_result(batch_id, outcome)
            }
            .in_current_span(),
        );

        match settlement.await {
            Ok(state) => state,
            Err(error) => {
                warn!(batch_id = %batch_id, error = %error, "Settlement task aborted");
                self.manager.lock().on_settlement_result(
                    batch_id,
                    SettlementOutcome::failed(format!("settlement task aborted: {}", error)),
                )
            }
        }
    }

    pub fn toggle_selection(&self, candidate_id: &CandidateId) -> EngineResult<bool> {
        self.manager.lock().toggle_selection(candidate_id)
    }

    pub fn select_all(&self) -> EngineResult<()> {
        self.manager.lock().select_all()
    }

    pub fn clear_selection(&self) -> EngineResult<()> {
        self.manager.lock().clear_selection()
    }

    pub fn reset(&self) -> EngineResult<()> {
        self.manager.lock().reset()
    }

    pub fn state(&self) -> BatchState {
        self.manager.lock().state()
    }

    pub fn compute_totals(&self) -> Totals {
        self.manager.lock().compute_totals()
    }

    pub fn can_submit(&self) -> bool {
        self.manager.lock().can_submit()
    }

    pub fn view(&self) -> EngineView {
        self.manager.lock().view()
    }

    pub fn drain_events(&self) -> Vec<LoggedEvent> {
        self.manager.lock().drain_events()
    }

    /// Run a closure against the manager under the lock
    pub fn with_manager_mut<R>(&self, f: impl FnOnce(&mut SelectionManager) -> R) -> R {
        f(&mut self.manager.lock())
    }
}
