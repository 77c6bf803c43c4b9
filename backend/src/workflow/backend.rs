//! External collaborator contract for the payments backend
//!
//! The engine owns no transport. Whatever implements this trait is
//! responsible for bounding latency and reporting timeouts through the same
//! channels as business failures.

use crate::error::FetchError;
use crate::models::{Batch, MerchantId, MerchantSummary, SettlementOutcome, TransactionCandidate};
use async_trait::async_trait;

/// Payments backend consumed by the workflow
///
/// # Example
/// ```ignore
/// let backend = MyHttpBackend::new(base_url);
/// let workflow = SettlementWorkflow::new(backend);
/// workflow.refresh_merchants().await?;
/// workflow.load_candidates("M-001".into()).await?;
/// ```
#[async_trait]
pub trait SettlementBackend: Send + Sync {
    /// Merchants with settlement-eligible transactions
    async fn fetch_merchant_summaries(&self) -> Result<Vec<MerchantSummary>, FetchError>;

    /// Settlement-eligible transactions for one merchant
    async fn fetch_candidates(
        &self,
        merchant_id: &MerchantId,
    ) -> Result<Vec<TransactionCandidate>, FetchError>;

    /// Settle the batch's candidates
    ///
    /// Called exactly once per submitted batch. `batch.idempotency_key()`
    /// identifies the selection for upstream de-duplication.
    async fn submit_batch(&self, batch: &Batch) -> SettlementOutcome;
}
