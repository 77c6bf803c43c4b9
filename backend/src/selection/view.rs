//! UI-facing projection of the selection workflow

use crate::config::EngineConfig;
use crate::error::FetchError;
use crate::models::{BatchId, BatchState, CandidateId, MerchantId};
use crate::totals::{FormattedTotals, Totals};
use serde::{Deserialize, Serialize};

/// Everything the UI layer needs to render the batch screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineView {
    pub state: BatchState,
    pub merchant_id: Option<MerchantId>,
    pub candidate_count: usize,

    /// In candidate-list order
    pub selected_ids: Vec<CandidateId>,

    pub totals: Totals,
    pub can_submit: bool,
    pub in_flight_batch: Option<BatchId>,

    /// Set when the last candidate load failed
    pub last_load_error: Option<FetchError>,

    /// Reason reported for the last failed settlement
    pub last_failure: Option<String>,
}

impl EngineView {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn formatted_totals(&self, config: &EngineConfig) -> FormattedTotals {
        self.totals.formatted(&config.amount_format)
    }
}
