//! Candidate & Selection Manager
//!
//! Single-writer state machine for one batch workflow. Candidate loading and
//! settlement are the only suspension points; both are split into a
//! "begin" call that hands out a token and a "complete" call that applies
//! the response only if it is still relevant.
//!
//! # Critical Invariants
//!
//! 1. **Selection ⊆ candidates**: every selected id exists in the loaded
//!    candidate list of the currently selected merchant
//! 2. **No double settlement**: at most one batch is in flight; a second
//!    submit is refused with `AlreadySubmitting`
//! 3. **Last requested merchant wins**: a load response for a superseded
//!    request is discarded, never applied
//! 4. **Rejected calls do not mutate**: every precondition is checked before
//!    any field changes

use crate::error::{EngineResult, FetchError, SelectionError};
use crate::models::{
    Batch, BatchId, BatchState, CandidateId, Event, EventLog, LoggedEvent, MerchantId,
    MerchantSummary, SettlementOutcome, TransactionCandidate,
};
use crate::selection::view::EngineView;
use crate::totals::Totals;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Token identifying one candidate load request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    merchant_id: MerchantId,
    generation: u64,
}

impl LoadTicket {
    pub fn merchant_id(&self) -> &MerchantId {
        &self.merchant_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a completed load response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Response applied; `count` candidates are now loaded
    Applied { count: usize },

    /// Response belonged to a superseded request and was ignored
    Discarded,
}

/// Selection state machine for settlement batches
///
/// # Example
/// ```
/// use settlement_batch_engine::{
///     BatchState, MerchantSummary, SelectionManager, SettlementOutcome, TransactionCandidate,
/// };
///
/// let merchants = vec![MerchantSummary {
///     id: "M-1".into(),
///     display_name: "Acme".to_string(),
///     contact_name: "Jane".to_string(),
///     available_transactions: 2,
///     total_amount: 350,
/// }];
/// let mut manager = SelectionManager::new(merchants);
///
/// manager
///     .load_candidates(
///         "M-1",
///         vec![
///             TransactionCandidate::new("1", "M-1", 110, 100),
///             TransactionCandidate::new("2", "M-1", 260, 250),
///         ],
///     )
///     .unwrap();
/// manager.toggle_selection(&"1".into()).unwrap();
/// manager.toggle_selection(&"2".into()).unwrap();
/// assert_eq!(manager.compute_totals().total_net, 350);
///
/// let batch = manager.submit().unwrap();
/// assert_eq!(manager.state(), BatchState::Submitting);
///
/// manager
///     .on_settlement_result(batch.id(), SettlementOutcome::Settled)
///     .unwrap();
/// assert_eq!(manager.state(), BatchState::Settled);
/// assert!(manager.candidates().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct SelectionManager {
    merchants: Vec<MerchantSummary>,
    selected_merchant: Option<MerchantId>,

    /// Loaded candidates, replaced wholesale on each load
    candidates: Vec<TransactionCandidate>,

    /// Candidate id → position in `candidates`
    index: HashMap<CandidateId, usize>,

    selection: HashSet<CandidateId>,
    state: BatchState,

    /// Incremented on every load request; responses carrying an older
    /// generation are stale
    load_generation: u64,

    /// In-flight batch, or the most recently resolved one
    batch: Option<Batch>,

    last_load_error: Option<FetchError>,
    last_failure: Option<String>,
    events: EventLog,
}

impl SelectionManager {
    pub fn new(merchants: Vec<MerchantSummary>) -> Self {
        Self {
            merchants,
            selected_merchant: None,
            candidates: Vec::new(),
            index: HashMap::new(),
            selection: HashSet::new(),
            state: BatchState::Idle,
            load_generation: 0,
            batch: None,
            last_load_error: None,
            last_failure: None,
            events: EventLog::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn merchants(&self) -> &[MerchantSummary] {
        &self.merchants
    }

    pub fn selected_merchant(&self) -> Option<&MerchantId> {
        self.selected_merchant.as_ref()
    }

    pub fn candidates(&self) -> &[TransactionCandidate] {
        &self.candidates
    }

    pub fn is_selected(&self, candidate_id: &CandidateId) -> bool {
        self.selection.contains(candidate_id)
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    /// Selected ids in candidate-list order
    pub fn selected_ids(&self) -> Vec<CandidateId> {
        self.candidates
            .iter()
            .filter(|c| self.selection.contains(c.id()))
            .map(|c| c.id().clone())
            .collect()
    }

    /// In-flight batch, or the most recently resolved one
    pub fn current_batch(&self) -> Option<&Batch> {
        self.batch.as_ref()
    }

    pub fn last_load_error(&self) -> Option<&FetchError> {
        self.last_load_error.as_ref()
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<LoggedEvent> {
        self.events.drain()
    }

    // ========================================================================
    // Merchant catalogue
    // ========================================================================

    /// Replace the known merchant list
    ///
    /// If the selected merchant is no longer listed, the workflow returns to
    /// `Idle`. While a submission is in flight this is deferred until the
    /// settlement result arrives.
    pub fn set_merchants(&mut self, merchants: Vec<MerchantSummary>) {
        self.merchants = merchants;
        self.events.log(Event::MerchantsUpdated {
            count: self.merchants.len(),
        });

        if self.state != BatchState::Submitting && self.drop_unlisted_merchant() {
            self.last_failure = None;
        }
    }

    /// Forget the selected merchant if the catalogue no longer lists it
    fn drop_unlisted_merchant(&mut self) -> bool {
        let Some(selected) = self.selected_merchant.clone() else {
            return false;
        };
        if self.is_known_merchant(&selected) {
            return false;
        }

        info!(merchant_id = %selected, "Selected merchant no longer listed, returning to idle");
        self.selected_merchant = None;
        self.clear_candidates();
        self.batch = None;
        // Any pending load response is now stale.
        self.load_generation += 1;
        self.state = BatchState::Idle;
        true
    }

    fn is_known_merchant(&self, merchant_id: &MerchantId) -> bool {
        self.merchants.iter().any(|m| &m.id == merchant_id)
    }

    // ========================================================================
    // Candidate loading
    // ========================================================================

    /// Start loading candidates for a merchant
    ///
    /// Switching merchants invalidates the selection immediately. Any
    /// response for an earlier ticket will be discarded.
    pub fn begin_load(&mut self, merchant_id: impl Into<MerchantId>) -> EngineResult<LoadTicket> {
        let merchant_id = merchant_id.into();

        if self.state == BatchState::Submitting {
            return self.reject("load_candidates", SelectionError::AlreadySubmitting);
        }
        if !self.is_known_merchant(&merchant_id) {
            return self.reject("load_candidates", SelectionError::InvalidMerchant(merchant_id));
        }

        self.load_generation += 1;
        self.selected_merchant = Some(merchant_id.clone());
        self.clear_candidates();
        self.batch = None;
        self.last_load_error = None;
        self.last_failure = None;
        self.state = BatchState::CandidatesLoading;

        debug!(merchant_id = %merchant_id, generation = self.load_generation, "Candidate load requested");
        self.events.log(Event::LoadRequested {
            merchant_id: merchant_id.clone(),
            generation: self.load_generation,
        });

        Ok(LoadTicket {
            merchant_id,
            generation: self.load_generation,
        })
    }

    /// Apply the response for a load request
    ///
    /// Stale responses return `Ok(LoadOutcome::Discarded)` and change
    /// nothing. A fetch failure recovers to `Ready` with no candidates and
    /// is then surfaced as `CandidateLoad`.
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Vec<TransactionCandidate>, FetchError>,
    ) -> EngineResult<LoadOutcome> {
        if ticket.generation != self.load_generation || self.state != BatchState::CandidatesLoading
        {
            debug!(
                merchant_id = %ticket.merchant_id,
                generation = ticket.generation,
                current_generation = self.load_generation,
                "Discarding stale candidate response"
            );
            self.events.log(Event::LoadDiscarded {
                merchant_id: ticket.merchant_id.clone(),
                generation: ticket.generation,
            });
            return Ok(LoadOutcome::Discarded);
        }

        match result {
            Ok(loaded) => {
                self.replace_candidates(&ticket.merchant_id, loaded);
                self.state = BatchState::Ready;

                info!(
                    merchant_id = %ticket.merchant_id,
                    count = self.candidates.len(),
                    "Candidates loaded"
                );
                self.events.log(Event::CandidatesLoaded {
                    merchant_id: ticket.merchant_id.clone(),
                    count: self.candidates.len(),
                });
                Ok(LoadOutcome::Applied {
                    count: self.candidates.len(),
                })
            }
            Err(error) => {
                self.clear_candidates();
                self.state = BatchState::Ready;
                self.last_load_error = Some(error.clone());

                warn!(merchant_id = %ticket.merchant_id, error = %error, "Candidate load failed");
                self.events.log(Event::LoadFailed {
                    merchant_id: ticket.merchant_id.clone(),
                    error: error.to_string(),
                });
                Err(SelectionError::CandidateLoad(error))
            }
        }
    }

    /// Load candidates already in hand (begin + complete in one step)
    pub fn load_candidates(
        &mut self,
        merchant_id: impl Into<MerchantId>,
        candidates: Vec<TransactionCandidate>,
    ) -> EngineResult<LoadOutcome> {
        let ticket = self.begin_load(merchant_id)?;
        self.complete_load(&ticket, Ok(candidates))
    }

    /// Install a fresh candidate list, dropping foreign and duplicate entries
    fn replace_candidates(&mut self, merchant_id: &MerchantId, loaded: Vec<TransactionCandidate>) {
        self.clear_candidates();
        self.candidates.reserve(loaded.len());

        for candidate in loaded {
            if candidate.merchant_id() != merchant_id {
                warn!(
                    merchant_id = %merchant_id,
                    candidate_id = %candidate.id(),
                    candidate_merchant = %candidate.merchant_id(),
                    "Dropping candidate belonging to another merchant"
                );
                continue;
            }
            if self.index.contains_key(candidate.id()) {
                warn!(candidate_id = %candidate.id(), "Dropping duplicate candidate id");
                continue;
            }
            self.index
                .insert(candidate.id().clone(), self.candidates.len());
            self.candidates.push(candidate);
        }
    }

    fn clear_candidates(&mut self) {
        self.candidates.clear();
        self.index.clear();
        self.selection.clear();
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Flip membership of a candidate in the selection
    ///
    /// Returns whether the candidate is selected afterwards.
    pub fn toggle_selection(&mut self, candidate_id: &CandidateId) -> EngineResult<bool> {
        if self.state == BatchState::Submitting {
            return self.reject("toggle_selection", SelectionError::AlreadySubmitting);
        }
        if !self.index.contains_key(candidate_id) {
            return self.reject(
                "toggle_selection",
                SelectionError::UnknownCandidate(candidate_id.clone()),
            );
        }

        let selected = if self.selection.remove(candidate_id) {
            false
        } else {
            self.selection.insert(candidate_id.clone());
            true
        };
        self.acknowledge_failure();

        self.events.log(Event::SelectionToggled {
            candidate_id: candidate_id.clone(),
            selected,
        });
        Ok(selected)
    }

    /// Select every loaded candidate
    pub fn select_all(&mut self) -> EngineResult<()> {
        if self.state == BatchState::Submitting {
            return self.reject("select_all", SelectionError::AlreadySubmitting);
        }
        self.selection = self.index.keys().cloned().collect();
        self.acknowledge_failure();
        self.events.log(Event::SelectionReplaced {
            count: self.selection.len(),
        });
        Ok(())
    }

    /// Deselect everything, keeping candidates
    pub fn clear_selection(&mut self) -> EngineResult<()> {
        if self.state == BatchState::Submitting {
            return self.reject("clear_selection", SelectionError::AlreadySubmitting);
        }
        self.selection.clear();
        self.acknowledge_failure();
        self.events.log(Event::SelectionReplaced { count: 0 });
        Ok(())
    }

    /// Editing the selection after a failed settlement re-enters `Ready`
    fn acknowledge_failure(&mut self) {
        if self.state == BatchState::Failed {
            self.state = BatchState::Ready;
            self.last_failure = None;
        }
    }

    // ========================================================================
    // Totals & gating
    // ========================================================================

    /// Totals over the current selection, O(|selection|)
    pub fn compute_totals(&self) -> Totals {
        Totals::sum(
            self.selection
                .iter()
                .filter_map(|id| self.index.get(id).map(|&i| &self.candidates[i])),
        )
    }

    /// The single gate for submission
    ///
    /// A `Failed` workflow keeps its selection and counts as ready, so the
    /// user can retry without re-selecting.
    pub fn can_submit(&self) -> bool {
        !self.selection.is_empty()
            && matches!(self.state, BatchState::Ready | BatchState::Failed)
            && self
                .selected_merchant
                .as_ref()
                .is_some_and(|merchant_id| self.is_known_merchant(merchant_id))
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Snapshot the selection into a batch and mark it in flight
    ///
    /// The caller hands the returned batch to the payments backend exactly
    /// once and reports the outcome through `on_settlement_result`.
    pub fn submit(&mut self) -> EngineResult<Batch> {
        if self.state == BatchState::Submitting {
            return self.reject("submit", SelectionError::AlreadySubmitting);
        }
        let merchant_id = match self.selected_merchant.clone() {
            Some(merchant_id) if self.can_submit() => merchant_id,
            _ => {
                let error = SelectionError::SubmitNotAllowed {
                    state: self.state,
                    selected: self.selection.len(),
                };
                return self.reject("submit", error);
            }
        };

        let batch = Batch::new(merchant_id, self.selected_ids(), self.compute_totals());
        self.state = BatchState::Submitting;
        self.last_failure = None;

        info!(
            batch_id = %batch.id(),
            merchant_id = %batch.merchant_id(),
            count = batch.totals().count,
            total_net = %batch.totals().total_net,
            "Submitting settlement batch"
        );
        self.events.log(Event::BatchSubmitted {
            batch_id: batch.id(),
            merchant_id: batch.merchant_id().clone(),
            count: batch.totals().count,
            total_net: batch.totals().total_net,
        });

        self.batch = Some(batch.clone());
        Ok(batch)
    }

    /// Apply the backend's verdict for the in-flight batch
    ///
    /// Success clears candidates and selection so a fresh load is required
    /// before the next batch. Failure keeps both for a manual retry.
    pub fn on_settlement_result(
        &mut self,
        batch_id: BatchId,
        outcome: SettlementOutcome,
    ) -> EngineResult<BatchState> {
        let expected = match self.batch.as_ref().map(Batch::id) {
            Some(id) if self.state == BatchState::Submitting => id,
            _ => return self.reject("on_settlement_result", SelectionError::NoBatchInFlight),
        };
        if expected != batch_id {
            return self.reject(
                "on_settlement_result",
                SelectionError::BatchMismatch {
                    expected,
                    received: batch_id,
                },
            );
        }

        if let Some(batch) = self.batch.as_mut() {
            batch.resolve(&outcome);
        }

        match outcome {
            SettlementOutcome::Settled => {
                self.clear_candidates();
                self.state = BatchState::Settled;
                info!(batch_id = %batch_id, "Batch settled");
                self.events.log(Event::BatchSettled { batch_id });
            }
            SettlementOutcome::Failed { reason } => {
                self.state = BatchState::Failed;
                warn!(batch_id = %batch_id, reason = %reason, "Batch settlement failed");
                self.events.log(Event::BatchFailed {
                    batch_id,
                    reason: reason.clone(),
                });
                self.last_failure = Some(reason);
            }
        }

        self.drop_unlisted_merchant();
        Ok(self.state)
    }

    /// Clear the selection and discard any non-in-flight batch
    pub fn reset(&mut self) -> EngineResult<()> {
        if self.state == BatchState::Submitting {
            return self.reject("reset", SelectionError::ResetWhileSubmitting);
        }

        self.selection.clear();
        self.batch = None;
        self.last_failure = None;
        self.state = match (self.state, &self.selected_merchant) {
            (BatchState::CandidatesLoading, _) => BatchState::CandidatesLoading,
            (_, None) => BatchState::Idle,
            (_, Some(_)) => BatchState::Ready,
        };

        debug!(state = %self.state, "Selection reset");
        self.events.log(Event::Reset);
        Ok(())
    }

    /// Serialisable projection for the UI layer
    pub fn view(&self) -> EngineView {
        EngineView {
            state: self.state,
            merchant_id: self.selected_merchant.clone(),
            candidate_count: self.candidates.len(),
            selected_ids: self.selected_ids(),
            totals: self.compute_totals(),
            can_submit: self.can_submit(),
            in_flight_batch: match (&self.batch, self.state) {
                (Some(batch), BatchState::Submitting) => Some(batch.id()),
                _ => None,
            },
            last_load_error: self.last_load_error.clone(),
            last_failure: self.last_failure.clone(),
        }
    }

    fn reject<T>(&mut self, operation: &str, error: SelectionError) -> EngineResult<T> {
        warn!(operation, state = %self.state, error = %error, "Operation rejected");
        self.events.log(Event::Rejected {
            operation: operation.to_string(),
            reason: error.to_string(),
        });
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merchant(id: &str) -> MerchantSummary {
        MerchantSummary {
            id: MerchantId::from(id),
            display_name: format!("Merchant {}", id),
            contact_name: "Ops".to_string(),
            available_transactions: 0,
            total_amount: 0,
        }
    }

    fn manager() -> SelectionManager {
        SelectionManager::new(vec![merchant("M-1"), merchant("M-2")])
    }

    fn candidates() -> Vec<TransactionCandidate> {
        vec![
            TransactionCandidate::new("1", "M-1", 110, 100),
            TransactionCandidate::new("2", "M-1", 260, 250),
        ]
    }

    #[test]
    fn test_new_manager_is_idle() {
        let manager = manager();
        assert_eq!(manager.state(), BatchState::Idle);
        assert!(manager.selected_merchant().is_none());
        assert!(!manager.can_submit());
    }

    #[test]
    fn test_replace_candidates_drops_foreign_and_duplicates() {
        let mut manager = manager();
        let loaded = vec![
            TransactionCandidate::new("1", "M-1", 10, 9),
            TransactionCandidate::new("1", "M-1", 99, 98),
            TransactionCandidate::new("x", "M-2", 10, 9),
            TransactionCandidate::new("2", "M-1", 20, 18),
        ];
        let outcome = manager.load_candidates("M-1", loaded).unwrap();
        assert_eq!(outcome, LoadOutcome::Applied { count: 2 });
        assert_eq!(manager.candidates()[0].gross_amount(), 10);
        assert_eq!(manager.candidates()[1].id().as_str(), "2");
    }

    #[test]
    fn test_rejected_call_logs_event_and_keeps_state() {
        let mut manager = manager();
        manager.load_candidates("M-1", candidates()).unwrap();
        manager.drain_events();

        let err = manager.toggle_selection(&CandidateId::from("nope")).unwrap_err();
        assert_eq!(err, SelectionError::UnknownCandidate(CandidateId::from("nope")));
        assert_eq!(manager.state(), BatchState::Ready);
        assert_eq!(manager.selection_len(), 0);
        assert_eq!(manager.events().events_of_type("Rejected").len(), 1);
    }

    #[test]
    fn test_toggle_after_failure_reenters_ready() {
        let mut manager = manager();
        manager.load_candidates("M-1", candidates()).unwrap();
        manager.toggle_selection(&CandidateId::from("1")).unwrap();
        let batch = manager.submit().unwrap();
        manager
            .on_settlement_result(batch.id(), SettlementOutcome::failed("declined"))
            .unwrap();
        assert_eq!(manager.state(), BatchState::Failed);
        assert_eq!(manager.last_failure(), Some("declined"));

        manager.toggle_selection(&CandidateId::from("2")).unwrap();
        assert_eq!(manager.state(), BatchState::Ready);
        assert!(manager.last_failure().is_none());
        assert_eq!(manager.selection_len(), 2);
    }

    #[test]
    fn test_set_merchants_drops_vanished_selection() {
        let mut manager = manager();
        manager.load_candidates("M-1", candidates()).unwrap();
        manager.toggle_selection(&CandidateId::from("1")).unwrap();

        manager.set_merchants(vec![merchant("M-2")]);
        assert_eq!(manager.state(), BatchState::Idle);
        assert!(manager.selected_merchant().is_none());
        assert!(manager.candidates().is_empty());
        assert_eq!(manager.selection_len(), 0);
    }

    #[test]
    fn test_set_merchants_keeps_in_flight_batch() {
        let mut manager = manager();
        manager.load_candidates("M-1", candidates()).unwrap();
        manager.toggle_selection(&CandidateId::from("1")).unwrap();
        let batch = manager.submit().unwrap();

        manager.set_merchants(vec![merchant("M-2")]);
        assert_eq!(manager.state(), BatchState::Submitting);
        assert_eq!(manager.selected_merchant(), Some(&MerchantId::from("M-1")));

        // Delisting applies once the outcome is known
        assert_eq!(
            manager.on_settlement_result(batch.id(), SettlementOutcome::Settled),
            Ok(BatchState::Idle)
        );
        assert!(manager.selected_merchant().is_none());
        assert_eq!(manager.events().events_of_type("BatchSettled").len(), 1);
    }

    #[test]
    fn test_set_merchants_invalidates_pending_load() {
        let mut manager = manager();
        let ticket = manager.begin_load("M-1").unwrap();
        manager.set_merchants(vec![merchant("M-2")]);

        let outcome = manager.complete_load(&ticket, Ok(candidates())).unwrap();
        assert_eq!(outcome, LoadOutcome::Discarded);
        assert_eq!(manager.state(), BatchState::Idle);
    }

    #[test]
    fn test_view_reflects_in_flight_batch() {
        let mut manager = manager();
        manager.load_candidates("M-1", candidates()).unwrap();
        manager.select_all().unwrap();
        let batch = manager.submit().unwrap();

        let view = manager.view();
        assert_eq!(view.state, BatchState::Submitting);
        assert_eq!(view.in_flight_batch, Some(batch.id()));
        assert!(!view.can_submit);
        assert_eq!(view.totals.total_net, 350);
        assert_eq!(
            view.selected_ids,
            vec![CandidateId::from("1"), CandidateId::from("2")]
        );
    }
}
