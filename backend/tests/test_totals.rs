//! Totals Property Tests
//!
//! Totals must always equal the exact sum over the current selection, with
//! no double counting and no stale entries after a reload.
//! CRITICAL: Candidate amounts are i64 (minor units), totals are i128

use proptest::prelude::*;
use settlement_batch_engine::{
    CandidateId, MerchantId, MerchantSummary, SelectionManager, Totals, TransactionCandidate,
};
use std::collections::HashSet;

fn create_manager() -> SelectionManager {
    SelectionManager::new(vec![MerchantSummary {
        id: MerchantId::from("M-1"),
        display_name: "Acme".to_string(),
        contact_name: "Ops".to_string(),
        available_transactions: 0,
        total_amount: 0,
    }])
}

/// Candidates with unique ids "0".."n" and net <= gross
fn candidates_strategy() -> impl Strategy<Value = Vec<TransactionCandidate>> {
    prop::collection::vec((0i64..10_000_000, 0i64..100_000), 0..40).prop_map(|amounts| {
        amounts
            .into_iter()
            .enumerate()
            .map(|(i, (gross, fee))| {
                TransactionCandidate::new(i.to_string(), "M-1", gross, gross - fee.min(gross))
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn totals_match_exact_sum_over_selection(
        candidates in candidates_strategy(),
        toggles in prop::collection::vec(0usize..40, 0..80),
    ) {
        let mut manager = create_manager();
        manager.load_candidates("M-1", candidates.clone()).unwrap();

        // Model selection as a plain set of flips
        let mut expected: HashSet<usize> = HashSet::new();
        for t in toggles {
            if t >= candidates.len() {
                prop_assert!(manager.toggle_selection(&CandidateId::from(t.to_string())).is_err());
                continue;
            }
            manager.toggle_selection(&CandidateId::from(t.to_string())).unwrap();
            if !expected.remove(&t) {
                expected.insert(t);
            }
        }

        let totals = manager.compute_totals();
        prop_assert_eq!(totals.count, manager.selection_len());
        prop_assert_eq!(totals.count, expected.len());
        prop_assert_eq!(
            totals.total_gross,
            expected.iter().map(|&i| i128::from(candidates[i].gross_amount())).sum::<i128>()
        );
        prop_assert_eq!(
            totals.total_net,
            expected.iter().map(|&i| i128::from(candidates[i].net_amount())).sum::<i128>()
        );
        prop_assert_eq!(manager.can_submit(), !expected.is_empty());
    }

    #[test]
    fn double_toggle_is_identity(
        candidates in candidates_strategy(),
        pick in 0usize..40,
    ) {
        prop_assume!(pick < candidates.len());
        let mut manager = create_manager();
        manager.load_candidates("M-1", candidates).unwrap();
        let id = CandidateId::from(pick.to_string());

        let before = manager.compute_totals();
        manager.toggle_selection(&id).unwrap();
        manager.toggle_selection(&id).unwrap();
        prop_assert_eq!(manager.compute_totals(), before);
        prop_assert!(!manager.is_selected(&id));
    }

    #[test]
    fn reload_leaves_no_stale_totals(
        first in candidates_strategy(),
        second in candidates_strategy(),
    ) {
        let mut manager = create_manager();
        manager.load_candidates("M-1", first).unwrap();
        manager.select_all().unwrap();

        manager.load_candidates("M-1", second).unwrap();
        prop_assert_eq!(manager.compute_totals(), Totals::default());
        prop_assert!(!manager.can_submit());
    }

    #[test]
    fn select_all_matches_sum_over_candidates(candidates in candidates_strategy()) {
        let mut manager = create_manager();
        manager.load_candidates("M-1", candidates.clone()).unwrap();
        manager.select_all().unwrap();

        prop_assert_eq!(manager.compute_totals(), Totals::sum(candidates.iter()));
    }
}

#[test]
fn test_totals_exact_past_i64_range() {
    let mut manager = create_manager();
    manager
        .load_candidates(
            "M-1",
            vec![
                TransactionCandidate::new("big", "M-1", i64::MAX, i64::MAX),
                TransactionCandidate::new("one", "M-1", 1, 1),
            ],
        )
        .unwrap();
    manager.select_all().unwrap();

    let totals = manager.compute_totals();
    assert_eq!(totals.count, 2);
    assert_eq!(totals.total_gross, i128::from(i64::MAX) + 1);
    assert_eq!(totals.total_net, i128::from(i64::MAX) + 1);
    assert_eq!(totals.total_deductions(), 0);
    assert!(manager.can_submit());
}

#[test]
fn test_totals_deductions() {
    let candidates = [
        TransactionCandidate::new("1", "M-1", 10_000, 9_850),
        TransactionCandidate::new("2", "M-1", 20_000, 19_700),
    ];
    let totals = Totals::sum(candidates.iter());
    assert_eq!(totals.total_deductions(), 450);
}
