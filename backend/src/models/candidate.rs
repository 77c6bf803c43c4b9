//! Candidate model
//!
//! A transaction candidate is a merchant transaction eligible for inclusion
//! in a settlement batch. Presence in a loaded candidate list is what makes
//! it eligible; there is no separate flag.
//!
//! CRITICAL: All money values are i64 (minor units)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Merchant identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantId(String);

impl MerchantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MerchantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MerchantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MerchantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Candidate identifier, unique within one merchant's candidate set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CandidateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A settlement-eligible merchant transaction
///
/// Immutable once loaded.
///
/// # Example
/// ```
/// use settlement_batch_engine::TransactionCandidate;
///
/// let candidate = TransactionCandidate::new("tx-1", "M-001", 10_000, 9_750);
/// assert_eq!(candidate.deductions(), 250);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCandidate {
    id: CandidateId,
    merchant_id: MerchantId,

    /// Gross amount (i64 minor units)
    gross_amount: i64,

    /// Net amount after deductions (i64 minor units)
    net_amount: i64,
}

impl TransactionCandidate {
    pub fn new(
        id: impl Into<CandidateId>,
        merchant_id: impl Into<MerchantId>,
        gross_amount: i64,
        net_amount: i64,
    ) -> Self {
        Self {
            id: id.into(),
            merchant_id: merchant_id.into(),
            gross_amount,
            net_amount,
        }
    }

    pub fn id(&self) -> &CandidateId {
        &self.id
    }

    pub fn merchant_id(&self) -> &MerchantId {
        &self.merchant_id
    }

    pub fn gross_amount(&self) -> i64 {
        self.gross_amount
    }

    pub fn net_amount(&self) -> i64 {
        self.net_amount
    }

    /// Fees and other deductions taken between gross and net
    pub fn deductions(&self) -> i128 {
        i128::from(self.gross_amount) - i128::from(self.net_amount)
    }
}

/// Read-only merchant projection used to populate a selection menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantSummary {
    pub id: MerchantId,
    pub display_name: String,
    pub contact_name: String,
    pub available_transactions: usize,

    /// Total amount available for settlement (i64 minor units)
    pub total_amount: i64,
}

impl MerchantSummary {
    /// Menu label, e.g. `"Acme Stores (Jane Doe) - 12 transactions"`
    pub fn label(&self) -> String {
        let noun = if self.available_transactions == 1 {
            "transaction"
        } else {
            "transactions"
        };
        format!(
            "{} ({}) - {} {}",
            self.display_name, self.contact_name, self.available_transactions, noun
        )
    }
}
