//! Selection totals and amount formatting
//!
//! Totals are derived, never stored: the selection manager recomputes them
//! from the selection set and candidate list on every call, so they cannot
//! drift from their inputs.
//!
//! CRITICAL: Candidate amounts are i64 (minor units). Sums are accumulated
//! in i128, which cannot overflow for any number of i64 addends that fits
//! in memory.

use crate::config::{AmountFormat, MAX_DECIMAL_PLACES};
use crate::models::TransactionCandidate;
use serde::{Deserialize, Serialize};

/// Aggregate over a set of selected candidates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub count: usize,

    /// Sum of gross amounts (minor units)
    pub total_gross: i128,

    /// Sum of net amounts (minor units)
    pub total_net: i128,
}

impl Totals {
    /// Sum the given candidates
    ///
    /// # Example
    /// ```
    /// use settlement_batch_engine::{Totals, TransactionCandidate};
    ///
    /// let candidates = vec![
    ///     TransactionCandidate::new("1", "M-1", 120, 100),
    ///     TransactionCandidate::new("2", "M-1", 300, 250),
    /// ];
    /// let totals = Totals::sum(candidates.iter());
    /// assert_eq!(totals.count, 2);
    /// assert_eq!(totals.total_net, 350);
    /// ```
    pub fn sum<'a>(candidates: impl IntoIterator<Item = &'a TransactionCandidate>) -> Self {
        candidates
            .into_iter()
            .fold(Totals::default(), |mut acc, candidate| {
                acc.count += 1;
                acc.total_gross += i128::from(candidate.gross_amount());
                acc.total_net += i128::from(candidate.net_amount());
                acc
            })
    }

    /// Gross minus net across the selection
    pub fn total_deductions(&self) -> i128 {
        self.total_gross - self.total_net
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Render all amounts with the given format
    pub fn formatted(&self, format: &AmountFormat) -> FormattedTotals {
        FormattedTotals {
            count: self.count,
            total_gross: format_amount(self.total_gross, format),
            total_net: format_amount(self.total_net, format),
            total_deductions: format_amount(self.total_deductions(), format),
        }
    }
}

/// Display-ready totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedTotals {
    pub count: usize,
    pub total_gross: String,
    pub total_net: String,
    pub total_deductions: String,
}

/// Render a minor-unit amount as a grouped, fixed-decimal string
///
/// `decimal_places` above `MAX_DECIMAL_PLACES` is clamped.
///
/// # Example
/// ```
/// use settlement_batch_engine::{format_amount, AmountFormat};
///
/// let format = AmountFormat::default();
/// assert_eq!(format_amount(123_456_789, &format), "1,234,567.89");
/// assert_eq!(format_amount(-5, &format), "-0.05");
/// ```
pub fn format_amount(minor_units: impl Into<i128>, format: &AmountFormat) -> String {
    let minor_units: i128 = minor_units.into();
    let decimal_places = format.decimal_places.min(MAX_DECIMAL_PLACES);
    let divisor = 10u128.pow(decimal_places);
    let magnitude = minor_units.unsigned_abs();
    let whole = magnitude / divisor;
    let fraction = magnitude % divisor;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(&format.group_separator);
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if minor_units < 0 {
        out.push('-');
    }
    out.push_str(&format.symbol);
    out.push_str(&grouped);
    if decimal_places > 0 {
        out.push('.');
        out.push_str(&format!(
            "{:0width$}",
            fraction,
            width = decimal_places as usize
        ));
    }
    out
}
