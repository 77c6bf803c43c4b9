//! Effective/expiry window status
//!
//! Both bounds are inclusive: a record is `Active` at the exact instant it
//! becomes effective, and stays `Active` at the exact instant it expires.
//! Expiry takes effect strictly after the named instant.

use crate::models::MerchantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a dated record relative to "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemporalStatus {
    Upcoming,
    Active,
    Expired,
}

impl TemporalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TemporalStatus::Upcoming => "upcoming",
            TemporalStatus::Active => "active",
            TemporalStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for TemporalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a record's status at `now`
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use settlement_batch_engine::{resolve_status, TemporalStatus};
///
/// let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
/// assert_eq!(resolve_status(now, None, now), TemporalStatus::Active);
/// assert_eq!(
///     resolve_status(now + Duration::days(1), None, now),
///     TemporalStatus::Upcoming
/// );
/// assert_eq!(
///     resolve_status(now - Duration::days(1), Some(now), now),
///     TemporalStatus::Active
/// );
/// ```
pub fn resolve_status(
    effective_date: DateTime<Utc>,
    expiry_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> TemporalStatus {
    if now < effective_date {
        return TemporalStatus::Upcoming;
    }
    match expiry_date {
        Some(expiry) if now > expiry => TemporalStatus::Expired,
        _ => TemporalStatus::Active,
    }
}

/// Any entity whose validity is bounded by an effective date and an
/// optional expiry date
pub trait DatedRecord {
    fn effective_date(&self) -> DateTime<Utc>;

    fn expiry_date(&self) -> Option<DateTime<Utc>>;

    fn status_at(&self, now: DateTime<Utc>) -> TemporalStatus {
        resolve_status(self.effective_date(), self.expiry_date(), now)
    }
}

/// Assignment of a pricing scheme to a merchant for a time window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeAssignment {
    pub scheme_id: String,
    pub scheme_name: String,
    pub merchant_id: MerchantId,
    pub effective_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl DatedRecord for SchemeAssignment {
    fn effective_date(&self) -> DateTime<Utc> {
        self.effective_date
    }

    fn expiry_date(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
    }
}

/// Sort ascending by effective date; ties keep input order
pub fn sort_for_display<R: DatedRecord>(records: &mut [R]) {
    records.sort_by_key(|record| record.effective_date());
}

/// Pair each record with its status, in display order
pub fn resolve_all<R: DatedRecord>(records: &[R], now: DateTime<Utc>) -> Vec<(&R, TemporalStatus)> {
    let mut ordered: Vec<&R> = records.iter().collect();
    ordered.sort_by_key(|record| record.effective_date());
    ordered
        .into_iter()
        .map(|record| (record, record.status_at(now)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let now = now();
        assert_eq!(resolve_status(now, Some(now), now), TemporalStatus::Active);
        assert_eq!(
            resolve_status(now, Some(now - Duration::seconds(1)), now),
            TemporalStatus::Expired
        );
        assert_eq!(
            resolve_status(now + Duration::seconds(1), None, now),
            TemporalStatus::Upcoming
        );
    }

    #[test]
    fn test_upcoming_wins_over_expiry() {
        // Inverted window: not yet effective is reported first.
        let now = now();
        assert_eq!(
            resolve_status(now + Duration::days(2), Some(now - Duration::days(2)), now),
            TemporalStatus::Upcoming
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TemporalStatus::Expired.to_string(), "expired");
    }
}
