//! Urgency tiers for expiry countdowns
//!
//! The caller supplies `days_left`; these functions never consult a clock.

use crate::config::UrgencyThresholds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// Presentation severity for an upcoming expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UrgencyTier {
    Critical,
    Warning,
    Notice,
}

impl UrgencyTier {
    /// Critical notices can only be acknowledged through the primary action
    pub fn offers_dismiss(self) -> bool {
        self != UrgencyTier::Critical
    }
}

/// Classify remaining days: Critical (<= 3), Warning (<= 7), Notice (> 7)
///
/// # Example
/// ```
/// use settlement_batch_engine::{urgency_tier, UrgencyTier};
///
/// assert_eq!(urgency_tier(3), UrgencyTier::Critical);
/// assert_eq!(urgency_tier(7), UrgencyTier::Warning);
/// assert_eq!(urgency_tier(8), UrgencyTier::Notice);
/// ```
pub fn urgency_tier(days_left: i64) -> UrgencyTier {
    UrgencyThresholds::default().tier(days_left)
}

/// Whole days from `now` until `expiry`, partial days rounded up
///
/// Zero once the expiry instant is reached, negative a full day later.
pub fn days_left(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (expiry - now).num_seconds();
    let days = seconds.div_euclid(SECONDS_PER_DAY);
    if seconds.rem_euclid(SECONDS_PER_DAY) > 0 {
        days + 1
    } else {
        days
    }
}

/// Countdown banner state, e.g. for password expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryNotice {
    pub days_left: i64,
    pub tier: UrgencyTier,
    pub dismissible: bool,
}

impl ExpiryNotice {
    pub fn new(days_left: i64, thresholds: &UrgencyThresholds) -> Self {
        let tier = thresholds.tier(days_left);
        Self {
            days_left,
            tier,
            dismissible: tier.offers_dismiss(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_tier_edges() {
        assert_eq!(urgency_tier(-5), UrgencyTier::Critical);
        assert_eq!(urgency_tier(0), UrgencyTier::Critical);
        assert_eq!(urgency_tier(4), UrgencyTier::Warning);
        assert_eq!(urgency_tier(30), UrgencyTier::Notice);
    }

    #[test]
    fn test_days_left_rounding() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(days_left(now, now), 0);
        assert_eq!(days_left(now + Duration::hours(1), now), 1);
        assert_eq!(days_left(now + Duration::days(3), now), 3);
        assert_eq!(days_left(now + Duration::days(3) + Duration::seconds(1), now), 4);
        assert_eq!(days_left(now - Duration::hours(1), now), 0);
        assert_eq!(days_left(now - Duration::days(1), now), -1);
    }

    #[test]
    fn test_notice_dismissal() {
        let thresholds = UrgencyThresholds::default();
        assert!(!ExpiryNotice::new(2, &thresholds).dismissible);
        assert!(ExpiryNotice::new(5, &thresholds).dismissible);
        assert_eq!(ExpiryNotice::new(10, &thresholds).tier, UrgencyTier::Notice);
    }
}
