//! Check results and expiration arithmetic.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// Domain name -> absolute expiration, loaded once from the override file.
pub type ManualExpirations = HashMap<String, DateTime<Utc>>;

/// Merged view of all accounts' results.
pub type Snapshot = HashMap<String, CheckResult>;

/// Whether an expiration could be determined for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckStatus {
    Ok,
    Unknown,
}

impl CheckStatus {
    /// Label value used in the metrics feed.
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Ok => "ok",
            CheckStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one domain check. Replaced wholesale on the next check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    pub expires_in_days: i64,
    pub status: CheckStatus,
}

impl CheckResult {
    /// Classify a computed day count. Exactly zero is the "no answer"
    /// sentinel and is reported as unknown, even for a domain expiring today.
    pub fn from_days(expires_in_days: i64) -> Self {
        let status = if expires_in_days == 0 {
            CheckStatus::Unknown
        } else {
            CheckStatus::Ok
        };
        Self {
            expires_in_days,
            status,
        }
    }
}

/// A resolved expiration for one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiration {
    pub days: i64,
    pub expires_at: DateTime<Utc>,
}

impl Expiration {
    pub fn at(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            days: days_until(expires_at, now),
            expires_at,
        }
    }
}

/// Whole 24h days between `now` and `expires_at`, truncated toward zero.
/// Negative once the domain has expired.
pub fn days_until(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expires_at - now).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().unwrap_or_default()
    }

    #[test]
    fn whole_days_in_future() {
        let exp = now() + Duration::days(10) + Duration::hours(5);
        assert_eq!(days_until(exp, now()), 10);
    }

    #[test]
    fn partial_day_truncates_to_zero() {
        let exp = now() + Duration::hours(23);
        assert_eq!(days_until(exp, now()), 0);
        let past = now() - Duration::hours(23);
        assert_eq!(days_until(past, now()), 0);
    }

    #[test]
    fn expired_is_negative_and_truncates_toward_zero() {
        let exp = now() - Duration::days(3) - Duration::hours(6);
        assert_eq!(days_until(exp, now()), -3);
    }

    #[test]
    fn zero_days_is_unknown() {
        assert_eq!(CheckResult::from_days(0).status, CheckStatus::Unknown);
        assert_eq!(CheckResult::from_days(42).status, CheckStatus::Ok);
        assert_eq!(CheckResult::from_days(-2).status, CheckStatus::Ok);
    }

    #[test]
    fn status_labels() {
        assert_eq!(CheckStatus::Ok.to_string(), "ok");
        assert_eq!(CheckStatus::Unknown.as_str(), "unknown");
    }
}
