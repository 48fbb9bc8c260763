//! Shared error type across domexp crates.

use thiserror::Error;

/// Stable error kinds (used as log keys and for startup decisions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credential rejected by the account API at startup.
    InvalidCredential,
    /// Manual expiration file could not be read or parsed.
    OverrideLoad,
    /// Process configuration is invalid.
    Config,
    /// Domain listing failed for one account during a cycle.
    Listing,
    /// Neither the oracle nor the manual table knows the expiration.
    ExpirationUnavailable,
    /// The oracle answer could not be understood.
    OracleParse,
    /// Internal error.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidCredential => "INVALID_CREDENTIAL",
            ErrorKind::OverrideLoad => "OVERRIDE_LOAD",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Listing => "LISTING",
            ErrorKind::ExpirationUnavailable => "EXPIRATION_UNAVAILABLE",
            ErrorKind::OracleParse => "ORACLE_PARSE",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    /// Startup-only kinds abort the process; everything else is recovered
    /// inside the check cycle.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidCredential | ErrorKind::OverrideLoad | ErrorKind::Config
        )
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ExpiryError>;

/// Boxed underlying cause carried by [`ExpiryError::OracleParse`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum ExpiryError {
    #[error("invalid credential (account={account}): {reason}")]
    InvalidCredential { account: String, reason: String },
    #[error("manual expirations load failed: {0}")]
    OverrideLoad(String),
    #[error("config: {0}")]
    Config(String),
    #[error("domain listing failed (account={account}): {reason}")]
    Listing { account: String, reason: String },
    #[error("failed to get expiration date for domain {0}")]
    ExpirationUnavailable(String),
    #[error("failed to parse whois information for domain {domain}: {source}")]
    OracleParse {
        domain: String,
        #[source]
        source: BoxError,
    },
    #[error("internal: {0}")]
    Internal(String),
}

impl ExpiryError {
    /// Wrap an oracle failure for `domain`.
    pub fn oracle_parse(domain: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ExpiryError::OracleParse {
            domain: domain.into(),
            source: source.into(),
        }
    }

    /// Map to a stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExpiryError::InvalidCredential { .. } => ErrorKind::InvalidCredential,
            ExpiryError::OverrideLoad(_) => ErrorKind::OverrideLoad,
            ExpiryError::Config(_) => ErrorKind::Config,
            ExpiryError::Listing { .. } => ErrorKind::Listing,
            ExpiryError::ExpirationUnavailable(_) => ErrorKind::ExpirationUnavailable,
            ExpiryError::OracleParse { .. } => ErrorKind::OracleParse,
            ExpiryError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn fatal_kinds_are_startup_only() {
        assert!(ErrorKind::InvalidCredential.is_fatal());
        assert!(ErrorKind::OverrideLoad.is_fatal());
        assert!(ErrorKind::Config.is_fatal());
        assert!(!ErrorKind::Listing.is_fatal());
        assert!(!ErrorKind::ExpirationUnavailable.is_fatal());
        assert!(!ErrorKind::OracleParse.is_fatal());
    }

    #[test]
    fn oracle_parse_keeps_cause() {
        let err = ExpiryError::oracle_parse("example.com", "empty whois response");
        assert_eq!(err.kind().as_str(), "ORACLE_PARSE");
        assert!(err.to_string().contains("example.com"));
        let cause = err.source().map(|s| s.to_string());
        assert_eq!(cause.as_deref(), Some("empty whois response"));
    }
}
