//! Expiration oracle: "when does this domain's registration expire".

mod parser;
mod servers;
mod whois;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use domexp_core::error::Result;

pub use parser::{extract_referral, parse_expiration};
pub use servers::{get_tld, get_whois_server};
pub use whois::WhoisOracle;

/// Single-domain expiration lookup against an external source.
#[async_trait]
pub trait ExpirationOracle: Send + Sync {
    /// `Ok(None)` when the source answered without a usable expiry date.
    /// `Err(OracleParse)` when the answer could not be obtained or understood.
    async fn expiration_date(&self, domain: &str) -> Result<Option<DateTime<Utc>>>;
}

/// Why a WHOIS answer was unusable. Carried as the source of `OracleParse`.
#[derive(Debug, Error)]
pub enum WhoisError {
    #[error("domain whois data is empty")]
    Empty,
    #[error("domain is not found")]
    NotFound,
    #[error("domain query limit exceeded")]
    RateLimited,
    #[error("invalid domain: {0}")]
    InvalidDomain(String),
    #[error("connection to {server} failed: {reason}")]
    Connect { server: String, reason: String },
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("response too large")]
    TooLarge,
}
