//! Oracle adapter: days until expiration, with the manual table as fallback.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use domexp_core::error::{ExpiryError, Result};
use domexp_core::{Expiration, ManualExpirations};

use crate::oracle::ExpirationOracle;

/// Days-until-expiration capability consumed by the checker.
#[async_trait]
pub trait ExpirationLookup: Send + Sync {
    async fn days_till_expiration(&self, domain: &str) -> Result<Expiration>;
}

pub struct ExpirationService {
    oracle: Arc<dyn ExpirationOracle>,
    manual: ManualExpirations,
}

impl ExpirationService {
    pub fn new(oracle: Arc<dyn ExpirationOracle>, manual: ManualExpirations) -> Self {
        Self { oracle, manual }
    }
}

#[async_trait]
impl ExpirationLookup for ExpirationService {
    async fn days_till_expiration(&self, domain: &str) -> Result<Expiration> {
        let answer = self.oracle.expiration_date(domain).await?;
        // Measured after the lookup, which may take several round trips.
        let now = Utc::now();
        if let Some(expires_at) = answer {
            return Ok(Expiration::at(expires_at, now));
        }

        match self.manual.get(domain) {
            Some(&expires_at) => {
                debug!(%domain, %expires_at, "using manual expiration");
                Ok(Expiration::at(expires_at, now))
            }
            None => Err(ExpiryError::ExpirationUnavailable(domain.to_string())),
        }
    }
}
