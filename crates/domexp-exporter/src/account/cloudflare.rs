//! Cloudflare zones API: every zone under a token is a tracked domain.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use domexp_core::error::{ExpiryError, Result};

use super::{credential_key, obfuscate, AccountClient};

pub const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
const MAX_PAGE_SIZE_ZONES: u32 = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct CloudflareResponse<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<CloudflareError>,
    result_info: Option<CloudflareResultInfo>,
}

#[derive(Debug, Deserialize)]
struct CloudflareError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CloudflareResultInfo {
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct CloudflareZone {
    name: String,
}

pub struct CloudflareAccount {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    obfuscated: String,
    key: String,
}

impl CloudflareAccount {
    /// Build a client and verify the token by listing zones once.
    pub async fn connect(api_token: &str) -> Result<Self> {
        Self::connect_with_base(api_token, CF_API_BASE).await
    }

    pub async fn connect_with_base(api_token: &str, base_url: &str) -> Result<Self> {
        let account = Self::new(api_token, base_url)?;
        let domains = account.list_domains().await.map_err(|e| ExpiryError::InvalidCredential {
            account: account.obfuscated.clone(),
            reason: e.to_string(),
        })?;
        info!(account = %account.obfuscated, zones = domains.len(), "account verified");
        Ok(account)
    }

    /// Build without the capability check.
    pub fn new(api_token: &str, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExpiryError::Internal(format!("http client build failed: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            obfuscated: obfuscate(api_token),
            key: credential_key(api_token),
        })
    }

    fn listing_error(&self, reason: impl Into<String>) -> ExpiryError {
        ExpiryError::Listing {
            account: self.obfuscated.clone(),
            reason: reason.into(),
        }
    }

    async fn zones_page(&self, page: u32) -> Result<(Vec<CloudflareZone>, u32)> {
        let url = format!(
            "{}/zones?page={}&per_page={}",
            self.base_url, page, MAX_PAGE_SIZE_ZONES
        );
        debug!(account = %self.obfuscated, page, "GET zones");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| self.listing_error(format!("request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.listing_error(format!("read body failed: {e}")))?;

        let cf: CloudflareResponse<Vec<CloudflareZone>> = serde_json::from_str(&text)
            .map_err(|e| self.listing_error(format!("invalid response (status {status}): {e}")))?;

        if !cf.success {
            let message = cf
                .errors
                .first()
                .map(|e| format!("{} (code {})", e.message, e.code))
                .unwrap_or_else(|| format!("unknown error (status {status})"));
            return Err(self.listing_error(message));
        }

        let total_pages = cf.result_info.map_or(1, |i| i.total_pages);
        Ok((cf.result.unwrap_or_default(), total_pages))
    }
}

#[async_trait]
impl AccountClient for CloudflareAccount {
    async fn list_domains(&self) -> Result<Vec<String>> {
        let mut domains = Vec::new();
        let mut page = 1;
        loop {
            let (zones, total_pages) = self.zones_page(page).await?;
            domains.extend(zones.into_iter().map(|z| z.name));
            if page >= total_pages {
                break;
            }
            page += 1;
        }
        Ok(domains)
    }

    fn obfuscated_id(&self) -> &str {
        &self.obfuscated
    }

    fn account_key(&self) -> &str {
        &self.key
    }
}
