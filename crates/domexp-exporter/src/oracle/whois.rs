use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use domexp_core::error::{ExpiryError, Result};

use super::parser::{extract_referral, parse_expiration};
use super::servers::{get_tld, get_whois_server, IANA_WHOIS};
use super::{ExpirationOracle, WhoisError};

const WHOIS_PORT: u16 = 43;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RESPONSE_SIZE: usize = 1024 * 1024; // 1MB
const MAX_QUERIES: usize = 3;

/// WHOIS over TCP/43 with referral following.
#[derive(Debug, Clone)]
pub struct WhoisOracle {
    timeout: Duration,
    server: Option<String>,
}

impl Default for WhoisOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl WhoisOracle {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            server: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Always start at this server (`host` or `host:port`) instead of the TLD table.
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Raw answers, most specific server first.
    #[instrument(skip(self), fields(domain = %domain))]
    pub async fn lookup_raw(&self, domain: &str) -> std::result::Result<String, WhoisError> {
        let domain = normalize_domain(domain)?;
        let first = match &self.server {
            Some(s) => s.clone(),
            None => {
                let tld = get_tld(&domain).ok_or_else(|| WhoisError::InvalidDomain(domain.clone()))?;
                get_whois_server(tld).unwrap_or(IANA_WHOIS).to_string()
            }
        };

        let mut answers: Vec<String> = Vec::new();
        let mut visited = HashSet::new();
        let mut server = first;

        while answers.len() < MAX_QUERIES {
            visited.insert(server.to_lowercase());
            debug!(whois_server = %server, "querying whois server");

            let raw = match self.query_server(&server, &domain).await {
                Ok(raw) => raw,
                // A failed referral still leaves the registry answer usable.
                Err(e) if !answers.is_empty() => {
                    warn!(whois_server = %server, error = %e, "whois referral failed");
                    break;
                }
                Err(e) => return Err(e),
            };

            let referral = extract_referral(&raw);
            answers.push(raw);

            match referral {
                Some(next) if !visited.contains(&next) => server = next,
                _ => break,
            }
        }

        answers.reverse();
        Ok(answers.join("\n"))
    }

    async fn query_server(&self, server: &str, query: &str) -> std::result::Result<String, WhoisError> {
        let addr = if server.contains(':') {
            server.to_string()
        } else {
            format!("{server}:{WHOIS_PORT}")
        };

        let mut stream = timeout(self.timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| WhoisError::Timeout(format!("connection to {server} timed out")))?
            .map_err(|e| WhoisError::Connect {
                server: server.to_string(),
                reason: e.to_string(),
            })?;

        timeout(self.timeout, stream.write_all(format!("{query}\r\n").as_bytes()))
            .await
            .map_err(|_| WhoisError::Timeout("write timed out".to_string()))?
            .map_err(|e| WhoisError::Connect {
                server: server.to_string(),
                reason: format!("send failed: {e}"),
            })?;

        let mut response = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match timeout(self.timeout, stream.read(&mut buf)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => {
                    response.extend_from_slice(&buf[..n]);
                    if response.len() > MAX_RESPONSE_SIZE {
                        return Err(WhoisError::TooLarge);
                    }
                }
                Ok(Err(e)) => {
                    return Err(WhoisError::Connect {
                        server: server.to_string(),
                        reason: format!("read failed: {e}"),
                    })
                }
                Err(_) if !response.is_empty() => break,
                Err(_) => return Err(WhoisError::Timeout("read timed out".to_string())),
            }
        }

        // UTF-8, falling back to Latin-1
        Ok(match String::from_utf8(response) {
            Ok(s) => s,
            Err(e) => e.into_bytes().iter().map(|&c| c as char).collect(),
        })
    }
}

#[async_trait]
impl ExpirationOracle for WhoisOracle {
    async fn expiration_date(&self, domain: &str) -> Result<Option<DateTime<Utc>>> {
        let raw = self
            .lookup_raw(domain)
            .await
            .map_err(|e| ExpiryError::oracle_parse(domain, e))?;
        parse_expiration(&raw).map_err(|e| ExpiryError::oracle_parse(domain, e))
    }
}

fn normalize_domain(domain: &str) -> std::result::Result<String, WhoisError> {
    let domain = domain.trim().trim_end_matches('.').to_lowercase();
    if domain.is_empty() || !domain.contains('.') {
        return Err(WhoisError::InvalidDomain(domain));
    }
    let valid = domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !valid {
        return Err(WhoisError::InvalidDomain(domain));
    }
    Ok(domain)
}
