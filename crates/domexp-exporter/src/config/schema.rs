use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use domexp_core::error::{ExpiryError, Result};
use serde::Deserialize;

use crate::checker::ExhaustedPolicy;

/// Shape of the manual override file. Entries under `domains` are strictly
/// typed; other top-level keys are collected so the loader can report them.
#[derive(Debug, Deserialize)]
pub struct ManualExpirationFile {
    #[serde(default)]
    pub domains: HashMap<String, DateTime<Utc>>,
    #[serde(flatten)]
    pub ignored: HashMap<String, serde_yaml::Value>,
}

/// Process settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub api_keys: Vec<String>,
    pub listen: String,
    pub check_interval_secs: u64,
    pub manual_expiration_file: String,
    pub on_lookup_exhausted: ExhaustedPolicy,
}

impl ExporterConfig {
    /// Build from a key lookup (the real environment in `main`, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_keys = parse_api_keys(&lookup("CF_API_KEYS").unwrap_or_default());

        let check_interval_secs = match lookup("CHECK_INTERVAL_SECS") {
            Some(v) => v.trim().parse::<u64>().map_err(|e| {
                ExpiryError::Config(format!("CHECK_INTERVAL_SECS must be an integer: {e}"))
            })?,
            None => default_check_interval_secs(),
        };

        let on_lookup_exhausted = match lookup("ON_LOOKUP_EXHAUSTED").as_deref().map(str::trim) {
            None | Some("") | Some("record") => ExhaustedPolicy::RecordLastValue,
            Some("skip") => ExhaustedPolicy::Skip,
            Some(other) => {
                return Err(ExpiryError::Config(format!(
                    "ON_LOOKUP_EXHAUSTED must be `record` or `skip`, got `{other}`"
                )))
            }
        };

        let cfg = Self {
            api_keys,
            listen: lookup("LISTEN_ADDR").unwrap_or_else(default_listen),
            check_interval_secs,
            manual_expiration_file: lookup("MANUAL_EXPIRATION_FILE")
                .unwrap_or_else(default_manual_expiration_file),
            on_lookup_exhausted,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_keys.is_empty() {
            return Err(ExpiryError::Config("CF_API_KEYS must not be empty".into()));
        }
        if !(60..=86_400).contains(&self.check_interval_secs) {
            return Err(ExpiryError::Config(
                "CHECK_INTERVAL_SECS must be between 60 and 86400".into(),
            ));
        }
        self.listen_addr()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| ExpiryError::Config(format!("LISTEN_ADDR must be a valid SocketAddr: {e}")))
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

/// Split a comma separated credential list, dropping empty segments.
pub fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_check_interval_secs() -> u64 {
    3600
}
fn default_manual_expiration_file() -> String {
    "manual_expiration.yaml".into()
}
