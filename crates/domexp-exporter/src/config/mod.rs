//! Exporter config: environment settings and the manual expiration file.

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use domexp_core::error::{ExpiryError, Result};
use domexp_core::ManualExpirations;
use tracing::warn;

pub use schema::{parse_api_keys, ExporterConfig, ManualExpirationFile};

pub fn from_env() -> Result<ExporterConfig> {
    ExporterConfig::from_lookup(|k| std::env::var(k).ok())
}

/// Load the override table. A missing file is an empty table.
pub fn load_manual_expirations(path: &str) -> Result<ManualExpirations> {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ManualExpirations::new()),
        Err(e) => return Err(ExpiryError::OverrideLoad(format!("read {path} failed: {e}"))),
    };
    load_manual_expirations_from_str(&s)
}

pub fn load_manual_expirations_from_str(s: &str) -> Result<ManualExpirations> {
    if s.trim().is_empty() {
        return Ok(ManualExpirations::new());
    }
    let file: ManualExpirationFile = serde_yaml::from_str(s)
        .map_err(|e| ExpiryError::OverrideLoad(format!("invalid yaml: {e}")))?;
    if !file.ignored.is_empty() {
        let mut keys: Vec<&str> = file.ignored.keys().map(String::as_str).collect();
        keys.sort_unstable();
        warn!(keys = ?keys, "ignoring unknown keys in manual expiration file");
    }
    Ok(file.domains)
}
