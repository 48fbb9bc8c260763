//! Account clients: one handle per credential, able to list its domains.

pub mod cloudflare;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use domexp_core::error::Result;

pub use cloudflare::CloudflareAccount;

/// Domain listing capability for one credential.
#[async_trait]
pub trait AccountClient: Send + Sync {
    /// Domains currently managed under this credential.
    async fn list_domains(&self) -> Result<Vec<String>>;

    /// Masked credential, safe for logs and labels. Display only.
    fn obfuscated_id(&self) -> &str;

    /// Identity key of the account (a hash of the credential).
    fn account_key(&self) -> &str;
}

/// Show a short prefix and suffix of a credential, mask the rest.
pub fn obfuscate(credential: &str) -> String {
    const KEEP: usize = 6;
    let chars: Vec<char> = credential.chars().collect();
    if chars.len() <= KEEP * 2 {
        return "***".to_string();
    }
    let head: String = chars[..KEEP].iter().collect();
    let tail: String = chars[chars.len() - KEEP..].iter().collect();
    format!("{head}...{tail}")
}

/// Stable per-process identity for a credential that does not expose it.
pub fn credential_key(credential: &str) -> String {
    let mut h = DefaultHasher::new();
    credential.hash(&mut h);
    format!("{:016x}", h.finish())
}
