//! domexp core: error taxonomy, check results and expiration day math.
//!
//! Shared by the exporter binary and its tests. No async runtime, no I/O.
//!
//! `unwrap`, `expect` and `panic!` are denied by clippy in this crate;
//! every fallible path returns [`ExpiryError`].

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;

pub use error::{ErrorKind, ExpiryError, Result};
pub use model::{days_until, CheckResult, CheckStatus, Expiration, ManualExpirations, Snapshot};
