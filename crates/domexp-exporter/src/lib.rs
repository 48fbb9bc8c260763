//! Domain expiration exporter library entry.
//!
//! This crate wires the account clients, the WHOIS oracle, the checking
//! engine and the metrics endpoint into one service. It is intended to be
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod account;
pub mod app_state;
pub mod checker;
pub mod config;
pub mod expiration;
pub mod obs;
pub mod ops;
pub mod oracle;
pub mod router;
