//! SnapDish service library.
//!
//! Decision logic for the restaurant food-photography back office: resolving
//! which client a submission belongs to, storing submissions, and the
//! affiliate dashboard. The hosted backend (auth, tables, object storage) is
//! reached through the traits in [`gateway`]; [`backend`] implements them over
//! its REST API.
//!
//! # Security
//!
//! The backend anon key and session tokens are held as
//! [`secrecy::SecretString`] and never appear in `Debug` output.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod gateway;
pub mod services;
pub mod state;
pub mod webhook;

#[cfg(feature = "test-support")]
pub mod test_support;

pub use config::{BackendConfig, ConfigError, ServiceConfig};
pub use state::AppState;
