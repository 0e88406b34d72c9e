//! SnapDish Core - Shared domain types.
//!
//! This crate provides the types shared by every SnapDish component:
//! - `service` - Client identity resolution, submissions, affiliate dashboard
//! - `cli` - Operator commands
//! - `integration-tests` - End-to-end scenarios
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no access to the hosted backend. Anything that talks to the
//! outside world lives in `snapdish-service` behind a gateway trait.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, prices, package tiers, clients and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
