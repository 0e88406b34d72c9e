//! Core types for SnapDish.
//!
//! This module provides type-safe wrappers for the domain concepts shared
//! between the service library and its callers.

pub mod client;
pub mod email;
pub mod id;
pub mod package;
pub mod price;
pub mod status;

pub use client::{Client, ClientDetails, NewClient};
pub use email::{Email, EmailError};
pub use id::*;
pub use package::{PackageTerms, PackageTier, PackageUsage, ServicePackage, UnknownPackageTier};
pub use price::{CurrencyCode, Price};
pub use status::*;
