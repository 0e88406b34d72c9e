//! Business logic services.
//!
//! # Services
//!
//! - `identity` - Find or create the client behind a submission
//! - `submission` - Upload images and store submissions
//! - `affiliate` - Commission totals and referrals for the affiliate dashboard

pub mod affiliate;
pub mod identity;
pub mod submission;

pub use affiliate::{AffiliateDashboard, DashboardSummary, package_usage};
pub use identity::{ClientIdentityResolver, DEFAULT_FREE_PACKAGE_NAME, ResolveError};
pub use submission::{
    ImageUpload, ItemDetails, SubmissionError, SubmissionForm, SubmissionPipeline,
    SubmissionReceipt,
};
