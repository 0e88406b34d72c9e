//! Gateways to the hosted backend.
//!
//! Every call the service makes to the outside world goes through one of the
//! traits in this module: table access, the auth session, object storage and
//! the submission webhook. The REST adapter in [`crate::backend`] implements
//! them for production; unit tests substitute `mockall` mocks and integration
//! tests use the in-memory doubles from `test_support`.
//!
//! Table operations fail with a [`StoreError`] whose [`StoreErrorKind`]
//! separates "no such row" from every other failure, so callers branch on a
//! typed value rather than on error codes.

mod types;

use async_trait::async_trait;
use thiserror::Error;

use snapdish_core::{
    AffiliateId, AuthUserId, Client, ClientId, ItemId, NewClient, ServicePackage, SubmissionId,
};

use crate::webhook::{SubmissionWebhookPayload, WebhookError};

pub use types::{Commission, NewItem, NewSubmission, SessionUser};

/// Which kind of failure a table operation hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// A single-row fetch matched nothing.
    NotFound,
    /// Anything else: transport, permissions, constraint violations.
    Other,
}

/// Error returned by every gateway operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    /// A "no rows" error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::NotFound,
            message: message.into(),
        }
    }

    /// Any other failure.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Other,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }
}

/// Access to the `clients` table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientGateway: Send + Sync {
    /// Single-row fetch by owning auth account.
    ///
    /// Fails with [`StoreErrorKind::NotFound`] when no client is linked.
    async fn find_by_auth_id(&self, auth_user_id: AuthUserId) -> Result<Client, StoreError>;

    /// All clients registered with `email`, oldest first.
    async fn find_by_email(&self, email: &str) -> Result<Vec<Client>, StoreError>;

    /// Attach `auth_user_id` to a client and return the updated row.
    async fn link_auth_user(
        &self,
        client_id: ClientId,
        auth_user_id: AuthUserId,
    ) -> Result<Client, StoreError>;

    /// Insert a new client and return the stored row.
    async fn insert(&self, client: NewClient) -> Result<Client, StoreError>;

    /// Fetch every client whose id is in `client_ids`.
    async fn find_by_ids(&self, client_ids: &[ClientId]) -> Result<Vec<Client>, StoreError>;
}

/// Read access to the `service_packages` table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageGateway: Send + Sync {
    /// Single-row fetch of an active package by name.
    async fn find_active_by_name(&self, name: &str) -> Result<ServicePackage, StoreError>;
}

/// The auth service's view of the current session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// The user behind the current session, if any.
    async fn current_session_user(&self) -> Result<Option<SessionUser>, StoreError>;
}

/// Object storage for uploaded reference images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Store `bytes` at `path` inside the configured bucket.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str)
    -> Result<(), StoreError>;

    /// Public URL for an object previously uploaded to `path`.
    fn public_url(&self, path: &str) -> String;
}

/// Access to the `menu_items` and `submissions` tables.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn insert_item(&self, item: NewItem) -> Result<ItemId, StoreError>;

    async fn delete_item(&self, item_id: ItemId) -> Result<(), StoreError>;

    async fn insert_submission(&self, submission: NewSubmission)
    -> Result<SubmissionId, StoreError>;

    /// Reassign a submission (and its item) to another client.
    async fn link_submission(
        &self,
        submission_id: SubmissionId,
        client_id: ClientId,
    ) -> Result<(), StoreError>;
}

/// Access to affiliate commissions and referrals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AffiliateGateway: Send + Sync {
    async fn commissions_for(&self, affiliate_id: AffiliateId)
    -> Result<Vec<Commission>, StoreError>;

    /// Ids of the clients this affiliate referred.
    async fn referred_clients(&self, affiliate_id: AffiliateId)
    -> Result<Vec<ClientId>, StoreError>;
}

/// Outbound notification fired after a successful submission.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionNotifier: Send + Sync {
    async fn notify(&self, payload: &SubmissionWebhookPayload) -> Result<(), WebhookError>;
}
