//! Client identity resolution.
//!
//! A submission form carries contact details and, when the submitter is
//! signed in, an auth account. [`ClientIdentityResolver`] turns those into
//! the single client record new submissions attach to:
//!
//! 1. Resolve the effective auth id (explicit, else the current session).
//! 2. Client already linked to that auth id? Use it.
//! 3. Client with the same email? Reuse it, linking the auth id if the row
//!    is still anonymous, or reject if another account owns it.
//! 4. Otherwise create a client, seeded with the free tasting package when
//!    one is available.
//!
//! Lookups that fail are logged and treated as "no match". Writes that fail
//! are fatal: a silent duplicate client is worse than a loud error.
//!
//! # Concurrency
//!
//! Two first-time submissions for the same email racing each other can both
//! reach step 4 and create two clients. Uniqueness of `email` has to be
//! enforced by the store if that matters.

mod error;

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use snapdish_core::{AuthUserId, ClientDetails, ClientId, NewClient};

use crate::gateway::{AuthGateway, ClientGateway, PackageGateway};

pub use error::ResolveError;

/// Package seeded onto new clients unless configured otherwise.
pub const DEFAULT_FREE_PACKAGE_NAME: &str = "Tasting Package";

/// Finds or creates the client a submission belongs to.
#[derive(Clone)]
pub struct ClientIdentityResolver {
    clients: Arc<dyn ClientGateway>,
    packages: Arc<dyn PackageGateway>,
    auth: Arc<dyn AuthGateway>,
    free_package_name: String,
}

impl ClientIdentityResolver {
    /// Create a resolver over the given gateways.
    #[must_use]
    pub fn new(
        clients: Arc<dyn ClientGateway>,
        packages: Arc<dyn PackageGateway>,
        auth: Arc<dyn AuthGateway>,
    ) -> Self {
        Self {
            clients,
            packages,
            auth,
            free_package_name: DEFAULT_FREE_PACKAGE_NAME.to_owned(),
        }
    }

    /// Seed new clients with the package called `name` instead.
    #[must_use]
    pub fn with_free_package_name(mut self, name: impl Into<String>) -> Self {
        self.free_package_name = name.into();
        self
    }

    /// Resolve the client id for a submission.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::EmailConflict`] if the email belongs to a client
    ///   owned by a different auth account
    /// - [`ResolveError::LinkUpdateFailed`] if an anonymous client could not
    ///   be linked to the auth account
    /// - [`ResolveError::CreationFailed`] if a new client could not be stored
    #[instrument(skip(self, details), fields(email = %details.email))]
    pub async fn resolve(
        &self,
        details: &ClientDetails,
        auth_user_id: Option<AuthUserId>,
    ) -> Result<ClientId, ResolveError> {
        let details = &ClientDetails {
            email: details.email.trim().to_owned(),
            ..details.clone()
        };

        let auth_user_id = match auth_user_id {
            Some(id) => Some(id),
            None => self.session_user_id().await,
        };

        let mut client_id = None;

        if let Some(auth_id) = auth_user_id {
            client_id = self.lookup_by_auth_id(auth_id).await;
        }

        if client_id.is_none() && !details.email.is_empty() {
            client_id = self.lookup_by_email(&details.email, auth_user_id).await?;
        }

        if client_id.is_none() {
            client_id = Some(self.create(details, auth_user_id).await?);
        }

        client_id.ok_or(ResolveError::Unknown)
    }

    /// The signed-in user's id, if the auth service reports one.
    async fn session_user_id(&self) -> Option<AuthUserId> {
        match self.auth.current_session_user().await {
            Ok(Some(user)) => {
                debug!(auth_user_id = %user.id, "Using session user");
                Some(user.id)
            }
            Ok(None) => {
                debug!("No session user, resolving anonymously");
                None
            }
            Err(e) => {
                warn!(error = %e, "Session lookup failed, resolving anonymously");
                None
            }
        }
    }

    async fn lookup_by_auth_id(&self, auth_user_id: AuthUserId) -> Option<ClientId> {
        match self.clients.find_by_auth_id(auth_user_id).await {
            Ok(client) => {
                info!(client_id = %client.client_id, %auth_user_id, "Found client by auth id");
                Some(client.client_id)
            }
            Err(e) if e.is_not_found() => {
                debug!(%auth_user_id, "No client linked to auth id");
                None
            }
            Err(e) => {
                warn!(%auth_user_id, error = %e, "Client lookup by auth id failed, continuing");
                None
            }
        }
    }

    async fn lookup_by_email(
        &self,
        email: &str,
        auth_user_id: Option<AuthUserId>,
    ) -> Result<Option<ClientId>, ResolveError> {
        let matches = match self.clients.find_by_email(email).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "Client lookup by email failed, continuing");
                return Ok(None);
            }
        };

        let Some(client) = matches.into_iter().next() else {
            debug!("No client registered with this email");
            return Ok(None);
        };

        let Some(auth_id) = auth_user_id else {
            info!(client_id = %client.client_id, "Reusing client by email for anonymous submitter");
            return Ok(Some(client.client_id));
        };

        match client.user_auth_id {
            None => {
                info!(client_id = %client.client_id, %auth_id, "Linking anonymous client to auth id");
                self.clients
                    .link_auth_user(client.client_id, auth_id)
                    .await
                    .map_err(|e| ResolveError::LinkUpdateFailed {
                        client_id: client.client_id,
                        message: e.message,
                    })?;
                Ok(Some(client.client_id))
            }
            Some(owner) if owner == auth_id => {
                debug!(client_id = %client.client_id, "Client already linked to this auth id");
                Ok(Some(client.client_id))
            }
            Some(owner) => {
                warn!(
                    client_id = %client.client_id,
                    %auth_id,
                    owner = %owner,
                    "Email is registered to a different account"
                );
                Err(ResolveError::EmailConflict {
                    email: email.to_owned(),
                })
            }
        }
    }

    async fn create(
        &self,
        details: &ClientDetails,
        auth_user_id: Option<AuthUserId>,
    ) -> Result<ClientId, ResolveError> {
        let mut new_client = NewClient::from_details(details, auth_user_id);

        match self
            .packages
            .find_active_by_name(&self.free_package_name)
            .await
        {
            Ok(package) => {
                debug!(package_id = %package.package_id, servings = package.total_servings, "Seeding free package");
                new_client = new_client.with_package(package.package_id, package.total_servings);
            }
            Err(e) if e.is_not_found() => {
                info!(package = %self.free_package_name, "Free package not available, creating client without one");
            }
            Err(e) => {
                warn!(package = %self.free_package_name, error = %e, "Free package lookup failed, creating client without one");
            }
        }

        let client = self
            .clients
            .insert(new_client)
            .await
            .map_err(|e| ResolveError::CreationFailed { message: e.message })?;

        if client.client_id.as_uuid().is_nil() {
            return Err(ResolveError::CreationFailed {
                message: "store returned a client without an id".to_owned(),
            });
        }

        info!(client_id = %client.client_id, "Created client");
        Ok(client.client_id)
    }
}
