//! Service state shared across commands.
//!
//! [`AppState`] wires the gateways to the services once, so callers never
//! assemble a resolver or pipeline by hand.

use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;
use tracing::info;

use crate::backend::{BackendClient, BackendError};
use crate::config::ServiceConfig;
use crate::gateway::{
    AffiliateGateway, AuthGateway, ClientGateway, PackageGateway, StorageGateway,
    SubmissionGateway, SubmissionNotifier,
};
use crate::services::{AffiliateDashboard, ClientIdentityResolver, SubmissionPipeline};
use crate::webhook::{NoopNotifier, WebhookClient, WebhookError};

/// Errors raised while building [`AppState`].
#[derive(Debug, Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Backend(#[from] BackendError),
    #[error("webhook client: {0}")]
    Webhook(#[from] WebhookError),
}

/// One implementation per gateway trait.
#[derive(Clone)]
pub struct Gateways {
    pub clients: Arc<dyn ClientGateway>,
    pub packages: Arc<dyn PackageGateway>,
    pub auth: Arc<dyn AuthGateway>,
    pub storage: Arc<dyn StorageGateway>,
    pub submissions: Arc<dyn SubmissionGateway>,
    pub affiliates: Arc<dyn AffiliateGateway>,
    pub notifier: Arc<dyn SubmissionNotifier>,
}

impl Gateways {
    /// Every table, auth and storage gateway served by one backend client.
    #[must_use]
    pub fn from_backend(backend: BackendClient, notifier: Arc<dyn SubmissionNotifier>) -> Self {
        let backend = Arc::new(backend);
        Self {
            clients: backend.clone(),
            packages: backend.clone(),
            auth: backend.clone(),
            storage: backend.clone(),
            submissions: backend.clone(),
            affiliates: backend,
            notifier,
        }
    }
}

/// Services shared across handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    resolver: ClientIdentityResolver,
    pipeline: SubmissionPipeline,
    dashboard: AffiliateDashboard,
}

impl AppState {
    /// Build state against the hosted backend described by `config`.
    ///
    /// `session_token` authorises requests as a signed-in user; without it
    /// the anon key is used and no session user is reported.
    ///
    /// # Errors
    ///
    /// Returns error if the backend or webhook client cannot be built.
    pub fn new(
        config: &ServiceConfig,
        session_token: Option<SecretString>,
    ) -> Result<Self, StateError> {
        let mut backend = BackendClient::new(&config.backend)?;
        if let Some(token) = session_token {
            backend = backend.with_session_token(token);
        }

        let notifier: Arc<dyn SubmissionNotifier> = match &config.webhook_url {
            Some(url) => Arc::new(WebhookClient::new(url.clone())?),
            None => {
                info!("No webhook URL configured, submissions will not be announced");
                Arc::new(NoopNotifier)
            }
        };

        Ok(Self::from_gateways(
            Gateways::from_backend(backend, notifier),
            &config.free_package_name,
        ))
    }

    /// Build state over arbitrary gateway implementations.
    #[must_use]
    pub fn from_gateways(gateways: Gateways, free_package_name: &str) -> Self {
        let resolver = ClientIdentityResolver::new(
            gateways.clients.clone(),
            gateways.packages,
            gateways.auth,
        )
        .with_free_package_name(free_package_name);

        let pipeline = SubmissionPipeline::new(
            resolver.clone(),
            gateways.submissions,
            gateways.storage,
            gateways.notifier,
        );

        let dashboard = AffiliateDashboard::new(gateways.affiliates, gateways.clients);

        Self {
            inner: Arc::new(AppStateInner {
                resolver,
                pipeline,
                dashboard,
            }),
        }
    }

    #[must_use]
    pub fn resolver(&self) -> &ClientIdentityResolver {
        &self.inner.resolver
    }

    #[must_use]
    pub fn pipeline(&self) -> &SubmissionPipeline {
        &self.inner.pipeline
    }

    #[must_use]
    pub fn dashboard(&self) -> &AffiliateDashboard {
        &self.inner.dashboard
    }
}
