//! Submission webhook client.
//!
//! After a submission is stored, a JSON summary of the form is posted to an
//! external automation endpoint. Delivery is fire-and-forget from the
//! pipeline's point of view: a failed notification is logged and never turns
//! a stored submission into a failed one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use snapdish_core::{ClientId, ItemId, SubmissionId};

use crate::gateway::SubmissionNotifier;

/// Errors that can occur when delivering a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("webhook rejected: {status} - {message}")]
    Rejected { status: u16, message: String },
}

/// Body posted to the webhook endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionWebhookPayload {
    pub event: String,
    pub client_id: ClientId,
    pub submission_id: SubmissionId,
    pub item_id: ItemId,
    pub restaurant_name: String,
    pub contact_name: String,
    pub phone_number: String,
    pub email: String,
    pub item_name: String,
    pub item_type: Option<String>,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Posts submission payloads to a fixed URL.
#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    url: String,
}

impl WebhookClient {
    /// Create a webhook client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(url: impl Into<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SubmissionNotifier for WebhookClient {
    #[instrument(skip(self, payload), fields(submission_id = %payload.submission_id))]
    async fn notify(&self, payload: &SubmissionWebhookPayload) -> Result<(), WebhookError> {
        debug!("Posting submission webhook");
        let response = self.client.post(&self.url).json(payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WebhookError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Notifier used when no webhook URL is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl SubmissionNotifier for NoopNotifier {
    async fn notify(&self, payload: &SubmissionWebhookPayload) -> Result<(), WebhookError> {
        debug!(submission_id = %payload.submission_id, "No webhook configured, skipping");
        Ok(())
    }
}
