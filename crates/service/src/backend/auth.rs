//! Auth session gateway.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, instrument};

use super::BackendClient;
use crate::gateway::{AuthGateway, SessionUser, StoreError};

#[async_trait]
impl AuthGateway for BackendClient {
    /// Ask the auth service who owns the attached session token.
    ///
    /// Without a token, or when the token is rejected, there is no session
    /// user; that is the anonymous flow, not an error.
    #[instrument(skip(self))]
    async fn current_session_user(&self) -> Result<Option<SessionUser>, StoreError> {
        if self.session_token.is_none() {
            debug!("No session token attached");
            return Ok(None);
        }

        let url = self.endpoint("auth/v1/user")?;
        let response = self.send(|http| http.get(url.clone())).await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            debug!(status = response.status().as_u16(), "Session token rejected");
            return Ok(None);
        }

        let user: SessionUser = Self::decode(response).await?;
        Ok(Some(user))
    }
}
