//! Object storage gateway.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::instrument;

use super::BackendClient;
use crate::gateway::{StorageGateway, StoreError};

impl BackendClient {
    /// Percent-encode each segment of an object path, keeping the slashes.
    fn encode_object_path(path: &str) -> String {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn object_path(&self, visibility: &str, path: &str) -> String {
        let encoded = Self::encode_object_path(path);
        if visibility.is_empty() {
            format!("storage/v1/object/{}/{encoded}", self.bucket)
        } else {
            format!("storage/v1/object/{visibility}/{}/{encoded}", self.bucket)
        }
    }
}

#[async_trait]
impl StorageGateway for BackendClient {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let url = self.endpoint(&self.object_path("", path))?;
        let response = self
            .send(|http| {
                http.post(url.clone())
                    .header(CONTENT_TYPE, content_type)
                    .header("x-upsert", "false")
                    .body(bytes.clone())
            })
            .await?;
        Self::error_for_status(response).await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        let relative = self.object_path("public", path);
        self.endpoint(&relative).map_or_else(
            |_| format!("{}{relative}", self.base_url),
            |url| url.to_string(),
        )
    }
}
