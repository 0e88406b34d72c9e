//! REST client for the hosted backend.
//!
//! # Architecture
//!
//! The hosted platform exposes three HTTP surfaces, all under one base URL:
//!
//! - `rest/v1/{table}` - table access with `column=op.value` filters
//! - `auth/v1/user` - the user behind a session access token
//! - `storage/v1/object/{bucket}/{path}` - object uploads and public URLs
//!
//! [`BackendClient`] speaks all three and implements every gateway trait in
//! [`crate::gateway`], so the services never see HTTP.
//!
//! # Not found
//!
//! Single-row fetches ask for an object response. When zero rows match the
//! platform answers `406` with error code [`NOT_FOUND_CODE`]; that response
//! becomes [`StoreErrorKind::NotFound`](crate::gateway::StoreErrorKind).

mod auth;
mod policy;
mod storage;
mod tables;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::config::BackendConfig;
use crate::gateway::StoreError;

pub use policy::RequestPolicy;

/// Error code the platform returns when a single-row fetch matches nothing.
pub const NOT_FOUND_CODE: &str = "PGRST116";

/// Media type requesting a single JSON object instead of an array.
const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error response.
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// A write that should return a row returned none.
    #[error("{operation} on {table} returned no rows")]
    NoRows {
        operation: &'static str,
        table: String,
    },

    /// Failed to parse a response or build a request.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl BackendError {
    /// Whether this is the "zero rows for a single-row fetch" response.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Api { status: 406, code: Some(code), .. } if code == NOT_FOUND_CODE
        )
    }
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        if err.is_not_found() {
            Self::not_found(err.to_string())
        } else {
            Self::other(err.to_string())
        }
    }
}

/// Error body returned by the table, auth and storage endpoints.
///
/// The three surfaces disagree on field names; only what we log is kept.
#[derive(Debug, Default, serde::Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default, alias = "msg", alias = "error_description")]
    message: Option<String>,
}

/// Hosted backend client.
///
/// Cheap to clone. Requests are authorised with the session access token
/// when one is attached, otherwise with the anon key.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    session_token: Option<SecretString>,
    bucket: String,
    policy: RequestPolicy,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("has_session", &self.session_token.is_some())
            .field("bucket", &self.bucket)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL or anon key is malformed, or the HTTP
    /// client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut base_url = Url::parse(&config.url)
            .map_err(|e| BackendError::Parse(format!("invalid backend URL: {e}")))?;
        // `Url::join` replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(config.anon_key.expose_secret())
            .map_err(|e| BackendError::Parse(format!("invalid anon key format: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url,
            anon_key: config.anon_key.clone(),
            session_token: None,
            bucket: config.storage_bucket.clone(),
            policy: config.request_policy,
        })
    }

    /// Act on behalf of the user owning `token`.
    #[must_use]
    pub fn with_session_token(mut self, token: SecretString) -> Self {
        self.session_token = Some(token);
        self
    }

    /// Replace the request policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: RequestPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The base URL every endpoint is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Parse(format!("invalid endpoint {path}: {e}")))
    }

    fn table_url(&self, table: &str, query: &TableQuery) -> Result<Url, BackendError> {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        if !query.pairs.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &query.pairs {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn bearer(&self) -> Result<HeaderValue, BackendError> {
        let token = self
            .session_token
            .as_ref()
            .unwrap_or(&self.anon_key)
            .expose_secret();
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| BackendError::Parse(format!("invalid bearer token: {e}")))?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Send a request built by `build`, applying the request policy.
    ///
    /// `build` runs once per attempt. Only transport failures and 5xx
    /// responses are retried.
    async fn send<F>(&self, build: F) -> Result<reqwest::Response, BackendError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder + Send + Sync,
    {
        let attempts = self.policy.attempts();
        let bearer = self.bearer()?;
        let mut attempt = 1;

        loop {
            let mut request = build(&self.http).header(AUTHORIZATION, bearer.clone());
            if let Some(timeout) = self.policy.timeout {
                request = request.timeout(timeout);
            }

            match request.send().await {
                Ok(response)
                    if attempt < attempts
                        && RequestPolicy::is_retryable_status(response.status().as_u16()) =>
                {
                    warn!(
                        attempt,
                        status = response.status().as_u16(),
                        "Backend returned server error, retrying"
                    );
                }
                Ok(response) => return Ok(response),
                Err(e) if attempt < attempts && (e.is_timeout() || e.is_connect()) => {
                    warn!(attempt, error = %e, "Backend request failed, retrying");
                }
                Err(e) => return Err(e.into()),
            }

            tokio::time::sleep(self.policy.delay_after(attempt)).await;
            attempt += 1;
        }
    }

    /// Turn a non-success response into [`BackendError::Api`].
    async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
        Err(BackendError::Api {
            status: status.as_u16(),
            code: body.code,
            message: body.message.unwrap_or(text),
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let response = Self::error_for_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    /// Fetch exactly one row.
    pub(crate) async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &TableQuery,
    ) -> Result<T, BackendError> {
        let url = self.table_url(table, query)?;
        let response = self
            .send(|http| {
                http.get(url.clone())
                    .header(ACCEPT, HeaderValue::from_static(OBJECT_MEDIA_TYPE))
            })
            .await?;
        Self::decode(response).await
    }

    /// Fetch every matching row.
    pub(crate) async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &TableQuery,
    ) -> Result<Vec<T>, BackendError> {
        let url = self.table_url(table, query)?;
        let response = self.send(|http| http.get(url.clone())).await?;
        Self::decode(response).await
    }

    /// Insert one row and return its stored representation.
    pub(crate) async fn insert_row<B, T>(&self, table: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.table_url(table, &TableQuery::new())?;
        let response = self
            .send(|http| {
                http.post(url.clone())
                    .header("Prefer", "return=representation")
                    .json(body)
            })
            .await?;
        let rows: Vec<T> = Self::decode(response).await?;
        rows.into_iter().next().ok_or_else(|| BackendError::NoRows {
            operation: "insert",
            table: table.to_owned(),
        })
    }

    /// Update matching rows and return the first updated one.
    pub(crate) async fn update_row<B, T>(
        &self,
        table: &str,
        query: &TableQuery,
        body: &B,
    ) -> Result<T, BackendError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.table_url(table, query)?;
        let response = self
            .send(|http| {
                http.patch(url.clone())
                    .header("Prefer", "return=representation")
                    .json(body)
            })
            .await?;
        let rows: Vec<T> = Self::decode(response).await?;
        rows.into_iter().next().ok_or_else(|| BackendError::NoRows {
            operation: "update",
            table: table.to_owned(),
        })
    }

    /// Delete matching rows.
    pub(crate) async fn delete_rows(&self, table: &str, query: &TableQuery) -> Result<(), BackendError> {
        let url = self.table_url(table, query)?;
        let response = self.send(|http| http.delete(url.clone())).await?;
        Self::error_for_status(response).await?;
        Ok(())
    }
}

/// Query-string filters for a table request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TableQuery {
    pairs: Vec<(String, String)>,
}

impl TableQuery {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `column = value`
    pub(crate) fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.pairs.push((column.to_owned(), format!("eq.{value}")));
        self
    }

    /// `column IN (values...)`
    pub(crate) fn is_in<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: std::fmt::Display,
    {
        let list = values
            .into_iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.pairs.push((column.to_owned(), format!("in.({list})")));
        self
    }

    pub(crate) fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.pairs
            .push(("order".to_owned(), format!("{column}.{direction}")));
        self
    }

    pub(crate) fn limit(mut self, limit: usize) -> Self {
        self.pairs.push(("limit".to_owned(), limit.to_string()));
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::gateway::StoreErrorKind;

    fn config(url: &str) -> BackendConfig {
        BackendConfig {
            url: url.to_owned(),
            anon_key: SecretString::from("anon-key-value"),
            storage_bucket: "submissions".to_owned(),
            request_policy: RequestPolicy::default(),
        }
    }

    #[test]
    fn test_base_url_gains_trailing_slash() {
        let client = BackendClient::new(&config("https://abc.backend.test/api")).unwrap();
        assert_eq!(client.base_url().as_str(), "https://abc.backend.test/api/");
        let url = client.endpoint("rest/v1/clients").unwrap();
        assert_eq!(url.as_str(), "https://abc.backend.test/api/rest/v1/clients");
    }

    #[test]
    fn test_table_url_encodes_filters() {
        let client = BackendClient::new(&config("https://abc.backend.test")).unwrap();
        let query = TableQuery::new()
            .eq("email", "owner+photos@bistro.nl")
            .order("created_at", true)
            .limit(1);
        let url = client.table_url("clients", &query).unwrap();
        assert_eq!(
            url.as_str(),
            "https://abc.backend.test/rest/v1/clients?email=eq.owner%2Bphotos%40bistro.nl&order=created_at.asc&limit=1"
        );
    }

    #[test]
    fn test_membership_filter() {
        let query = TableQuery::new().is_in("client_id", ["a", "b", "c"]);
        assert_eq!(
            query.pairs,
            vec![("client_id".to_owned(), "in.(a,b,c)".to_owned())]
        );
    }

    #[test]
    fn test_not_found_code_maps_to_not_found_kind() {
        let err = BackendError::Api {
            status: 406,
            code: Some(NOT_FOUND_CODE.to_owned()),
            message: "JSON object requested, multiple (or no) rows returned".to_owned(),
        };
        assert!(err.is_not_found());
        assert_eq!(StoreError::from(err).kind, StoreErrorKind::NotFound);
    }

    #[test]
    fn test_other_api_errors_map_to_other_kind() {
        let err = BackendError::Api {
            status: 406,
            code: Some("PGRST106".to_owned()),
            message: "schema not exposed".to_owned(),
        };
        assert_eq!(StoreError::from(err).kind, StoreErrorKind::Other);

        let err = BackendError::NoRows {
            operation: "insert",
            table: "clients".to_owned(),
        };
        let store = StoreError::from(err);
        assert_eq!(store.kind, StoreErrorKind::Other);
        assert_eq!(store.message, "insert on clients returned no rows");
    }

    #[test]
    fn test_debug_redacts_keys() {
        let client = BackendClient::new(&config("https://abc.backend.test"))
            .unwrap()
            .with_session_token(SecretString::from("session-token-value"));
        let debug = format!("{client:?}");
        assert!(!debug.contains("anon-key-value"));
        assert!(!debug.contains("session-token-value"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_error_body_aliases() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"code":"PGRST116","message":"no rows"}"#).unwrap();
        assert_eq!(body.code.as_deref(), Some("PGRST116"));

        let body: ApiErrorBody =
            serde_json::from_str(r#"{"msg":"invalid JWT"}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("invalid JWT"));
    }
}
