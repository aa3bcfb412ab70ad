//! HTTP transport for the bookmark service.

use std::time::Duration;

use async_trait::async_trait;
use lwkit_core::{
    ApiEnvelope, ApiError, ApiResult, BookmarkApi, ClientConfig, Collection, Link, LinkUpdate,
    NewCollection, NewLink, SearchParams, Tag,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("lwkit/", env!("CARGO_PKG_VERSION"));

const API_PREFIX: &str = "/api/v1";

/// Authenticated client for the bookmark service REST API.
///
/// Every call is attempted exactly once. Failures are classified into
/// [`ApiError`] variants; a request that exceeds the timeout surfaces as
/// [`ApiError::Connection`].
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        Self::with_timeout(&config.api_url, &config.api_token, config.request_timeout)
    }

    /// Build a client for `api_url` authenticated with `api_token`.
    pub fn with_timeout(api_url: &str, api_token: &str, timeout: Duration) -> ApiResult<Self> {
        let headers = build_headers(api_token)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Ok(Self {
            client,
            base_url: format!("{}{}", api_url.trim_end_matches('/'), API_PREFIX),
        })
    }

    /// Base URL including the API prefix.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one request and return the raw JSON body.
    pub async fn request(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&serde_json::Value>,
    ) -> ApiResult<serde_json::Value> {
        let bytes = self.execute(method, endpoint, &[], body).await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn call<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&'static str, String)],
        body: Option<&B>,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let bytes = self.execute(method, endpoint, query, body).await?;
        serde_json::from_slice::<ApiEnvelope<T>>(&bytes)
            .map(|envelope| envelope.response)
            .map_err(|e| ApiError::Decode(format!("{endpoint}: {e}")))
    }

    async fn execute<B>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&'static str, String)],
        body: Option<&B>,
    ) -> ApiResult<Vec<u8>>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(method = %method, url = %url, "api request");

        let mut request = self.client.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or_default().to_string();
            let body = response.text().await.unwrap_or_default();
            warn!(method = %method, url = %url, status = status.as_u16(), "api request failed");
            return Err(ApiError::from_status(status.as_u16(), reason, body));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        debug!(method = %method, url = %url, bytes = bytes.len(), "api response");
        Ok(bytes.to_vec())
    }
}

fn build_headers(api_token: &str) -> ApiResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {api_token}"))
        .map_err(|e| ApiError::InvalidRequest(format!("invalid API token: {e}")))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else if err.is_builder() {
        ApiError::InvalidRequest(err.to_string())
    } else {
        ApiError::Connection(err.to_string())
    }
}

#[async_trait]
impl BookmarkApi for RemoteClient {
    async fn list_collections(&self) -> ApiResult<Vec<Collection>> {
        self.call::<_, ()>(Method::GET, "/collections", &[], None)
            .await
    }

    async fn list_tags(&self) -> ApiResult<Vec<Tag>> {
        self.call::<_, ()>(Method::GET, "/tags", &[], None).await
    }

    async fn search_links(&self, params: &SearchParams) -> ApiResult<Vec<Link>> {
        self.call::<_, ()>(Method::GET, "/links", &params.to_query_pairs(), None)
            .await
    }

    async fn create_link(&self, link: &NewLink) -> ApiResult<Link> {
        self.call(Method::POST, "/links", &[], Some(link)).await
    }

    async fn update_link(&self, update: &LinkUpdate) -> ApiResult<Link> {
        let endpoint = format!("/links/{}", update.id);
        self.call(Method::PUT, &endpoint, &[], Some(update)).await
    }

    async fn create_collection(&self, collection: &NewCollection) -> ApiResult<Collection> {
        self.call(Method::POST, "/collections", &[], Some(collection))
            .await
    }
}
