use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use reqwest::{Client, Method, Response};
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use crate::domains::auth::storage::SessionStore;
use crate::infra::errors::ClientError;
use crate::infra::middleware::{
    BearerAuth, NotifyCallback, RequestContext, RequestStage, ResponseStage,
    SessionExpiredCallback, UnauthorizedHandler,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the storefront backend.
///
/// Every request goes through the request stages (bearer attachment first)
/// and every result through the response stages (401 handling first).
/// Cloning is cheap and clones share the connection pool and stages.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    request_stages: Arc<[Arc<dyn RequestStage>]>,
    response_stages: Arc<[Arc<dyn ResponseStage>]>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("request_stages", &self.request_stages)
            .field("response_stages", &self.response_stages)
            .finish()
    }
}

/// Builder for [`ApiClient`]. The session hooks are optional so the client
/// does not depend on any particular redirect or UI implementation.
pub struct ApiClientBuilder {
    base_url: String,
    timeout: Duration,
    store: Option<Arc<dyn SessionStore>>,
    on_session_expired: Option<SessionExpiredCallback>,
    notify: Option<NotifyCallback>,
    request_stages: Vec<Arc<dyn RequestStage>>,
    response_stages: Vec<Arc<dyn ResponseStage>>,
}

impl std::fmt::Debug for ApiClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClientBuilder")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("has_store", &self.store.is_some())
            .field("has_session_expired_hook", &self.on_session_expired.is_some())
            .field("has_notify_hook", &self.notify.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Durable store the bearer token is read from before each request.
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn on_session_expired(mut self, callback: SessionExpiredCallback) -> Self {
        self.on_session_expired = Some(callback);
        self
    }

    pub fn notify(mut self, callback: NotifyCallback) -> Self {
        self.notify = Some(callback);
        self
    }

    /// Append a request stage after bearer attachment.
    pub fn request_stage(mut self, stage: Arc<dyn RequestStage>) -> Self {
        self.request_stages.push(stage);
        self
    }

    /// Append a response stage after 401 handling.
    pub fn response_stage(mut self, stage: Arc<dyn ResponseStage>) -> Self {
        self.response_stages.push(stage);
        self
    }

    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = normalize_base_url(&self.base_url);
        Url::parse(&base_url).map_err(|source| ClientError::InvalidUrl {
            url: base_url.clone(),
            source,
        })?;

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ClientError::Build)?;

        let mut request_stages: Vec<Arc<dyn RequestStage>> = Vec::new();
        if let Some(store) = self.store {
            request_stages.push(Arc::new(BearerAuth::new(store)));
        }
        request_stages.extend(self.request_stages);

        let mut response_stages: Vec<Arc<dyn ResponseStage>> = vec![Arc::new(
            UnauthorizedHandler::new(self.on_session_expired, self.notify),
        )];
        response_stages.extend(self.response_stages);

        info!("[ApiClient] Creating API client with base URL: {}", base_url);

        Ok(ApiClient {
            client,
            base_url,
            request_stages: request_stages.into(),
            response_stages: response_stages.into(),
        })
    }
}

/// Add `http://` when no scheme is given and trim the trailing slash so
/// joined paths never double up.
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let with_scheme =
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };
    if with_scheme != raw {
        log::warn!(
            "[ApiClient] Normalized base URL from '{}' to '{}'",
            raw,
            with_scheme
        );
    }
    with_scheme
}

impl ApiClient {
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            store: None,
            on_session_expired: None,
            notify: None,
            request_stages: Vec::new(),
            response_stages: Vec::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `path` against the base URL. Absolute URLs pass through.
    pub fn build_url(&self, path: &str) -> Result<Url, ClientError> {
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        };
        Url::parse(&raw).map_err(|source| ClientError::InvalidUrl { url: raw, source })
    }

    /// Dispatch a request through the stages and return the raw response.
    ///
    /// Non-success statuses other than 401 come back as
    /// [`ClientError::Status`] with the body text attached.
    pub async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        context: RequestContext,
    ) -> Result<Response, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.build_url(path)?;
        let mut builder = self.client.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let mut request = builder.build()?;

        for stage in self.request_stages.iter() {
            stage.on_request(&mut request, &context);
        }

        debug!(
            "[ApiClient] {} {} (has_token: {})",
            request.method(),
            request.url().path(),
            request.headers().contains_key(reqwest::header::AUTHORIZATION)
        );

        let mut result =
            self.client.execute(request).await.map_err(ClientError::from);
        for stage in self.response_stages.iter() {
            result = stage.on_response(result, &context);
        }

        let response = result?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ClientError::Status { status, body })
    }

    /// Dispatch and decode a JSON body. An empty body decodes as `null`, so
    /// `T = ()` or `Option<_>` works for endpoints without content.
    pub async fn execute<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        context: RequestContext,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, context).await?;
        let bytes = response.bytes().await?;
        let payload: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(payload).map_err(ClientError::Decode)
    }

    /// GET request with authentication
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute::<(), T>(Method::GET, path, None, RequestContext::authenticated())
            .await
    }

    /// GET request WITHOUT authentication (for public endpoints)
    pub async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ClientError> {
        self.execute::<(), T>(Method::GET, path, None, RequestContext::public())
            .await
    }

    /// POST request with authentication
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.execute(Method::POST, path, Some(body), RequestContext::authenticated())
            .await
    }

    /// POST request WITHOUT authentication (login and similar)
    pub async fn post_public<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.execute(Method::POST, path, Some(body), RequestContext::public())
            .await
    }

    /// PUT request with authentication
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.execute(Method::PUT, path, Some(body), RequestContext::authenticated())
            .await
    }

    /// DELETE request with authentication
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute::<(), T>(
            Method::DELETE,
            path,
            None,
            RequestContext::authenticated(),
        )
        .await
    }

    /// POST request that expects no response body
    pub async fn post_no_content<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ClientError> {
        self.send(Method::POST, path, Some(body), RequestContext::authenticated())
            .await
            .map(|_| ())
    }
}
