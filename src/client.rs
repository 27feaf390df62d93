//! Authenticated HTTP transport.
//!
//! Every call that needs credentials first checks the endpoint with a `HEAD`
//! request. A `401` answer triggers one token refresh and one more check; if the
//! endpoint still refuses the token the whole call fails with
//! [`ApiError::Unauthorized`]. Only then is the real request sent, so a
//! side-effecting request is never issued twice.

use crate::auth::{AuthContainer, Credentials};
use crate::error::{ApiError, ApiResult};
use bytes::Bytes;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Body, Client as HttpClient, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.gfycat.com/v1";
pub const DEFAULT_UPLOAD_URL: &str = "https://filedrop.gfycat.com";
const DEFAULT_TOKEN_ENDPOINT: &str = "/oauth/token";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL relative endpoints are joined to
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
    /// OAuth client id used at the token endpoint
    pub client_id: String,
    /// OAuth client secret used at the token endpoint
    pub client_secret: String,
    /// Token endpoint, relative to `base_url` or absolute
    pub token_endpoint: String,
    /// Host media files are dropped on after an upload key is issued
    pub upload_url: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("gfycat-api/{}", env!("CARGO_PKG_VERSION")),
            client_id: String::new(),
            client_secret: String::new(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = client_id.into();
        self.client_secret = client_secret.into();
        self
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    pub fn with_upload_url(mut self, upload_url: impl Into<String>) -> Self {
        self.upload_url = upload_url.into();
        self
    }

    /// Resolve an endpoint against the base URL.
    ///
    /// Absolute `http(s)://` endpoints are returned as given.
    pub fn resolve(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            )
        }
    }

    pub fn token_url(&self) -> String {
        self.resolve(&self.token_endpoint)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Per-call request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    no_credential: bool,
    fail_on_unauthorized: bool,
    cancel_token: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send the request without credentials and skip the authorization check
    pub fn no_credential(mut self) -> Self {
        self.no_credential = true;
        self
    }

    /// For status-only calls: turn a `401` into an error instead of returning it
    pub fn fail_on_unauthorized(mut self) -> Self {
        self.fail_on_unauthorized = true;
        self
    }

    /// Abort the call when the token is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn requires_auth(&self) -> bool {
        !self.no_credential
    }

    pub fn cancel_token(&self) -> Option<&CancellationToken> {
        self.cancel_token.as_ref()
    }
}

/// Request body
pub(crate) enum Payload {
    Empty,
    Json(Bytes),
    Stream { body: Body, file_name: String },
}

impl Payload {
    fn json<B: Serialize + ?Sized>(body: &B) -> ApiResult<Self> {
        Ok(Payload::Json(Bytes::from(serde_json::to_vec(body)?)))
    }

    fn apply(self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Payload::Empty => builder,
            Payload::Json(bytes) => builder
                .header(CONTENT_TYPE, "application/json; charset=utf-8")
                .body(bytes),
            Payload::Stream { body, file_name } => builder
                .header(CONTENT_TYPE, "application/octet-stream")
                .header(
                    CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file_name.replace('"', "\\\"")),
                )
                .body(body),
        }
    }
}

/// Gfycat API client.
///
/// Cheap to clone; clones share the HTTP connection pool and the credentials.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    http: HttpClient,
    auth: Arc<AuthContainer>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                warn!(target: "client", error = %e, "Failed to build configured HTTP client, using defaults");
                HttpClient::new()
            });
        Self::with_http_client(config, http)
    }

    pub fn with_http_client(config: ClientConfig, http: HttpClient) -> Self {
        let auth = Arc::new(AuthContainer::new(
            config.token_url(),
            config.client_id.clone(),
            config.client_secret.clone(),
        ));
        Self::with_shared_auth(config, http, auth)
    }

    /// Build a client that shares credentials with other clients
    pub fn with_shared_auth(
        config: ClientConfig,
        http: HttpClient,
        auth: Arc<AuthContainer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            http,
            auth,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn auth(&self) -> &Arc<AuthContainer> {
        &self.auth
    }

    pub async fn set_tokens(&self, access_token: String, refresh_token: Option<String>) {
        self.auth.set_tokens(access_token, refresh_token).await;
    }

    pub async fn clear_tokens(&self) {
        self.auth.clear_tokens().await;
    }

    /// Acquire application credentials (client credentials grant)
    pub async fn authenticate(&self) -> ApiResult<Credentials> {
        self.auth.authenticate_client(&self.http).await
    }

    /// Acquire user credentials (password grant)
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<Credentials> {
        self.auth
            .authenticate_password(&self.http, username, password)
            .await
    }

    /// Refresh the held credentials, raising on failure
    pub async fn refresh_tokens(&self) -> ApiResult<Credentials> {
        self.auth.refresh(&self.http).await
    }

    // ---- typed JSON ----

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        opts: RequestOptions,
    ) -> ApiResult<T> {
        self.send_json(method, endpoint, Payload::Empty, opts).await
    }

    pub async fn request_with_json<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
        opts: RequestOptions,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(method, endpoint, Payload::json(body)?, opts)
            .await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        opts: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::GET, endpoint, opts).await
    }

    pub async fn post<B, T>(&self, endpoint: &str, body: &B, opts: RequestOptions) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_with_json(Method::POST, endpoint, body, opts)
            .await
    }

    pub async fn put<B, T>(&self, endpoint: &str, body: &B, opts: RequestOptions) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_with_json(Method::PUT, endpoint, body, opts)
            .await
    }

    pub async fn patch<B, T>(&self, endpoint: &str, body: &B, opts: RequestOptions) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_with_json(Method::PATCH, endpoint, body, opts)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        opts: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::DELETE, endpoint, opts).await
    }

    // ---- fire-and-forget ----

    pub async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        opts: RequestOptions,
    ) -> ApiResult<()> {
        self.send_discard(method, endpoint, Payload::Empty, opts)
            .await
    }

    pub async fn execute_with_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
        opts: RequestOptions,
    ) -> ApiResult<()> {
        self.send_discard(method, endpoint, Payload::json(body)?, opts)
            .await
    }

    // ---- status-only ----

    pub async fn status(
        &self,
        method: Method,
        endpoint: &str,
        opts: RequestOptions,
    ) -> ApiResult<StatusCode> {
        self.send_for_status(method, endpoint, Payload::Empty, opts)
            .await
    }

    pub async fn status_with_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
        opts: RequestOptions,
    ) -> ApiResult<StatusCode> {
        self.send_for_status(method, endpoint, Payload::json(body)?, opts)
            .await
    }

    /// Upload a raw byte stream, returning the response status.
    ///
    /// Honors the cancellation token in `opts`; a cancelled upload returns
    /// [`ApiError::Cancelled`] and the in-flight request is dropped.
    pub async fn upload_stream(
        &self,
        method: Method,
        endpoint: &str,
        body: impl Into<Body>,
        file_name: &str,
        opts: RequestOptions,
    ) -> ApiResult<StatusCode> {
        let payload = Payload::Stream {
            body: body.into(),
            file_name: file_name.to_string(),
        };
        self.send_for_status(method, endpoint, payload, opts).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Payload,
        opts: RequestOptions,
    ) -> ApiResult<T> {
        cancellable(opts.cancel_token(), async {
            let response = self.dispatch(method, endpoint, payload, &opts).await?;
            decode_json(response).await
        })
        .await
    }

    async fn send_discard(
        &self,
        method: Method,
        endpoint: &str,
        payload: Payload,
        opts: RequestOptions,
    ) -> ApiResult<()> {
        cancellable(opts.cancel_token(), async {
            let response = self.dispatch(method, endpoint, payload, &opts).await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.bytes().await?;
                return Err(ApiError::from_error_body(status, &body));
            }
            Ok(())
        })
        .await
    }

    async fn send_for_status(
        &self,
        method: Method,
        endpoint: &str,
        payload: Payload,
        opts: RequestOptions,
    ) -> ApiResult<StatusCode> {
        cancellable(opts.cancel_token(), async {
            let response = self.dispatch(method, endpoint, payload, &opts).await?;
            let status = response.status();
            if opts.fail_on_unauthorized && status == StatusCode::UNAUTHORIZED {
                let body = response.bytes().await?;
                return Err(unauthorized_from_body(&body));
            }
            Ok(status)
        })
        .await
    }

    /// Run the authorization check if needed, then send the real request
    async fn dispatch(
        &self,
        method: Method,
        endpoint: &str,
        payload: Payload,
        opts: &RequestOptions,
    ) -> ApiResult<Response> {
        debug!(target: "client", method = %method, endpoint, "Sending request");

        let url = self.url(endpoint)?;
        let mut builder = self.http.request(method, url);

        if opts.requires_auth() {
            self.check_authorization(endpoint).await?;
            if let Some(token) = self.auth.access_token().await {
                builder = builder.bearer_auth(token);
            }
        }

        Ok(payload.apply(builder).send().await?)
    }

    /// Check access to the endpoint, refreshing the token at most once
    pub(crate) async fn check_authorization(&self, endpoint: &str) -> ApiResult<()> {
        if self.head_status(endpoint).await? != StatusCode::UNAUTHORIZED {
            return Ok(());
        }

        debug!(target: "client", endpoint, "Access check rejected token, refreshing");
        if !self.auth.attempt_refresh(&self.http).await {
            return Err(ApiError::unauthorized());
        }

        if self.head_status(endpoint).await? == StatusCode::UNAUTHORIZED {
            warn!(target: "client", endpoint, "Refreshed access token rejected");
            return Err(ApiError::unauthorized());
        }

        Ok(())
    }

    /// Bare `HEAD` with the current token; never enters the authorization check
    async fn head_status(&self, endpoint: &str) -> ApiResult<StatusCode> {
        debug!(target: "client", endpoint, "Checking authorization");

        let mut builder = self.http.head(self.url(endpoint)?);
        if let Some(token) = self.auth.access_token().await {
            builder = builder.bearer_auth(token);
        }
        Ok(builder.send().await?.status())
    }

    fn url(&self, endpoint: &str) -> ApiResult<Url> {
        let raw = self.config.resolve(endpoint);
        Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", e, raw)))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(ApiError::from_error_body(status, &body));
    }

    serde_json::from_slice(&body).map_err(|e| ApiError::MalformedResponse {
        status,
        message: e.to_string(),
    })
}

/// A `401` on the status path may come with an empty body
fn unauthorized_from_body(body: &[u8]) -> ApiError {
    match ApiError::from_error_body(StatusCode::UNAUTHORIZED, body) {
        err @ ApiError::Unauthorized { .. } => err,
        _ => ApiError::unauthorized(),
    }
}

/// Race `fut` against the cancellation token, if any
pub(crate) async fn cancellable<T, F>(token: Option<&CancellationToken>, fut: F) -> ApiResult<T>
where
    F: Future<Output = ApiResult<T>>,
{
    match token {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(ApiError::Cancelled),
                result = fut => result,
            }
        }
        None => fut.await,
    }
}
