//! Credential ownership and token lifecycle.
//!
//! The container never looks at token expiry. A stale access token is only
//! discovered when the server rejects it, at which point the transport asks
//! the container to refresh.

use crate::error::{ApiError, ApiResult};
use crate::models::auth::{TokenRequest, TokenResponse};
use reqwest::Client as HttpClient;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Bearer credentials held by the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }

    /// Token type sent in the authorization header
    pub fn token_type(&self) -> &'static str {
        "Bearer"
    }
}

impl From<TokenResponse> for Credentials {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        }
    }
}

/// Owns the current credentials and the token endpoint they are exchanged at.
///
/// Shared by every request issued through one [`crate::Client`]. Concurrent
/// refreshes are not deduplicated; each successful one simply replaces the
/// stored credentials.
pub struct AuthContainer {
    token_url: String,
    client_id: String,
    client_secret: String,
    credentials: RwLock<Option<Credentials>>,
}

impl AuthContainer {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            credentials: RwLock::new(None),
        }
    }

    /// Current access token, possibly stale
    pub async fn access_token(&self) -> Option<String> {
        self.credentials
            .read()
            .await
            .as_ref()
            .map(|c| c.access_token.clone())
    }

    /// Snapshot of the held credentials
    pub async fn credentials(&self) -> Option<Credentials> {
        self.credentials.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.credentials.read().await.is_some()
    }

    /// Replace the held credentials
    pub async fn set_tokens(&self, access_token: String, refresh_token: Option<String>) {
        *self.credentials.write().await = Some(Credentials::new(access_token, refresh_token));
    }

    pub async fn clear_tokens(&self) {
        *self.credentials.write().await = None;
    }

    /// Acquire credentials with the client credentials grant
    pub async fn authenticate_client(&self, http: &HttpClient) -> ApiResult<Credentials> {
        let request = TokenRequest::client_credentials(&self.client_id, &self.client_secret);
        self.exchange(http, &request).await
    }

    /// Acquire credentials for a user account with the password grant
    pub async fn authenticate_password(
        &self,
        http: &HttpClient,
        username: &str,
        password: &str,
    ) -> ApiResult<Credentials> {
        let request =
            TokenRequest::password(&self.client_id, &self.client_secret, username, password);
        self.exchange(http, &request).await
    }

    /// Exchange the held refresh token for new credentials.
    ///
    /// On failure the previous credentials are left untouched.
    pub async fn refresh(&self, http: &HttpClient) -> ApiResult<Credentials> {
        let refresh_token = self
            .credentials
            .read()
            .await
            .as_ref()
            .and_then(|c| c.refresh_token.clone())
            .ok_or_else(|| ApiError::RefreshFailed("no refresh token held".to_string()))?;

        let request = TokenRequest::refresh(&self.client_id, &self.client_secret, &refresh_token);
        let response = self
            .request_token(http, &request)
            .await
            .map_err(|e| ApiError::RefreshFailed(e.to_string()))?;

        // Some servers omit the refresh token on refresh; keep the one we used.
        let mut credentials = Credentials::from(response);
        if credentials.refresh_token.is_none() {
            credentials.refresh_token = Some(refresh_token);
        }

        *self.credentials.write().await = Some(credentials.clone());
        info!(target: "client::auth", "Access token refreshed");
        Ok(credentials)
    }

    /// Refresh without raising; a rejected refresh is reported as `false`.
    pub async fn attempt_refresh(&self, http: &HttpClient) -> bool {
        match self.refresh(http).await {
            Ok(_) => true,
            Err(e) => {
                warn!(target: "client::auth", error = %e, "Token refresh failed");
                false
            }
        }
    }

    async fn exchange(&self, http: &HttpClient, request: &TokenRequest) -> ApiResult<Credentials> {
        let credentials = Credentials::from(self.request_token(http, request).await?);
        *self.credentials.write().await = Some(credentials.clone());
        info!(target: "client::auth", grant = ?request.grant_type, "Credentials acquired");
        Ok(credentials)
    }

    async fn request_token(
        &self,
        http: &HttpClient,
        request: &TokenRequest,
    ) -> ApiResult<TokenResponse> {
        debug!(
            target: "client::auth",
            url = %self.token_url,
            grant = ?request.grant_type,
            "Requesting token"
        );

        let response = http.post(&self.token_url).json(request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ApiError::from_error_body(status, &body));
        }

        serde_json::from_slice(&body).map_err(|e| ApiError::MalformedResponse {
            status,
            message: format!("invalid token response: {}", e),
        })
    }
}

impl std::fmt::Debug for AuthContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContainer")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}
