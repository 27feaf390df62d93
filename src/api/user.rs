use crate::client::{Client, RequestOptions};
use crate::error::ApiResult;
use crate::models::user::*;
use async_trait::async_trait;
use reqwest::Method;

/// User profile API methods
#[async_trait]
pub trait UserApi {
    /// Get a user's public profile
    async fn get_user(&self, user_id: &str) -> ApiResult<User>;

    /// Get the authenticated user
    async fn get_current_user(&self) -> ApiResult<CurrentUser>;

    /// Check whether a username is taken; no credentials are sent
    async fn user_exists(&self, username: &str) -> ApiResult<bool>;
}

#[async_trait]
impl UserApi for Client {
    async fn get_user(&self, user_id: &str) -> ApiResult<User> {
        self.get(
            &format!("/users/{}", urlencoding::encode(user_id)),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_current_user(&self) -> ApiResult<CurrentUser> {
        self.get("/me", RequestOptions::new()).await
    }

    async fn user_exists(&self, username: &str) -> ApiResult<bool> {
        let status = self
            .status(
                Method::HEAD,
                &format!("/users/{}", urlencoding::encode(username)),
                RequestOptions::new().no_credential(),
            )
            .await?;
        Ok(status.is_success())
    }
}
