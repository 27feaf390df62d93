use crate::api::user::UserApi;
use crate::client::{Client, RequestOptions};
use crate::error::{ApiError, ApiResult};
use crate::models::gfy::*;
use crate::models::user::User;
use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

/// Gfy lookup and owner-side modification
#[async_trait]
pub trait GfyApi {
    /// Get a gfy by id
    async fn get_gfy(&self, id: &str) -> ApiResult<Gfy>;

    /// Delete one of the current user's gfys
    async fn delete_gfy(&self, id: &str) -> ApiResult<()>;

    async fn modify_title(&self, id: &str, title: &str) -> ApiResult<()>;

    async fn delete_title(&self, id: &str) -> ApiResult<()>;

    async fn modify_description(&self, id: &str, description: &str) -> ApiResult<()>;

    async fn delete_description(&self, id: &str) -> ApiResult<()>;

    /// Replace the tags of a gfy; at most [`MAX_TAGS`] are accepted
    async fn modify_tags(&self, id: &str, tags: &[String]) -> ApiResult<()>;

    async fn modify_published(&self, id: &str, published: bool) -> ApiResult<()>;

    async fn modify_nsfw(&self, id: &str, setting: NsfwSetting) -> ApiResult<()>;

    async fn like_gfy(&self, id: &str) -> ApiResult<()>;

    async fn unlike_gfy(&self, id: &str) -> ApiResult<()>;

    /// Domains allowed to embed the gfy
    async fn get_domain_whitelist(&self, id: &str) -> ApiResult<Vec<String>>;
}

#[async_trait]
impl GfyApi for Client {
    async fn get_gfy(&self, id: &str) -> ApiResult<Gfy> {
        let response: GfyResponse = self
            .get(&format!("/gfycats/{}", urlencoding::encode(id)), RequestOptions::new())
            .await?;
        Ok(response.gfy_item)
    }

    async fn delete_gfy(&self, id: &str) -> ApiResult<()> {
        debug!(target: "api::gfy", id, "Deleting gfy");
        self.execute(
            Method::DELETE,
            &format!("/me/gfycats/{}", urlencoding::encode(id)),
            RequestOptions::new(),
        )
        .await
    }

    async fn modify_title(&self, id: &str, title: &str) -> ApiResult<()> {
        self.put_value(id, "title", title).await
    }

    async fn delete_title(&self, id: &str) -> ApiResult<()> {
        self.delete_property(id, "title").await
    }

    async fn modify_description(&self, id: &str, description: &str) -> ApiResult<()> {
        self.put_value(id, "description", description).await
    }

    async fn delete_description(&self, id: &str) -> ApiResult<()> {
        self.delete_property(id, "description").await
    }

    async fn modify_tags(&self, id: &str, tags: &[String]) -> ApiResult<()> {
        if tags.len() > MAX_TAGS {
            return Err(ApiError::InvalidArgument(format!(
                "{} tags given, at most {} are allowed",
                tags.len(),
                MAX_TAGS
            )));
        }
        self.put_value(id, "tags", tags).await
    }

    async fn modify_published(&self, id: &str, published: bool) -> ApiResult<()> {
        self.put_value(id, "published", u8::from(published)).await
    }

    async fn modify_nsfw(&self, id: &str, setting: NsfwSetting) -> ApiResult<()> {
        self.put_value(id, "nsfw", setting).await
    }

    async fn like_gfy(&self, id: &str) -> ApiResult<()> {
        self.put_value(id, "like", 1u8).await
    }

    async fn unlike_gfy(&self, id: &str) -> ApiResult<()> {
        self.put_value(id, "like", 0u8).await
    }

    async fn get_domain_whitelist(&self, id: &str) -> ApiResult<Vec<String>> {
        let whitelist: DomainWhitelist = self
            .get(
                &format!("/me/gfycats/{}/domain-whitelist", urlencoding::encode(id)),
                RequestOptions::new(),
            )
            .await?;
        Ok(whitelist.domains)
    }
}

impl Client {
    async fn put_value<V>(&self, id: &str, property: &str, value: V) -> ApiResult<()>
    where
        V: serde::Serialize + Send + Sync,
    {
        debug!(target: "api::gfy", id, property, "Modifying gfy");
        self.execute_with_json(
            Method::PUT,
            &format!("/me/gfycats/{}/{}", urlencoding::encode(id), property),
            &ValueRequest { value },
            RequestOptions::new(),
        )
        .await
    }

    async fn delete_property(&self, id: &str, property: &str) -> ApiResult<()> {
        debug!(target: "api::gfy", id, property, "Clearing gfy property");
        self.execute(
            Method::DELETE,
            &format!("/me/gfycats/{}/{}", urlencoding::encode(id), property),
            RequestOptions::new(),
        )
        .await
    }
}

impl Gfy {
    /// Fetch the current server copy of this gfy
    pub async fn reload(&self, client: &Client) -> ApiResult<Gfy> {
        client.get_gfy(&self.id).await
    }

    /// Profile of the uploader, or `None` for anonymous uploads
    pub async fn creator(&self, client: &Client) -> ApiResult<Option<User>> {
        match self.username.as_deref() {
            None | Some("anonymous") => Ok(None),
            Some(username) => client.get_user(username).await.map(Some),
        }
    }
}
