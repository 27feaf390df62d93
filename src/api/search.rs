use crate::api::{DEFAULT_PAGE_SIZE, build_query};
use crate::client::{Client, RequestOptions};
use crate::error::{ApiError, ApiResult};
use crate::feed::{Feed, FeedPage, PageFetcher, page_fetcher};
use crate::models::feed::*;
use crate::models::gfy::Gfy;
use async_trait::async_trait;

/// A trending tag and the feed of gfys carrying it
#[derive(Debug, Clone)]
pub struct TaggedGfyFeed {
    pub tag: String,
    pub feed: Feed<Gfy>,
}

/// Search and browsing feeds.
///
/// Each method fetches the first page eagerly; later pages are fetched on
/// demand by the returned [`Feed`].
#[async_trait]
pub trait SearchApi {
    /// Search every public gfy on the site
    async fn search_site(&self, search_text: &str, count: Option<u32>) -> ApiResult<Feed<Gfy>>;

    /// Search the current user's gfys
    async fn search_current_user(
        &self,
        search_text: &str,
        count: Option<u32>,
    ) -> ApiResult<Feed<Gfy>>;

    /// Public gfys of a user
    async fn user_gfy_feed(&self, user_id: &str, count: Option<u32>) -> ApiResult<Feed<Gfy>>;

    /// All gfys of the current user, private ones included
    async fn current_user_gfy_feed(&self, count: Option<u32>) -> ApiResult<Feed<Gfy>>;

    /// Trending gfys, optionally restricted to one tag
    async fn trending_gfys(&self, tag: Option<&str>, count: Option<u32>) -> ApiResult<Feed<Gfy>>;

    /// Trending tags, each populated with its first page of gfys
    async fn trending_tags_populated(
        &self,
        tag_count: Option<u32>,
        gfy_count: Option<u32>,
    ) -> ApiResult<Feed<TaggedGfyFeed>>;
}

#[async_trait]
impl SearchApi for Client {
    async fn search_site(&self, search_text: &str, count: Option<u32>) -> ApiResult<Feed<Gfy>> {
        let fetcher = gfy_feed_fetcher(
            self,
            "/gfycats/search",
            vec![
                ("search_text", Some(search_text.to_string())),
                ("count", Some(page_size(count))),
            ],
        );
        Feed::open(fetcher).await
    }

    async fn search_current_user(
        &self,
        search_text: &str,
        count: Option<u32>,
    ) -> ApiResult<Feed<Gfy>> {
        let fetcher = gfy_feed_fetcher(
            self,
            "/me/gfycats/search",
            vec![
                ("search_text", Some(search_text.to_string())),
                ("count", Some(page_size(count))),
            ],
        );
        Feed::open(fetcher).await
    }

    async fn user_gfy_feed(&self, user_id: &str, count: Option<u32>) -> ApiResult<Feed<Gfy>> {
        let fetcher = gfy_feed_fetcher(
            self,
            &format!("/users/{}/gfycats", urlencoding::encode(user_id)),
            vec![("count", Some(page_size(count)))],
        );
        Feed::open(fetcher).await
    }

    async fn current_user_gfy_feed(&self, count: Option<u32>) -> ApiResult<Feed<Gfy>> {
        let fetcher = gfy_feed_fetcher(
            self,
            "/me/gfycats",
            vec![("count", Some(page_size(count)))],
        );
        Feed::open(fetcher).await
    }

    async fn trending_gfys(&self, tag: Option<&str>, count: Option<u32>) -> ApiResult<Feed<Gfy>> {
        Feed::open(trending_fetcher(self, tag.map(str::to_string), count)).await
    }

    async fn trending_tags_populated(
        &self,
        tag_count: Option<u32>,
        gfy_count: Option<u32>,
    ) -> ApiResult<Feed<TaggedGfyFeed>> {
        let client = self.clone();
        let fetcher = page_fetcher(move |cursor: Option<String>| {
            let client = client.clone();
            let endpoint = format!(
                "/tags/trending/populated{}",
                build_query(&[
                    ("tagCount", tag_count.map(|c| c.to_string())),
                    ("gfyCount", gfy_count.map(|c| c.to_string())),
                    ("cursor", cursor),
                ])
            );
            async move {
                let model: TrendingTagsModel = client.get(&endpoint, RequestOptions::new()).await?;
                let tags: Vec<TaggedGfyFeed> = model
                    .tags
                    .into_iter()
                    .map(|tag| TaggedGfyFeed::from_model(&client, tag, gfy_count))
                    .collect();
                Ok::<_, ApiError>(FeedPage::new(tags, model.cursor))
            }
        });
        Feed::open(fetcher).await
    }
}

impl TaggedGfyFeed {
    /// The first page arrives with the tag; later pages come from the
    /// trending endpoint filtered by that tag.
    fn from_model(client: &Client, model: TrendingTagModel, gfy_count: Option<u32>) -> Self {
        let page = FeedPage::new(model.gfycats, model.cursor);
        let fetcher = trending_fetcher(client, Some(model.tag.clone()), gfy_count);
        Self {
            tag: model.tag,
            feed: Feed::new(page, fetcher),
        }
    }
}

fn page_size(count: Option<u32>) -> String {
    count.unwrap_or(DEFAULT_PAGE_SIZE).to_string()
}

fn trending_fetcher(client: &Client, tag: Option<String>, count: Option<u32>) -> PageFetcher<Gfy> {
    gfy_feed_fetcher(
        client,
        "/gfycats/trending",
        vec![("tagName", tag), ("count", Some(page_size(count)))],
    )
}

/// Fetcher for any endpoint answering with a [`GfyFeedModel`]
fn gfy_feed_fetcher(
    client: &Client,
    path: &str,
    params: Vec<(&'static str, Option<String>)>,
) -> PageFetcher<Gfy> {
    let client = client.clone();
    let path = path.to_string();
    page_fetcher(move |cursor: Option<String>| {
        let client = client.clone();
        let mut query = params.clone();
        query.push(("cursor", cursor));
        let endpoint = format!("{}{}", path, build_query(&query));
        async move {
            let model: GfyFeedModel = client.get(&endpoint, RequestOptions::new()).await?;
            Ok::<_, ApiError>(FeedPage::from(model))
        }
    })
}
