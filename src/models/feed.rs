use super::gfy::Gfy;
use crate::feed::FeedPage;
use serde::{Deserialize, Serialize};

/// A page of gfys as returned by search, user and trending endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GfyFeedModel {
    #[serde(default)]
    pub gfycats: Vec<Gfy>,
    #[serde(default)]
    pub cursor: Option<String>,
    /// Only present on search results
    #[serde(default)]
    pub found: Option<u64>,
}

impl From<GfyFeedModel> for FeedPage<Gfy> {
    fn from(model: GfyFeedModel) -> Self {
        FeedPage::new(model.gfycats, model.cursor)
    }
}

/// A trending tag together with the first page of its gfys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingTagModel {
    pub tag: String,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub gfycats: Vec<Gfy>,
}

/// A page of trending tags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendingTagsModel {
    #[serde(default)]
    pub tags: Vec<TrendingTagModel>,
    #[serde(default)]
    pub cursor: Option<String>,
}
