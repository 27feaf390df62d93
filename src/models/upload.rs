use serde::{Deserialize, Serialize};

use super::gfy::NsfwSetting;

/// Options sent when requesting an upload key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GfyCreationParameters {
    /// Let the server fetch the media from this URL instead of a direct upload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<NsfwSetting>,
    #[serde(rename = "private", skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    /// Skip duplicate detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_md5: Option<bool>,
}

/// Key returned by `POST /gfycats`, naming the gfy being created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadKey {
    #[serde(default)]
    pub is_ok: bool,
    #[serde(rename = "gfyname")]
    pub name: String,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub upload_type: Option<String>,
}

/// Server side processing stage of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadTask {
    Encoding,
    Complete,
    // Sic: the service spells it this way.
    #[serde(rename = "NotFoundo", alias = "notfound")]
    NotFound,
    Error,
    #[serde(other)]
    Unknown,
}

/// Body of `GET /gfycats/fetch/status/{name}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GfyStatus {
    pub task: UploadTask,
    /// Suggested seconds to wait before polling again
    #[serde(default)]
    pub time: u64,
    #[serde(rename = "gfyname", default)]
    pub name: Option<String>,
    #[serde(default, alias = "errorMessage")]
    pub error_description: Option<String>,
}
