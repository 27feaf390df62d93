use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum number of tags a gfy may carry
pub const MAX_TAGS: usize = 20;

/// Content rating of a gfy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NsfwSetting {
    #[default]
    Clean,
    Adult,
    Permissive,
}

impl NsfwSetting {
    pub fn as_code(self) -> u8 {
        match self {
            NsfwSetting::Clean => 0,
            NsfwSetting::Adult => 1,
            NsfwSetting::Permissive => 3,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(NsfwSetting::Clean),
            1 => Some(NsfwSetting::Adult),
            3 => Some(NsfwSetting::Permissive),
            _ => None,
        }
    }
}

impl Serialize for NsfwSetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_code())
    }
}

// The service sends the rating as either "1" or 1 depending on the endpoint.
impl<'de> Deserialize<'de> for NsfwSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Code {
            Number(u8),
            Text(String),
        }

        let code = match Code::deserialize(deserializer)? {
            Code::Number(n) => n,
            Code::Text(s) => s.trim().parse().map_err(serde::de::Error::custom)?,
        };
        NsfwSetting::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown nsfw code {}", code)))
    }
}

/// Renditions a gfy is served in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GfyFormat {
    Mp4,
    MobileMp4,
    MiniMp4,
    Thumb360,
    ReverseMp4,
    Webm,
    Webp,
    Mjpg,
    Gif,
    SizeRestricted,
    Max14mb,
    Small,
    Max1mb,
    Max100pxWidth,
}

/// A short, looped, soundless video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gfy {
    #[serde(rename = "gfyId")]
    pub id: String,
    #[serde(rename = "gfyName", default)]
    pub name: String,
    #[serde(rename = "gfyNumber", default)]
    pub number: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "userName", default)]
    pub username: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nsfw: NsfwSetting,
    #[serde(default)]
    pub published: Option<u8>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub dislikes: Option<u64>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub frame_rate: Option<f64>,
    #[serde(rename = "numFrames", default)]
    pub number_of_frames: Option<f64>,
    #[serde(rename = "avgColor", default)]
    pub average_color: Option<String>,
    /// Unix seconds
    #[serde(rename = "createDate", default)]
    pub create_date: Option<i64>,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub mp4_url: Option<String>,
    #[serde(default)]
    pub webm_url: Option<String>,
    #[serde(default)]
    pub webp_url: Option<String>,
    #[serde(default)]
    pub gif_url: Option<String>,
    #[serde(default)]
    pub mobile_url: Option<String>,
    #[serde(default)]
    pub mobile_poster_url: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub thumb360_url: Option<String>,
    #[serde(default)]
    pub thumb360_poster_url: Option<String>,
    #[serde(default)]
    pub thumb100_poster_url: Option<String>,
    #[serde(rename = "max5mbGif", default)]
    pub max5mb_gif: Option<String>,
    #[serde(rename = "max2mbGif", default)]
    pub max2mb_gif: Option<String>,
    #[serde(rename = "max1mbGif", default)]
    pub max1mb_gif: Option<String>,
    #[serde(default)]
    pub mjpg_url: Option<String>,
    #[serde(default)]
    pub mp4_size: Option<u64>,
    #[serde(default)]
    pub webm_size: Option<u64>,
    #[serde(default)]
    pub gif_size: Option<u64>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub domain_whitelist: Vec<String>,
}

impl Gfy {
    /// Share page URL
    pub fn url(&self) -> String {
        format!("https://gfycat.com/{}", self.name)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.create_date
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    pub fn is_published(&self) -> bool {
        self.published == Some(1)
    }

    pub fn reverse_mp4_url(&self) -> Option<String> {
        let mp4 = self.mp4_url.as_deref()?;
        let idx = mp4.rfind(".mp4")?;
        Some(format!("{}-reverse{}", &mp4[..idx], &mp4[idx..]))
    }

    /// URL of the requested rendition, if the gfy has one
    pub fn format_url(&self, format: GfyFormat) -> Option<String> {
        let thumbs = |suffix: &str| Some(format!("https://thumbs.gfycat.com/{}{}", self.name, suffix));
        match format {
            GfyFormat::Mp4 => self.mp4_url.clone(),
            GfyFormat::MobileMp4 => self.mobile_url.clone(),
            GfyFormat::MiniMp4 => thumbs("-mini.mp4"),
            GfyFormat::Thumb360 => self.thumb360_url.clone(),
            GfyFormat::ReverseMp4 => self.reverse_mp4_url(),
            GfyFormat::Webm => self.webm_url.clone(),
            GfyFormat::Webp => self.webp_url.clone(),
            GfyFormat::Mjpg => self.mjpg_url.clone(),
            GfyFormat::Gif => self.gif_url.clone(),
            GfyFormat::SizeRestricted => self.max5mb_gif.clone(),
            GfyFormat::Max14mb => thumbs("-14mb.gif"),
            GfyFormat::Small => self.max2mb_gif.clone(),
            GfyFormat::Max1mb => self.max1mb_gif.clone(),
            GfyFormat::Max100pxWidth => thumbs("-100px.gif"),
        }
    }
}

/// Envelope of `GET /gfycats/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GfyResponse {
    #[serde(rename = "gfyItem")]
    pub gfy_item: Gfy,
}

/// Body of single-value modification endpoints (title, description, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueRequest<T> {
    pub value: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainWhitelist {
    #[serde(rename = "domainWhitelist", default)]
    pub domains: Vec<String>,
}
