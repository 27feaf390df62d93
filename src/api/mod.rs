pub mod gfy;
pub mod search;
pub mod upload;
pub mod user;

pub use gfy::GfyApi;
pub use search::{SearchApi, TaggedGfyFeed};
pub use upload::UploadApi;
pub use user::UserApi;

/// Page size requested by feed endpoints when the caller does not pick one
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Build a `?k=v&...` query string, skipping absent parameters
pub(crate) fn build_query(params: &[(&str, Option<String>)]) -> String {
    let pairs: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|v| format!("{}={}", key, urlencoding::encode(v)))
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}
