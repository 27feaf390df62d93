//! # Gfycat API Client
//!
//! A Rust client for the Gfycat REST API with transparent token refresh and
//! lazily paginated feeds.
//!
//! ## Features
//!
//! - Authorization check before every authenticated call, with one token refresh on `401`
//! - Cursor driven feeds that fetch pages only when enumeration reaches them
//! - Type-safe API methods grouped into traits
//! - Cancellable uploads
//!
//! ## Example
//!
//! ```no_run
//! use gfycat_api::{Client, ClientConfig};
//! use gfycat_api::api::{GfyApi, SearchApi};
//! use futures::TryStreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::default().with_client_credentials("id", "secret");
//!     let client = Client::new(config);
//!
//!     // Log in once; expired tokens are refreshed on demand
//!     client.login("user", "password").await?;
//!
//!     let gfy = client.get_gfy("happycat").await?;
//!     println!("{}", gfy.url());
//!
//!     // Pages after the first are fetched while the stream is consumed
//!     let feed = client.search_site("cats", None).await?;
//!     let gfys: Vec<_> = feed.into_stream().try_collect().await?;
//!     println!("found {} gfys", gfys.len());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod feed;
pub mod logging;
pub mod models;

#[cfg(test)]
mod test_support;

pub use auth::{AuthContainer, Credentials};
pub use client::{Client, ClientConfig, RequestOptions};
pub use error::{ApiError, ApiResult};
pub use feed::{EnumeratorState, Feed, FeedEnumerator, FeedPage, page_fetcher};
pub use logging::{LogConfig, LogGuard, init_logging};
