//! Cursor driven feeds and their lazy enumerator.
//!
//! A [`Feed`] is one buffered [`FeedPage`] plus a [`PageFetcher`]: a closure
//! bound to whatever query produced the feed, called with the continuation
//! cursor to obtain the next page. Every feed kind (site search, user gfys,
//! trending tags, ...) is the same type with a different fetcher.

use crate::client::cancellable;
use crate::error::{ApiError, ApiResult};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, Stream};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Future resolving to one page of a feed
pub type PageFuture<T> = BoxFuture<'static, ApiResult<FeedPage<T>>>;

/// Fetches the page at `cursor`; `None` requests the first page
pub type PageFetcher<T> = Arc<dyn Fn(Option<String>) -> PageFuture<T> + Send + Sync>;

/// Wrap an async closure as a [`PageFetcher`]
pub fn page_fetcher<T, F, Fut>(fetch: F) -> PageFetcher<T>
where
    F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult<FeedPage<T>>> + Send + 'static,
{
    Arc::new(move |cursor| fetch(cursor).boxed())
}

/// One page of a paginated collection, in server order
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage<T> {
    items: Vec<T>,
    cursor: Option<String>,
}

impl<T> FeedPage<T> {
    /// An empty cursor string is treated as "no further pages"
    pub fn new(items: Vec<T>, cursor: Option<String>) -> Self {
        Self {
            items,
            cursor: cursor.filter(|c| !c.is_empty()),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_parts(self) -> (Vec<T>, Option<String>) {
        (self.items, self.cursor)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> FeedPage<U> {
        FeedPage {
            items: self.items.into_iter().map(f).collect(),
            cursor: self.cursor,
        }
    }
}

/// A server-backed paginated collection
pub struct Feed<T> {
    page: FeedPage<T>,
    fetcher: PageFetcher<T>,
}

impl<T: Send + 'static> Feed<T> {
    pub fn new(page: FeedPage<T>, fetcher: PageFetcher<T>) -> Self {
        Self { page, fetcher }
    }

    /// Fetch the first page and build the feed from it
    pub async fn open(fetcher: PageFetcher<T>) -> ApiResult<Self> {
        let page = fetcher(None).await?;
        debug!(target: "feed", items = page.len(), has_more = page.has_more(), "Opened feed");
        Ok(Self { page, fetcher })
    }

    /// Items of the buffered page
    pub fn content(&self) -> &[T] {
        self.page.items()
    }

    pub fn cursor(&self) -> Option<&str> {
        self.page.cursor()
    }

    pub fn page(&self) -> &FeedPage<T> {
        &self.page
    }

    /// Fetch the page following this one, or `None` at the end of the feed.
    ///
    /// This feed is left as it was; the result is a new feed.
    pub async fn next_page(&self) -> ApiResult<Option<Feed<T>>> {
        let Some(cursor) = self.page.cursor() else {
            return Ok(None);
        };
        let page = (self.fetcher)(Some(cursor.to_string())).await?;
        Ok(Some(Feed::new(page, self.fetcher.clone())))
    }

    /// Re-run the original query from its first page
    pub async fn rewind(&self) -> ApiResult<Feed<T>> {
        Feed::open(self.fetcher.clone()).await
    }

    /// Traverse this feed item by item, starting at the buffered page
    pub fn into_enumerator(self) -> FeedEnumerator<T> {
        FeedEnumerator::new(self.page, self.fetcher)
    }

    pub fn into_stream(self) -> impl Stream<Item = ApiResult<T>> + Send {
        self.into_enumerator().into_stream()
    }
}

impl<T: Clone + Send + 'static> Feed<T> {
    /// Enumerator over a copy of the buffered page; this feed stays usable
    pub fn enumerator(&self) -> FeedEnumerator<T> {
        FeedEnumerator::new(self.page.clone(), self.fetcher.clone())
    }
}

impl<T: Clone> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self {
            page: self.page.clone(),
            fetcher: self.fetcher.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Feed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feed")
            .field("page", &self.page)
            .finish_non_exhaustive()
    }
}

/// Enumerator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumeratorState {
    NotStarted,
    /// Buffered items may remain
    InPage,
    /// Waiting on the next page. Also the state an abandoned fetch leaves
    /// behind, after which the enumerator refuses to continue.
    FetchingNext,
    Exhausted,
}

/// Forward-only traversal over a feed.
///
/// Pages are fetched one at a time, only once the buffered items run out.
pub struct FeedEnumerator<T> {
    buffer: std::vec::IntoIter<T>,
    cursor: Option<String>,
    fetcher: PageFetcher<T>,
    state: EnumeratorState,
    cancel_token: Option<CancellationToken>,
    pages_fetched: usize,
}

impl<T: Send + 'static> FeedEnumerator<T> {
    pub fn new(page: FeedPage<T>, fetcher: PageFetcher<T>) -> Self {
        let (items, cursor) = page.into_parts();
        Self {
            buffer: items.into_iter(),
            cursor,
            fetcher,
            state: EnumeratorState::NotStarted,
            cancel_token: None,
            pages_fetched: 0,
        }
    }

    /// Abandon in-flight page fetches when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn state(&self) -> EnumeratorState {
        self.state
    }

    /// Cursor of the next page to fetch
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Pages fetched by this enumerator, not counting the one it started with
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Next item, or `None` once the feed has no further pages.
    ///
    /// A failed fetch keeps the cursor, so calling `advance` again retries the
    /// same page. A cancelled fetch poisons the enumerator.
    pub async fn advance(&mut self) -> ApiResult<Option<T>> {
        match self.state {
            EnumeratorState::Exhausted => return Ok(None),
            EnumeratorState::FetchingNext => return Err(ApiError::Cancelled),
            EnumeratorState::NotStarted => self.state = EnumeratorState::InPage,
            EnumeratorState::InPage => {}
        }

        loop {
            if let Some(item) = self.buffer.next() {
                return Ok(Some(item));
            }

            let Some(cursor) = self.cursor.clone() else {
                debug!(target: "feed", pages = self.pages_fetched, "Feed exhausted");
                self.state = EnumeratorState::Exhausted;
                return Ok(None);
            };

            self.state = EnumeratorState::FetchingNext;
            debug!(target: "feed", cursor = %cursor, "Fetching next page");

            let fetch = (self.fetcher)(Some(cursor));
            let page = match cancellable(self.cancel_token.as_ref(), fetch).await {
                Ok(page) => page,
                Err(ApiError::Cancelled) => {
                    warn!(target: "feed", "Page fetch cancelled");
                    return Err(ApiError::Cancelled);
                }
                Err(e) => {
                    self.state = EnumeratorState::InPage;
                    return Err(e);
                }
            };

            self.pages_fetched += 1;
            let (items, next_cursor) = page.into_parts();
            debug!(
                target: "feed",
                items = items.len(),
                has_more = next_cursor.is_some(),
                "Fetched page"
            );
            self.buffer = items.into_iter();
            self.cursor = next_cursor;
            self.state = EnumeratorState::InPage;
        }
    }

    /// Adapt into a stream; the stream ends after the first error
    pub fn into_stream(self) -> impl Stream<Item = ApiResult<T>> + Send {
        stream::try_unfold(self, |mut enumerator| async move {
            let next = enumerator.advance().await?;
            Ok::<_, ApiError>(next.map(|item| (item, enumerator)))
        })
    }

    /// Drain the remaining items into a vector
    pub async fn collect_all(mut self) -> ApiResult<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.advance().await? {
            items.push(item);
        }
        Ok(items)
    }
}
