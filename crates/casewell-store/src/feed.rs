//! Cursor-based pagination over ordered remote collections
//!
//! A [`PagedFeed`] tracks one scope's position (cursor + exhaustion flag)
//! and serializes page requests so the same cursor is never requested twice
//! concurrently. Because cursors cover disjoint ranges under a stable sort
//! key, appending sequential pages never duplicates items and never needs
//! de-duplication.

use crate::error::StoreError;
use casewell_domain::traits::{Cursor, Page};
use std::fmt;
use std::future::Future;
use tracing::debug;

/// Fixed page size for history feeds
pub const PAGE_SIZE: usize = 10;

/// Items returned by one `load_page` call, plus the feed's position after it
#[derive(Debug, Clone)]
pub struct FeedPage<T> {
    /// Newly fetched items, in collection order; append after previously
    /// fetched items to extend the collection
    pub items: Vec<T>,
    /// Whether another page may exist
    pub has_more: bool,
}

#[derive(Debug)]
struct FeedPosition {
    cursor: Option<Cursor>,
    has_more: bool,
}

/// Serialized cursor state for one paginated scope
///
/// The fetch itself is supplied per call, so one feed type covers both
/// scopes (cases by owner, messages by case); the caller's closure captures
/// the scope.
#[derive(Debug)]
pub struct PagedFeed {
    page_size: usize,
    position: tokio::sync::Mutex<FeedPosition>,
}

impl Default for PagedFeed {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl PagedFeed {
    /// Create a feed positioned at the beginning
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            position: tokio::sync::Mutex::new(FeedPosition {
                cursor: None,
                has_more: true,
            }),
        }
    }

    /// Fetch the next page through `fetch(cursor, limit)`
    ///
    /// Holds the feed lock across the fetch: concurrent calls on the same
    /// feed serialize, each observing the cursor left by the previous one.
    /// Once the feed is exhausted, returns an empty page without fetching.
    /// On `RemoteUnavailable` the position is left unchanged, so the same
    /// page can be retried.
    pub async fn load_page<T, F, Fut, E>(&self, fetch: F) -> Result<FeedPage<T>, StoreError>
    where
        F: FnOnce(Option<Cursor>, usize) -> Fut,
        Fut: Future<Output = Result<Page<T>, E>>,
        E: fmt::Display,
    {
        let mut position = self.position.lock().await;

        if !position.has_more {
            debug!("feed exhausted, skipping fetch");
            return Ok(FeedPage {
                items: Vec::new(),
                has_more: false,
            });
        }

        let page = fetch(position.cursor.clone(), self.page_size)
            .await
            .map_err(|e| StoreError::RemoteUnavailable(e.to_string()))?;

        // A short page always terminates the feed, whatever the store said.
        let has_more = page.has_more && page.items.len() >= self.page_size;
        position.cursor = page.next_cursor;
        position.has_more = has_more;

        debug!(
            fetched = page.items.len(),
            has_more, "feed page loaded"
        );

        Ok(FeedPage {
            items: page.items,
            has_more,
        })
    }

    /// Return the feed to the beginning (e.g. on sign-out or case switch)
    pub async fn reset(&self) {
        let mut position = self.position.lock().await;
        position.cursor = None;
        position.has_more = true;
    }

    /// Whether another page may exist
    pub async fn has_more(&self) -> bool {
        self.position.lock().await.has_more
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casewell_domain::traits::{Cursor, Page};
    use std::convert::Infallible;

    /// Fake source: the integers 0..total, paged by cursor = last index.
    async fn fetch_ints(
        total: usize,
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<Page<usize>, Infallible> {
        let start = cursor
            .map(|c| c.as_str().parse::<usize>().unwrap() + 1)
            .unwrap_or(0);
        let end = (start + limit).min(total);
        let items: Vec<usize> = (start..end).collect();
        let next_cursor = items.last().map(|last| Cursor::new(last.to_string()));
        Ok(Page {
            has_more: end < total,
            items,
            next_cursor,
        })
    }

    #[tokio::test]
    async fn test_sequential_pages_are_disjoint() {
        let feed = PagedFeed::new(10);

        let first = feed
            .load_page(|cursor, limit| fetch_ints(25, cursor, limit))
            .await
            .unwrap();
        let second = feed
            .load_page(|cursor, limit| fetch_ints(25, cursor, limit))
            .await
            .unwrap();

        let mut all: Vec<usize> = first.items.clone();
        all.extend(second.items.clone());

        assert_eq!(all, (0..20).collect::<Vec<_>>());
        let mut deduped = all.clone();
        deduped.dedup();
        assert_eq!(all, deduped, "no id may appear twice across pages");
        assert!(second.has_more);
    }

    #[tokio::test]
    async fn test_short_page_terminates_feed() {
        let feed = PagedFeed::new(10);

        for _ in 0..2 {
            feed.load_page(|cursor, limit| fetch_ints(25, cursor, limit))
                .await
                .unwrap();
        }
        let last = feed
            .load_page(|cursor, limit| fetch_ints(25, cursor, limit))
            .await
            .unwrap();

        assert_eq!(last.items, vec![20, 21, 22, 23, 24]);
        assert!(!last.has_more);

        // Exhausted: further loads are no-op and do not touch the source.
        let after = feed
            .load_page::<usize, _, _, Infallible>(|_, _| async { panic!("must not fetch past the end") })
            .await
            .unwrap();
        assert!(after.items.is_empty());
    }

    #[tokio::test]
    async fn test_reset_returns_to_beginning() {
        let feed = PagedFeed::new(10);
        feed.load_page(|cursor, limit| fetch_ints(5, cursor, limit))
            .await
            .unwrap();
        assert!(!feed.has_more().await);

        feed.reset().await;
        let again = feed
            .load_page(|cursor, limit| fetch_ints(5, cursor, limit))
            .await
            .unwrap();
        assert_eq!(again.items, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_position_unchanged() {
        let feed = PagedFeed::new(10);
        feed.load_page(|cursor, limit| fetch_ints(25, cursor, limit))
            .await
            .unwrap();

        let failed = feed
            .load_page(|_, _| async { Err::<Page<usize>, _>("network down") })
            .await;
        assert!(matches!(failed, Err(StoreError::RemoteUnavailable(_))));

        // Retry resumes from the same cursor.
        let retry = feed
            .load_page(|cursor, limit| fetch_ints(25, cursor, limit))
            .await
            .unwrap();
        assert_eq!(retry.items, (10..20).collect::<Vec<_>>());
    }
}
