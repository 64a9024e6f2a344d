//! Crawler-facing storage interfaces.
//!
//! A crawler depends on these traits rather than on [`CrawlStore`] directly, so the
//! visited set, cookie jar and request queue can be swapped independently.

use url::Url;

use crate::store::{CrawlStore, StoreResult};
use crate::url_utils::cookie_host;

/// Deduplication of already processed requests, keyed by fingerprint.
pub trait VisitedStorage {
    fn visited(&self, request_id: u64) -> StoreResult<()>;

    /// True if `request_id` was previously passed to [`visited`](Self::visited).
    fn is_visited(&self, request_id: u64) -> StoreResult<bool>;
}

/// Per-host cookie persistence. No error channel: failures degrade to "no cookies".
pub trait CookieStorage {
    fn set_cookies(&self, url: &Url, cookies: &str);
    fn cookies(&self, url: &Url) -> String;
}

/// FIFO queue of serialized requests.
pub trait QueueStorage {
    fn add_request(&self, request: &[u8]) -> StoreResult<()>;
    fn get_request(&self) -> StoreResult<Vec<u8>>;
    fn queue_size(&self) -> StoreResult<usize>;
}

impl VisitedStorage for CrawlStore {
    fn visited(&self, request_id: u64) -> StoreResult<()> {
        self.mark_visited(request_id)
    }

    fn is_visited(&self, request_id: u64) -> StoreResult<bool> {
        CrawlStore::is_visited(self, request_id)
    }
}

impl CookieStorage for CrawlStore {
    fn set_cookies(&self, url: &Url, cookies: &str) {
        CrawlStore::set_cookies(self, &cookie_host(url), cookies)
    }

    fn cookies(&self, url: &Url) -> String {
        CrawlStore::cookies(self, &cookie_host(url))
    }
}

impl QueueStorage for CrawlStore {
    fn add_request(&self, request: &[u8]) -> StoreResult<()> {
        self.enqueue(request)
    }

    fn get_request(&self) -> StoreResult<Vec<u8>> {
        self.dequeue()
    }

    fn queue_size(&self) -> StoreResult<usize> {
        CrawlStore::queue_size(self)
    }
}
