use dashmap::DashMap;
use std::time::{Duration, Instant};

/// How long the rendered index page is served from cache.
pub const INDEX_CACHE_TTL: Duration = Duration::from_secs(20);

/// Upper bound on live entries. Inserts beyond it are skipped until entries expire.
pub const MAX_CACHED_PAGES: usize = 1024;

/// Cache key: page number and the id of the viewing user.
/// Pages embed the viewer's navigation, so guests and each user are cached apart.
pub type PageKey = (u64, Option<i32>);

struct CachedPage {
    body: String,
    stored_at: Instant,
}

/// Time-bounded cache of rendered pages.
/// Entries are not invalidated by writes; readers may see stale pages until the TTL lapses.
pub struct PageCache {
    ttl: Duration,
    capacity: usize,
    pages: DashMap<PageKey, CachedPage>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, MAX_CACHED_PAGES)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            pages: DashMap::new(),
        }
    }

    /// Returns the cached body if it is younger than the TTL.
    pub fn get(&self, key: &PageKey) -> Option<String> {
        if let Some(page) = self.pages.get(key) {
            if page.stored_at.elapsed() < self.ttl {
                return Some(page.body.to_owned());
            }
        }

        self.pages
            .remove_if(key, |_, page| page.stored_at.elapsed() >= self.ttl);
        None
    }

    /// Stores a rendered page, dropping expired entries first.
    pub fn insert(&self, key: PageKey, body: String) {
        self.sweep();
        if self.pages.len() >= self.capacity && !self.pages.contains_key(&key) {
            log::warn!("PageCache::insert: cache is full, not storing {:?}", key);
            return;
        }

        self.pages.insert(
            key,
            CachedPage {
                body,
                stored_at: Instant::now(),
            },
        );
    }

    /// Removes every entry older than the TTL.
    pub fn sweep(&self) {
        self.pages
            .retain(|_, page| page.stored_at.elapsed() < self.ttl);
    }

    pub fn clear(&self) {
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(INDEX_CACHE_TTL)
    }
}
