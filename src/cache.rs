use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A rendered page kept until `expires_at`.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub body: String,
    pub expires_at: Instant,
}

/// Process-wide store of rendered pages.
///
/// Keys are built by the caller (see [`cache_key`]); entries live for a fixed
/// interval and are only dropped on expiry or an explicit [`PageCache::clear`].
pub struct PageCache {
    ttl: Duration,
    pub(crate) pages: HashMap<String, CachedPage>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pages: HashMap::new(),
        }
    }

    /// Return the cached body for `key` if it has not expired.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let now = Instant::now();
        match self.pages.get(key) {
            Some(page) if now < page.expires_at => Some(page.body.clone()),
            Some(_) => {
                self.pages.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, key: String, body: String) {
        if self.ttl.is_zero() {
            return;
        }
        self.clear_stale();
        self.pages.insert(
            key,
            CachedPage {
                body,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn clear_stale(&mut self) {
        let now = Instant::now();
        self.pages.retain(|_, page| now < page.expires_at);
    }
}

/// Cache key for a page: request URI plus the viewing identity.
pub fn cache_key(uri: &str, viewer: Option<&str>) -> String {
    match viewer {
        Some(username) => format!("{}|user:{}", uri, username),
        None => format!("{}|anonymous", uri),
    }
}
