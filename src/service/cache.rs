//! Read-through cache for catalog collections.
//!
//! A cached collection is refreshed when its TTL lapses or when a write to
//! the underlying entity calls [`CachedCollection::invalidate`].

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

#[derive(Debug)]
struct Entry<T> {
    items: Arc<Vec<T>>,
    loaded_at: Instant,
}

/// A whole-collection cache with explicit invalidation.
#[derive(Debug)]
pub struct CachedCollection<T> {
    ttl: Duration,
    entry: RwLock<Option<Entry<T>>>,
}

impl<T> CachedCollection<T> {
    /// Creates an empty cache whose entries live at most `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Returns the cached collection, loading it with `load` when missing
    /// or stale.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error; nothing is cached in that case.
    pub async fn get_or_load<E, F, Fut>(&self, load: F) -> Result<Arc<Vec<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        if let Some(entry) = self.entry.read().await.as_ref() {
            if entry.loaded_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&entry.items));
            }
        }

        let mut slot = self.entry.write().await;
        if let Some(entry) = slot.as_ref() {
            if entry.loaded_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&entry.items));
            }
        }
        let items = Arc::new(load().await?);
        *slot = Some(Entry {
            items: Arc::clone(&items),
            loaded_at: Instant::now(),
        });
        Ok(items)
    }

    /// Drops the cached collection so the next read reloads it.
    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }
}
