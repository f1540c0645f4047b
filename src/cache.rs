// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::model::{Channel, Genre};

/// Validity window for cached listings.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub captured_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            captured_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.captured_at.elapsed() >= ttl
    }

    pub fn time_until_expiry(&self, ttl: Duration) -> Duration {
        ttl.saturating_sub(self.captured_at.elapsed())
    }
}

/// One independently keyed, time-bounded cache entry.
#[derive(Debug)]
pub struct CacheSlot<T> {
    entry: Mutex<Option<CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> CacheSlot<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: Mutex::new(None),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<CacheEntry<T>>> {
        self.entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached data, if present and younger than the TTL.
    pub fn get(&self) -> Option<T> {
        let guard = self.lock();
        let entry = guard.as_ref().filter(|entry| !entry.is_expired(self.ttl))?;
        debug!(
            "Cache hit, expires in {}s",
            entry.time_until_expiry(self.ttl).as_secs()
        );
        Some(entry.data.clone())
    }

    pub fn put(&self, data: T) {
        *self.lock() = Some(CacheEntry::new(data));
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn captured_at(&self) -> Option<Instant> {
        self.lock().as_ref().map(|entry| entry.captured_at)
    }
}

/// Listing caches scoped to the current session.
#[derive(Debug)]
pub struct ContentCache {
    pub channels: CacheSlot<Vec<Channel>>,
    pub genres: CacheSlot<Vec<Genre>>,
}

impl ContentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            channels: CacheSlot::new(ttl),
            genres: CacheSlot::new(ttl),
        }
    }

    pub fn clear(&self) {
        debug!("Clearing all cached data");
        self.channels.clear();
        self.genres.clear();
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: &str) -> Genre {
        Genre {
            id: id.to_string(),
            title: format!("Genre {id}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_valid_until_ttl() {
        let cache = ContentCache::default();
        cache.genres.put(vec![genre("1")]);

        tokio::time::advance(Duration::from_secs(4 * 60 + 59)).await;
        assert_eq!(cache.genres.get(), Some(vec![genre("1")]));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.genres.get(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_and_refreshes_timestamp() {
        let slot: CacheSlot<Vec<Genre>> = CacheSlot::new(CACHE_TTL);
        slot.put(vec![genre("1")]);
        let first = slot.captured_at().unwrap();

        tokio::time::advance(Duration::from_secs(200)).await;
        slot.put(vec![genre("2")]);

        assert!(slot.captured_at().unwrap() > first);
        tokio::time::advance(Duration::from_secs(200)).await;
        assert_eq!(slot.get(), Some(vec![genre("2")]));
    }

    #[test]
    fn test_clear_evicts_both_slots() {
        let cache = ContentCache::default();
        cache.genres.put(vec![genre("1")]);
        cache.channels.put(Vec::new());

        cache.clear();

        assert!(cache.genres.get().is_none());
        assert!(cache.channels.get().is_none());
    }

    #[test]
    fn test_time_until_expiry() {
        let entry = CacheEntry::new(());
        assert!(entry.time_until_expiry(CACHE_TTL) <= CACHE_TTL);
        assert!(entry.is_expired(Duration::ZERO));
    }
}
