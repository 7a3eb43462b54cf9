//! Time-boxed in-memory cache with stale reads
//!
//! A value is fresh while its age is at most the TTL. Stale values stay
//! readable through [`TtlCache::stale`] so callers can fall back to the last
//! good value when a refresh fails.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    entry: Option<Entry<T>>,
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    stored_at: Instant,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value, if present and not expired
    pub fn get(&self) -> Option<T> {
        self.entry
            .as_ref()
            .filter(|e| e.stored_at.elapsed() <= self.ttl)
            .map(|e| e.value.clone())
    }

    /// The cached value regardless of age
    pub fn stale(&self) -> Option<T> {
        self.entry.as_ref().map(|e| e.value.clone())
    }

    /// Replace the value and reset its timestamp
    pub fn set(&mut self, value: T) {
        self.entry = Some(Entry {
            value,
            stored_at: Instant::now(),
        });
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Time since the value was stored
    pub fn age(&self) -> Option<Duration> {
        self.entry.as_ref().map(|e| e.stored_at.elapsed())
    }

    /// When the current value was stored
    pub fn stored_at(&self) -> Option<Instant> {
        self.entry.as_ref().map(|e| e.stored_at)
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}
