use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use parking_lot::Mutex;

/// Sliding-window limiter keyed by an arbitrary string (email, ip).
///
/// Each key keeps the instants of its accepted hits inside the window, so the
/// limit holds for any window-sized interval, not just aligned buckets.
#[derive(Debug)]
pub struct KeyedRateLimiter {
    limit: usize,
    window: Duration,
    hits: DashMap<String, Mutex<VecDeque<Instant>>>,
}

impl KeyedRateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        KeyedRateLimiter { limit, window, hits: DashMap::new() }
    }

    /// Records a hit for `key`. On rejection returns how long until the
    /// oldest hit leaves the window.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let entry = self.hits.entry(key.to_string()).or_default();
        let mut hits = entry.lock();

        while hits.front().is_some_and(|t| now.duration_since(*t) >= self.window) {
            hits.pop_front();
        }

        if hits.len() >= self.limit {
            let retry_after = hits
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            return Err(retry_after);
        }

        hits.push_back(now);
        Ok(())
    }

    /// Forgets the most recent hit of `key`, used when the guarded action
    /// did not go through.
    pub fn release(&self, key: &str) {
        if let Some(entry) = self.hits.get(key) {
            entry.lock().pop_back();
        }
    }

    /// Drops keys with no hit inside the window. Returns how many.
    pub fn purge_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.hits.len();
        self.hits.retain(|_, hits| {
            hits.lock()
                .back()
                .is_some_and(|t| now.duration_since(*t) < self.window)
        });
        before - self.hits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_limit_then_rejects_within_window() {
        let limiter = KeyedRateLimiter::new(2, Duration::from_secs(3600));
        let start = Instant::now();
        assert!(limiter.check_at("a@b.dev", start).is_ok());
        assert!(limiter.check_at("a@b.dev", start + Duration::from_secs(10)).is_ok());

        let retry = limiter.check_at("a@b.dev", start + Duration::from_secs(20)).unwrap_err();
        assert_eq!(retry, Duration::from_secs(3580));

        assert!(limiter.check_at("other@b.dev", start).is_ok());
    }

    #[test]
    fn window_slides() {
        let limiter = KeyedRateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.check_at("k", start).is_ok());
        assert!(limiter.check_at("k", start + Duration::from_secs(59)).is_err());
        assert!(limiter.check_at("k", start + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn release_returns_the_slot() {
        let limiter = KeyedRateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("k").is_ok());
        limiter.release("k");
        assert!(limiter.check("k").is_ok());
    }

    #[test]
    fn purge_drops_idle_keys() {
        let limiter = KeyedRateLimiter::new(1, Duration::from_millis(1));
        limiter.check("k").unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(limiter.purge_idle(), 1);
    }
}
