use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Sliding-window request limiter keyed by origin.
///
/// An origin is admitted while fewer than `max_requests` of its previous
/// admissions fall inside the trailing `window`. Each bridge owns its own
/// limiter, so separate embedded pages never share budgets.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    history: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Creates a limiter admitting `max_requests` per `window`.
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests as usize,
            window,
            history: Mutex::new(HashMap::new()),
        }
    }

    /// Checks and records one request from `origin` at the current time.
    pub fn is_allowed(&self, origin: &str) -> bool {
        self.is_allowed_at(origin, Instant::now())
    }

    /// Checks and records one request from `origin` at `now`.
    ///
    /// Timestamps older than the window are pruned first. A refused request
    /// is not recorded.
    pub fn is_allowed_at(&self, origin: &str, now: Instant) -> bool {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let stamps = history.entry(origin.to_string()).or_default();
        while stamps
            .front()
            .is_some_and(|&stamp| now.saturating_duration_since(stamp) >= self.window)
        {
            stamps.pop_front();
        }
        if stamps.len() >= self.max_requests {
            return false;
        }
        stamps.push_back(now);
        true
    }

    /// Forgets the history of `origin`.
    pub fn reset(&self, origin: &str) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(origin);
    }

    /// Number of origins with recorded history.
    #[must_use]
    pub fn tracked_origins(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://dapp.example";

    #[test]
    fn test_admits_up_to_the_limit() {
        let limiter = RateLimiter::new(10, Duration::from_secs(60));
        let start = Instant::now();
        for i in 0..10 {
            assert!(limiter.is_allowed_at(ORIGIN, start + Duration::from_secs(i)));
        }
        assert!(!limiter.is_allowed_at(ORIGIN, start + Duration::from_secs(30)));
    }

    #[test]
    fn test_window_slides() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.is_allowed_at(ORIGIN, start));
        assert!(limiter.is_allowed_at(ORIGIN, start + Duration::from_secs(10)));
        assert!(!limiter.is_allowed_at(ORIGIN, start + Duration::from_secs(59)));
        // first stamp expires exactly at the window edge
        assert!(limiter.is_allowed_at(ORIGIN, start + Duration::from_secs(60)));
        assert!(!limiter.is_allowed_at(ORIGIN, start + Duration::from_secs(61)));
    }

    #[test]
    fn test_origins_are_independent_and_resettable() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.is_allowed_at(ORIGIN, now));
        assert!(!limiter.is_allowed_at(ORIGIN, now));
        assert!(limiter.is_allowed_at("https://other.example", now));
        assert_eq!(limiter.tracked_origins(), 2);

        limiter.reset(ORIGIN);
        assert!(limiter.is_allowed_at(ORIGIN, now));
    }
}
