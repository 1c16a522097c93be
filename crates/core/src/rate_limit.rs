//! Sliding-window rate limiting for uploads.
//!
//! Tracks request timestamps per key (client IP) and rejects a request
//! when the window already holds the maximum. Old entries are pruned on
//! every check, so memory stays proportional to active clients.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::CoreError;

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for `key`, rejecting it if the window is full.
    pub fn check(&self, key: &str) -> Result<(), CoreError> {
        self.check_at(key, Instant::now())
    }

    /// Clock-injectable variant of [`check`](Self::check) for tests.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), CoreError> {
        let mut requests = self.requests.lock().expect("rate limiter mutex poisoned");
        let timestamps = requests.entry(key.to_string()).or_default();

        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            tracing::warn!(
                key,
                in_window = timestamps.len(),
                "Upload rate limit exceeded"
            );
            return Err(CoreError::RateLimited(format!(
                "Max {} uploads per {} seconds",
                self.max_requests,
                self.window.as_secs()
            )));
        }

        timestamps.push(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        for _ in 0..3 {
            limiter.check_at("1.2.3.4", now).unwrap();
        }
        let err = limiter.check_at("1.2.3.4", now).unwrap_err();
        assert!(matches!(err, CoreError::RateLimited(_)));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        limiter.check_at("1.2.3.4", now).unwrap();
        limiter.check_at("5.6.7.8", now).unwrap();
        assert!(limiter.check_at("1.2.3.4", now).is_err());
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        limiter.check_at("ip", start).unwrap();
        limiter.check_at("ip", start + Duration::from_secs(30)).unwrap();
        assert!(limiter.check_at("ip", start + Duration::from_secs(45)).is_err());

        // First entry has aged out of the window by now.
        limiter.check_at("ip", start + Duration::from_secs(61)).unwrap();
    }
}
