//! Rate limiter for login attempts
//!
//! Two sliding windows guard `/api/auth/login`:
//! - failed attempts per email (5 per 15 minutes)
//! - login requests per client IP (10 per minute)

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use tokio::sync::RwLock;

const MAX_FAILED_ATTEMPTS: usize = 5;
const FAILED_ATTEMPT_WINDOW_MINUTES: i64 = 15;
const MAX_IP_REQUESTS: usize = 10;
const IP_WINDOW_MINUTES: i64 = 1;

pub struct LoginRateLimiter {
    /// Failed login attempts by normalized email
    email_attempts: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
    /// Login requests by client address
    ip_attempts: RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>,
    max_failed_attempts: usize,
    failed_window: Duration,
    max_ip_requests: usize,
    ip_window: Duration,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::with_limits(
            MAX_FAILED_ATTEMPTS,
            Duration::minutes(FAILED_ATTEMPT_WINDOW_MINUTES),
            MAX_IP_REQUESTS,
            Duration::minutes(IP_WINDOW_MINUTES),
        )
    }

    pub fn with_limits(
        max_failed_attempts: usize,
        failed_window: Duration,
        max_ip_requests: usize,
        ip_window: Duration,
    ) -> Self {
        Self {
            email_attempts: RwLock::new(HashMap::new()),
            ip_attempts: RwLock::new(HashMap::new()),
            max_failed_attempts,
            failed_window,
            max_ip_requests,
            ip_window,
        }
    }

    /// Whether this email has used up its failed attempts
    pub async fn is_email_limited(&self, email: &str) -> bool {
        let cutoff = Utc::now() - self.failed_window;
        let mut attempts = self.email_attempts.write().await;
        match attempts.get_mut(&email.to_lowercase()) {
            Some(times) => {
                times.retain(|t| *t > cutoff);
                times.len() >= self.max_failed_attempts
            }
            None => false,
        }
    }

    pub async fn record_failed_attempt(&self, email: &str) {
        let mut attempts = self.email_attempts.write().await;
        attempts
            .entry(email.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Forget failures after a successful login
    pub async fn clear_email_attempts(&self, email: &str) {
        self.email_attempts.write().await.remove(&email.to_lowercase());
    }

    /// Count a request from `ip`, returning whether it is over the limit
    ///
    /// Rejected requests are not recorded, so a blocked client recovers once
    /// the window slides past its earlier requests.
    pub async fn check_ip(&self, ip: IpAddr) -> bool {
        let now = Utc::now();
        let cutoff = now - self.ip_window;
        let mut attempts = self.ip_attempts.write().await;
        let times = attempts.entry(ip).or_default();
        times.retain(|t| *t > cutoff);
        if times.len() >= self.max_ip_requests {
            return true;
        }
        times.push(now);
        false
    }

    /// Drop expired entries; run periodically
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let email_cutoff = now - self.failed_window;
        let ip_cutoff = now - self.ip_window;

        {
            let mut attempts = self.email_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|t| *t > email_cutoff);
                !times.is_empty()
            });
        }

        let mut attempts = self.ip_attempts.write().await;
        attempts.retain(|_, times| {
            times.retain(|t| *t > ip_cutoff);
            !times.is_empty()
        });
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> (usize, usize) {
        (
            self.email_attempts.read().await.len(),
            self.ip_attempts.read().await.len(),
        )
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_email_limit() {
        let limiter = LoginRateLimiter::new();

        for _ in 0..4 {
            limiter.record_failed_attempt("admin@techlabs.org").await;
            assert!(!limiter.is_email_limited("admin@techlabs.org").await);
        }
        limiter.record_failed_attempt("admin@techlabs.org").await;
        assert!(limiter.is_email_limited("admin@techlabs.org").await);
        assert!(!limiter.is_email_limited("other@techlabs.org").await);

        limiter.clear_email_attempts("admin@techlabs.org").await;
        assert!(!limiter.is_email_limited("admin@techlabs.org").await);
    }

    #[tokio::test]
    async fn test_email_case_insensitive() {
        let limiter = LoginRateLimiter::with_limits(
            2,
            Duration::minutes(15),
            10,
            Duration::minutes(1),
        );
        limiter.record_failed_attempt("Admin@TechLabs.org").await;
        limiter.record_failed_attempt("admin@techlabs.org").await;
        assert!(limiter.is_email_limited("ADMIN@TECHLABS.ORG").await);
    }

    #[tokio::test]
    async fn test_ip_limit() {
        let limiter = LoginRateLimiter::new();
        let ip = IpAddr::from_str("127.0.0.1").unwrap();

        for _ in 0..10 {
            assert!(!limiter.check_ip(ip).await);
        }
        assert!(limiter.check_ip(ip).await);
        assert!(!limiter.check_ip(IpAddr::from_str("10.0.0.1").unwrap()).await);
    }

    #[tokio::test]
    async fn test_expired_entries_are_forgotten() {
        let limiter = LoginRateLimiter::with_limits(
            1,
            Duration::zero(),
            1,
            Duration::zero(),
        );
        let ip = IpAddr::from_str("127.0.0.1").unwrap();

        limiter.record_failed_attempt("a@b.c").await;
        assert!(!limiter.check_ip(ip).await);
        assert!(!limiter.is_email_limited("a@b.c").await);

        limiter.cleanup().await;
        assert_eq!(limiter.tracked_keys().await, (0, 0));
    }
}
