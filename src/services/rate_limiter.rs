//! Rate limiter for login attempts
//!
//! Sliding-window counters protecting the credential endpoint from brute
//! force: failed attempts are tracked per username, raw request volume per
//! IP address. Entries are pruned on access and by a periodic cleanup task.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use tokio::sync::RwLock;

/// Failed attempts allowed per username inside the window
const MAX_USERNAME_ATTEMPTS: usize = 5;
/// Username window length in minutes
const USERNAME_WINDOW_MINUTES: i64 = 15;
/// Requests allowed per IP inside the window
const MAX_IP_REQUESTS: usize = 10;
/// IP window length in minutes
const IP_WINDOW_MINUTES: i64 = 1;

/// Login rate limiter
pub struct LoginRateLimiter {
    /// Failed login attempts by (lowercased) username
    username_attempts: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
    /// Login requests by IP address
    ip_requests: RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>,
}

impl LoginRateLimiter {
    /// Create a new rate limiter
    pub fn new() -> Self {
        Self {
            username_attempts: RwLock::new(HashMap::new()),
            ip_requests: RwLock::new(HashMap::new()),
        }
    }

    /// Check if the username is currently rate limited
    pub async fn is_username_limited(&self, username: &str) -> bool {
        let mut attempts = self.username_attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(USERNAME_WINDOW_MINUTES);

        let entry = attempts.entry(username.to_lowercase()).or_default();
        entry.retain(|time| *time > cutoff);

        entry.len() >= MAX_USERNAME_ATTEMPTS
    }

    /// Record a failed login attempt for the username
    pub async fn record_failed_attempt(&self, username: &str) {
        let mut attempts = self.username_attempts.write().await;
        attempts
            .entry(username.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Forget failed attempts for the username (on successful login)
    pub async fn clear_username_attempts(&self, username: &str) {
        self.username_attempts
            .write()
            .await
            .remove(&username.to_lowercase());
    }

    /// Check if the IP is currently rate limited
    pub async fn is_ip_limited(&self, ip: IpAddr) -> bool {
        let mut requests = self.ip_requests.write().await;
        let cutoff = Utc::now() - Duration::minutes(IP_WINDOW_MINUTES);

        let entry = requests.entry(ip).or_default();
        entry.retain(|time| *time > cutoff);

        entry.len() >= MAX_IP_REQUESTS
    }

    /// Record a login request from the IP
    pub async fn record_ip_request(&self, ip: IpAddr) {
        self.ip_requests.write().await.entry(ip).or_default().push(Utc::now());
    }

    /// Drop entries whose windows have fully passed.
    pub async fn cleanup(&self) {
        let now = Utc::now();

        let username_cutoff = now - Duration::minutes(USERNAME_WINDOW_MINUTES);
        self.username_attempts.write().await.retain(|_, times| {
            times.retain(|time| *time > username_cutoff);
            !times.is_empty()
        });

        let ip_cutoff = now - Duration::minutes(IP_WINDOW_MINUTES);
        self.ip_requests.write().await.retain(|_, times| {
            times.retain(|time| *time > ip_cutoff);
            !times.is_empty()
        });
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
