use crate::config::RateLimitConfig;
use crate::error::{Result, RoastError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::debug;

/// Counter store consulted once per request, keyed by client
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Consumes one unit for `key`, failing with `RateLimitExceeded` when the
    /// current window is used up
    async fn consume(&self, key: &str) -> Result<()>;
}

/// In-memory fixed-window limiter
///
/// A key's window opens at its first consumption and lasts `window`. State
/// lives only in this process.
pub struct RateLimiter {
    capacity: u32,
    window: Duration,
    state: Mutex<HashMap<String, Window>>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    expires_at: Instant,
}

impl RateLimiter {
    /// Creates a limiter allowing `capacity` consumptions per `window`
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            capacity,
            window,
            state: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.capacity, config.window())
    }

    /// Consumptions left for `key` in its current window
    pub async fn remaining(&self, key: &str) -> u32 {
        let state = self.state.lock().await;
        match state.get(key) {
            Some(window) if window.expires_at > Instant::now() => {
                self.capacity.saturating_sub(window.count)
            }
            _ => self.capacity,
        }
    }

    /// Drops entries whose window has elapsed, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let before = state.len();
        state.retain(|_, window| window.expires_at > now);
        before - state.len()
    }

    /// Number of keys currently tracked
    pub async fn tracked_keys(&self) -> usize {
        self.state.lock().await.len()
    }

    /// Periodically purges expired windows for as long as the limiter is alive
    pub fn spawn_janitor(limiter: Arc<Self>, every: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(&limiter);
        drop(limiter);

        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(limiter) = weak.upgrade() else {
                    break;
                };
                let purged = limiter.purge_expired().await;
                if purged > 0 {
                    debug!("Purged {} expired rate limit windows", purged);
                }
            }
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

#[async_trait]
impl RateLimitStore for RateLimiter {
    async fn consume(&self, key: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let window = state.entry(key.to_string()).or_insert(Window {
            count: 0,
            expires_at: now + self.window,
        });

        if window.expires_at <= now {
            window.count = 0;
            window.expires_at = now + self.window;
        }

        if window.count >= self.capacity {
            return Err(RoastError::RateLimitExceeded(key.to_string()));
        }

        window.count += 1;
        Ok(())
    }
}
