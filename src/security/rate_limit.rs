//! Sliding-window rate limiting per (client, operation).
//!
//! Each key owns a chronologically ordered queue of admitted request instants.
//! Expired instants are trimmed lazily from the front before every admission
//! check, so correctness never depends on the background sweeper; the sweeper
//! only reclaims keys whose window has emptied.
//!
//! A timestamp `t` is expired once `now - t >= window`. `retry_after` is
//! `oldest + window - now` rounded up to whole seconds.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::security::error::GuardError;
use crate::security::guard::{Guard, RequestContext};

/// Identifies one counting window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    pub client: String,
    pub operation: String,
}

impl RateLimitKey {
    pub fn new(client: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            operation: operation.into(),
        }
    }
}

/// Admission limit for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self { max_requests, window }
    }

    pub fn per_minutes(max_requests: u32, minutes: u64) -> Self {
        Self::new(max_requests, Duration::from_secs(minutes.saturating_mul(60)))
    }
}

/// Admitted instants for one key, oldest first.
#[derive(Debug)]
struct RateLimitWindow {
    timestamps: VecDeque<Instant>,
    span: Duration,
}

impl RateLimitWindow {
    fn new(span: Duration) -> Self {
        Self {
            timestamps: VecDeque::new(),
            span,
        }
    }

    fn evict(&mut self, now: Instant) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) >= self.span {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Process-wide table of rate-limit windows.
///
/// Every check runs under the DashMap shard lock for its key, so the
/// trim-check-append sequence is atomic with respect to concurrent requests.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<RateLimitKey, RateLimitWindow>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit or reject a request at `now`.
    ///
    /// On rejection returns the time until the oldest admitted request leaves
    /// the window. Rejections are not recorded.
    pub fn check(&self, key: RateLimitKey, policy: &RateLimitPolicy, now: Instant) -> Result<(), Duration> {
        let mut window = self
            .windows
            .entry(key)
            .or_insert_with(|| RateLimitWindow::new(policy.window));
        window.span = policy.window;
        window.evict(now);

        if window.timestamps.len() >= policy.max_requests as usize {
            let wait = window
                .timestamps
                .front()
                .map(|&oldest| policy.window.saturating_sub(now.saturating_duration_since(oldest)))
                .unwrap_or(policy.window);
            return Err(wait);
        }

        window.timestamps.push_back(now);
        Ok(())
    }

    /// Number of admitted requests currently counted for a key.
    pub fn count(&self, key: &RateLimitKey, now: Instant) -> usize {
        self.windows
            .get_mut(key)
            .map(|mut window| {
                window.evict(now);
                window.timestamps.len()
            })
            .unwrap_or(0)
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Drop keys whose windows are empty at `now`. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.evict(now);
            !window.timestamps.is_empty()
        });
        let removed = before.saturating_sub(self.windows.len());
        metrics::record_rate_limit_keys(self.windows.len());
        removed
    }

    /// Run [`RateLimiter::sweep`] every `interval` until shutdown is signalled.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep(Instant::now());
                        if removed > 0 {
                            tracing::debug!(
                                removed_keys = removed,
                                remaining_keys = limiter.tracked_keys(),
                                "Rate limiter sweep completed"
                            );
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Rate limiter sweeper stopping");
                        break;
                    }
                }
            }
        })
    }
}

/// Whole seconds to wait, rounded up.
pub fn retry_after_secs(wait: Duration) -> u64 {
    wait.as_secs() + u64::from(wait.subsec_nanos() > 0)
}

/// Guard admitting at most `policy.max_requests` per client per window for one operation.
#[derive(Debug, Clone)]
pub struct RateLimitGuard {
    limiter: Arc<RateLimiter>,
    operation: String,
    policy: RateLimitPolicy,
}

impl RateLimitGuard {
    pub fn new(limiter: Arc<RateLimiter>, operation: impl Into<String>, policy: RateLimitPolicy) -> Self {
        Self {
            limiter,
            operation: operation.into(),
            policy,
        }
    }
}

impl Guard for RateLimitGuard {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn inspect(&self, ctx: &RequestContext) -> Result<(), GuardError> {
        let key = RateLimitKey::new(ctx.client_id(), self.operation.as_str());
        self.limiter
            .check(key, &self.policy, ctx.received_at)
            .map_err(|wait| GuardError::RateLimited {
                retry_after: retry_after_secs(wait),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, Method};

    fn key(client: &str) -> RateLimitKey {
        RateLimitKey::new(client, "submit_application")
    }

    #[test]
    fn test_window_correctness() {
        let limiter = RateLimiter::new();
        let policy = RateLimitPolicy::new(3, Duration::from_secs(60));
        let start = Instant::now();

        for i in 0..3 {
            assert!(limiter.check(key("a"), &policy, start + Duration::from_secs(i)).is_ok());
        }
        assert!(limiter.check(key("a"), &policy, start + Duration::from_secs(59)).is_err());

        // Exactly one window after the first admission it has expired.
        assert!(limiter.check(key("a"), &policy, start + Duration::from_secs(60)).is_ok());
        assert!(limiter.check(key("a"), &policy, start + Duration::from_secs(60)).is_err());
    }

    #[test]
    fn test_independent_keys() {
        let limiter = RateLimiter::new();
        let policy = RateLimitPolicy::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check(key("a"), &policy, now).is_ok());
        assert!(limiter.check(key("a"), &policy, now).is_err());
        assert!(limiter.check(key("b"), &policy, now).is_ok());
        assert!(limiter
            .check(RateLimitKey::new("a", "lookup_application"), &policy, now)
            .is_ok());
        assert_eq!(limiter.tracked_keys(), 3);
    }

    #[test]
    fn test_rejection_not_counted() {
        let limiter = RateLimiter::new();
        let policy = RateLimitPolicy::new(2, Duration::from_secs(10));
        let start = Instant::now();

        limiter.check(key("a"), &policy, start).unwrap();
        limiter.check(key("a"), &policy, start + Duration::from_secs(5)).unwrap();
        for i in 0..5 {
            assert!(limiter.check(key("a"), &policy, start + Duration::from_secs(6 + i)).is_err());
        }
        assert_eq!(limiter.count(&key("a"), start + Duration::from_secs(9)), 2);

        // Only the first admission expired, so exactly one slot opens.
        assert!(limiter.check(key("a"), &policy, start + Duration::from_secs(10)).is_ok());
        assert!(limiter.check(key("a"), &policy, start + Duration::from_secs(10)).is_err());
    }

    #[test]
    fn test_retry_after_decreases() {
        let limiter = RateLimiter::new();
        let policy = RateLimitPolicy::new(1, Duration::from_secs(60));
        let start = Instant::now();

        limiter.check(key("a"), &policy, start).unwrap();
        let first = limiter
            .check(key("a"), &policy, start + Duration::from_millis(10_500))
            .unwrap_err();
        let second = limiter
            .check(key("a"), &policy, start + Duration::from_millis(11_500))
            .unwrap_err();

        assert_eq!(retry_after_secs(first), 50);
        assert_eq!(retry_after_secs(second), 49);
        assert!(retry_after_secs(first) - retry_after_secs(second) <= 1);
    }

    #[test]
    fn test_retry_after_rounding() {
        assert_eq!(retry_after_secs(Duration::from_secs(3)), 3);
        assert_eq!(retry_after_secs(Duration::from_millis(2_001)), 3);
        assert_eq!(retry_after_secs(Duration::from_millis(1)), 1);
        assert_eq!(retry_after_secs(Duration::ZERO), 0);
    }

    #[test]
    fn test_huge_window_rejects_without_overflow() {
        let limiter = RateLimiter::new();
        let policy = RateLimitPolicy::per_minutes(1, u64::MAX / 60);
        let t0 = Instant::now();

        assert!(limiter.check(key("a"), &policy, t0).is_ok());
        let wait = limiter
            .check(key("a"), &policy, t0 + Duration::from_secs(5))
            .unwrap_err();
        assert_eq!(wait, policy.window - Duration::from_secs(5));
    }

    #[test]
    fn test_sweep_removes_idle_keys() {
        let limiter = RateLimiter::new();
        let policy = RateLimitPolicy::new(5, Duration::from_secs(10));
        let start = Instant::now();

        limiter.check(key("idle"), &policy, start).unwrap();
        limiter.check(key("busy"), &policy, start + Duration::from_secs(8)).unwrap();

        assert_eq!(limiter.sweep(start + Duration::from_secs(5)), 0);
        assert_eq!(limiter.sweep(start + Duration::from_secs(12)), 1);
        assert_eq!(limiter.tracked_keys(), 1);
        assert_eq!(limiter.count(&key("busy"), start + Duration::from_secs(12)), 1);
    }

    #[test]
    fn test_concurrent_admissions_never_exceed_limit() {
        let limiter = Arc::new(RateLimiter::new());
        let policy = RateLimitPolicy::new(50, Duration::from_secs(60));
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|_| limiter.check(key("a"), &policy, now).is_ok())
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
    }

    #[test]
    fn test_guard_uses_forwarded_client() {
        let limiter = Arc::new(RateLimiter::new());
        let guard = RateLimitGuard::new(
            Arc::clone(&limiter),
            "submit_application",
            RateLimitPolicy::per_minutes(1, 60),
        );
        let now = Instant::now();

        let request = |client: &'static str| {
            let mut headers = HeaderMap::new();
            headers.insert("x-forwarded-for", HeaderValue::from_static(client));
            RequestContext::new(Method::POST, "/api/apply", headers, None).at(now)
        };

        assert_eq!(guard.inspect(&request("203.0.113.1")), Ok(()));
        assert_eq!(
            guard.inspect(&request("203.0.113.1")),
            Err(GuardError::RateLimited { retry_after: 3600 })
        );
        assert_eq!(guard.inspect(&request("203.0.113.2")), Ok(()));
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let limiter = Arc::new(RateLimiter::new());
        let (tx, rx) = broadcast::channel(1);

        let handle = limiter.spawn_sweeper(Duration::from_millis(10), rx);
        tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
