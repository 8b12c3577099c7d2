//! Fixed-window request counter keyed by client identifier.
//!
//! A window opens on the first request for a key and lasts `window`; the
//! counter restarts when it lapses. Bursts at a window boundary are accepted:
//! this is coarse abuse prevention, not traffic shaping.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::clock::SharedClock;
use crate::errors::AppError;
use crate::events::{EventBus, SecurityEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self { max_requests, window }
    }

    /// Token endpoints under `/auth`: 10 per 15 minutes.
    pub fn login() -> Self {
        Self::new(10, Duration::minutes(15))
    }

    pub fn api_general() -> Self {
        Self::new(1000, Duration::hours(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCounter {
    pub count: u32,
    pub window_start: DateTime<Utc>,
    pub reset_at: DateTime<Utc>,
}

pub trait RateLimitStore: Send + Sync {
    fn get(&self, key: &str) -> Option<WindowCounter>;
    /// Atomic read-modify-write of one key.
    fn update(&self, key: &str, apply: &mut dyn FnMut(Option<WindowCounter>) -> WindowCounter) -> WindowCounter;
    fn remove(&self, key: &str);
    fn evict_expired(&self, now: DateTime<Utc>) -> usize;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    counters: DashMap<String, WindowCounter>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn get(&self, key: &str) -> Option<WindowCounter> {
        self.counters.get(key).map(|entry| *entry.value())
    }

    fn update(&self, key: &str, apply: &mut dyn FnMut(Option<WindowCounter>) -> WindowCounter) -> WindowCounter {
        match self.counters.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let next = apply(Some(*occupied.get()));
                *occupied.get_mut() = next;
                next
            }
            Entry::Vacant(vacant) => {
                let next = apply(None);
                vacant.insert(next);
                next
            }
        }
    }

    fn remove(&self, key: &str) {
        self.counters.remove(key);
    }

    fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.counters.len();
        self.counters.retain(|_, counter| counter.reset_at > now);
        before.saturating_sub(self.counters.len())
    }

    fn len(&self) -> usize {
        self.counters.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    /// Seconds until the window reopens; zero when allowed.
    pub retry_after_secs: u64,
}

impl RateLimitDecision {
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert("x-ratelimit-limit", HeaderValue::from(self.limit));
        headers.insert("x-ratelimit-remaining", HeaderValue::from(self.remaining));
        if let Ok(value) = HeaderValue::from_str(&self.reset_at.to_rfc3339()) {
            headers.insert("x-ratelimit-reset", value);
        }
    }
}

pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    clock: SharedClock,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, store: Arc<dyn RateLimitStore>, clock: SharedClock) -> Self {
        Self { store, clock, config }
    }

    pub fn in_memory(config: RateLimitConfig, clock: SharedClock) -> Self {
        Self::new(config, Arc::new(InMemoryRateLimitStore::new()), clock)
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Counts one request against `key` and says whether it may proceed.
    /// Denied requests are not counted.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let max = self.config.max_requests;
        let window = self.config.window;
        let mut allowed = false;

        let counter = self.store.update(key, &mut |current| match current {
            Some(counter) if counter.reset_at > now => {
                if counter.count < max {
                    allowed = true;
                    WindowCounter {
                        count: counter.count + 1,
                        ..counter
                    }
                } else {
                    allowed = false;
                    counter
                }
            }
            _ => {
                allowed = max > 0;
                WindowCounter {
                    count: u32::from(allowed),
                    window_start: now,
                    reset_at: now + window,
                }
            }
        });

        let retry_after_secs = if allowed {
            0
        } else {
            let millis = (counter.reset_at - now).num_milliseconds().max(0) as u64;
            millis.div_ceil(1000).max(1)
        };

        RateLimitDecision {
            allowed,
            limit: max,
            remaining: max.saturating_sub(counter.count),
            reset_at: counter.reset_at,
            retry_after_secs,
        }
    }

    /// Read-only: would the next request for `key` be refused?
    pub fn is_rate_limited(&self, key: &str) -> bool {
        if self.config.max_requests == 0 {
            return true;
        }

        match self.store.get(key) {
            Some(counter) => counter.reset_at > self.clock.now() && counter.count >= self.config.max_requests,
            None => false,
        }
    }

    pub fn reset(&self, key: &str) {
        self.store.remove(key);
        tracing::info!(key = %key, "rate limit reset");
    }

    pub fn sweep(&self) -> usize {
        let evicted = self.store.evict_expired(self.clock.now());
        if evicted > 0 {
            tracing::debug!(evicted, "rate limit sweep");
        }
        evicted
    }

    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }
}

fn first_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Proxy headers first (`x-forwarded-for`, `x-real-ip`, `cf-connecting-ip`),
/// then the socket peer.
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = first_header(headers, "x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    forwarded
        .or_else(|| first_header(headers, "x-real-ip"))
        .or_else(|| first_header(headers, "cf-connecting-ip"))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware state: one limiter per router it guards.
#[derive(Clone)]
pub struct RateLimitScope {
    pub limiter: Arc<RateLimiter>,
    pub events: EventBus,
    pub clock: SharedClock,
}

impl RateLimitScope {
    pub fn new(limiter: Arc<RateLimiter>, events: EventBus, clock: SharedClock) -> Self {
        Self { limiter, events, clock }
    }
}

/// Middleware for IP-based rate limiting
pub async fn rate_limit_middleware(State(scope): State<RateLimitScope>, request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = format!("ip:{}", client_identifier(request.headers(), peer));

    let decision = scope.limiter.check(&key);
    if !decision.allowed {
        tracing::warn!(key = %key, limit = decision.limit, retry_after = decision.retry_after_secs, "rate limit exceeded");
        scope
            .events
            .publish(SecurityEvent::rate_limited(scope.clock.now(), &key, decision.limit));

        let mut response = AppError::too_many_requests(
            "Too many requests. Please try again later.",
            Some(decision.retry_after_secs),
        )
        .into_response();
        decision.apply_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    decision.apply_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter(max: u32, window_secs: i64) -> (Arc<ManualClock>, RateLimiter) {
        let clock = Arc::new(ManualClock::default());
        let limiter = RateLimiter::in_memory(RateLimitConfig::new(max, Duration::seconds(window_secs)), clock.clone());
        (clock, limiter)
    }

    #[test]
    fn denies_request_past_capacity() {
        let (_, limiter) = limiter(3, 60);

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check("ip:1.2.3.4");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let denied = limiter.check("ip:1.2.3.4");
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.retry_after_secs, 60);
        assert!(limiter.is_rate_limited("ip:1.2.3.4"));
    }

    #[test]
    fn window_expiry_resets_counter_to_one() {
        let (clock, limiter) = limiter(2, 60);
        limiter.check("k");
        limiter.check("k");
        assert!(!limiter.check("k").allowed);

        clock.advance(Duration::seconds(60));
        let decision = limiter.check("k");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
        assert!(!limiter.is_rate_limited("k"));
    }

    #[test]
    fn denied_requests_do_not_extend_the_window() {
        let (clock, limiter) = limiter(1, 10);
        assert!(limiter.check("k").allowed);
        clock.advance(Duration::seconds(9));
        let denied = limiter.check("k");
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after_secs, 1);

        clock.advance(Duration::seconds(1));
        assert!(limiter.check("k").allowed);
    }

    #[test]
    fn keys_are_independent() {
        let (_, limiter) = limiter(1, 60);
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
    }

    #[test]
    fn unknown_keys_are_not_limited() {
        let (_, limiter) = limiter(5, 60);
        assert!(!limiter.is_rate_limited("never-seen"));
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn zero_capacity_denies_everything() {
        let (_, limiter) = limiter(0, 60);
        assert!(!limiter.check("k").allowed);
        assert!(limiter.is_rate_limited("k"));
    }

    #[test]
    fn reset_and_sweep() {
        let (clock, limiter) = limiter(1, 30);
        limiter.check("a");
        limiter.check("b");
        limiter.reset("a");
        assert!(limiter.check("a").allowed);

        clock.advance(Duration::seconds(31));
        assert_eq!(limiter.sweep(), 2);
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn client_identifier_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "192.168.1.7:5000".parse().unwrap();
        assert_eq!(client_identifier(&headers, Some(peer)), "192.168.1.7");
        assert_eq!(client_identifier(&headers, None), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("10.1.1.1"));
        assert_eq!(client_identifier(&headers, Some(peer)), "10.1.1.1");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.2"));
        assert_eq!(client_identifier(&headers, Some(peer)), "203.0.113.9");
    }
}
