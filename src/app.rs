use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{DefaultPolicyEvaluator, PolicyEvaluator};
use crate::clock::{SharedClock, SystemClock};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::events::EventBus;
use crate::jwt::JwtConfig;
use crate::password::{BreachChecker, LocalDenylist, PasswordPolicy};
use crate::ratelimit::{rate_limit_middleware, RateLimitConfig, RateLimitScope, RateLimiter};
use crate::revocation::TokenBlacklist;
use crate::routes::{auth, authz, health, password};

#[derive(Clone)]
pub struct AppState {
    pub jwt: Arc<JwtConfig>,
    pub blacklist: Arc<TokenBlacklist>,
    /// Guards `/password`; built from the configured limits.
    pub rate_limiter: Arc<RateLimiter>,
    /// Guards `/auth` with the fixed login preset.
    pub auth_rate_limiter: Arc<RateLimiter>,
    pub evaluator: Arc<dyn PolicyEvaluator>,
    pub breach: Arc<dyn BreachChecker>,
    pub password_policy: PasswordPolicy,
    pub events: EventBus,
    pub clock: SharedClock,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let clock: SharedClock = Arc::new(SystemClock);
        let jwt = JwtConfig::new(config.jwt_secret.clone(), clock.clone())?;

        Ok(Self::new(jwt, config.rate_limit, config.password_policy, clock))
    }

    /// In-memory stores, default evaluator and bundled denylist around `clock`.
    pub fn new(
        jwt: JwtConfig,
        rate_limit: RateLimitConfig,
        password_policy: PasswordPolicy,
        clock: SharedClock,
    ) -> Self {
        Self {
            jwt: Arc::new(jwt),
            blacklist: Arc::new(TokenBlacklist::in_memory(clock.clone())),
            rate_limiter: Arc::new(RateLimiter::in_memory(rate_limit, clock.clone())),
            auth_rate_limiter: Arc::new(RateLimiter::in_memory(RateLimitConfig::login(), clock.clone())),
            evaluator: Arc::new(DefaultPolicyEvaluator::new()),
            breach: Arc::new(LocalDenylist::new()),
            password_policy,
            events: EventBus::default(),
            clock,
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn PolicyEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_breach_checker(mut self, breach: Arc<dyn BreachChecker>) -> Self {
        self.breach = breach;
        self
    }

    fn limit_scope(&self, limiter: &Arc<RateLimiter>) -> RateLimitScope {
        RateLimitScope::new(Arc::clone(limiter), self.events.clone(), self.clock.clone())
    }

    /// Rate-limit windows held across both limiters.
    pub fn tracked_rate_limit_keys(&self) -> usize {
        self.rate_limiter.tracked_keys() + self.auth_rate_limiter.tracked_keys()
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_limited = middleware::from_fn_with_state(
        state.limit_scope(&state.auth_rate_limiter),
        rate_limit_middleware,
    );
    let password_limited = middleware::from_fn_with_state(state.limit_scope(&state.rate_limiter), rate_limit_middleware);

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/auth", auth::routes().route_layer(auth_limited))
        .nest("/authz", authz::routes())
        .nest("/password", password::routes().route_layer(password_limited))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Periodically drops lapsed blacklist entries and rate-limit windows.
pub fn spawn_store_sweeper(state: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let revoked = state.blacklist.sweep();
            let windows = state.rate_limiter.sweep() + state.auth_rate_limiter.sweep();
            tracing::debug!(revoked, windows, "store sweep finished");
        }
    })
}
