use crate::config::Config;
use crate::error::{Result, RoastError, CLIENT_IP_INVALID, USERNAME_REQUIRED};
use crate::gemini::{GeminiClient, RoastGenerator};
use crate::github::{GitHubClient, ProfileSource};
use crate::prompts::PromptBuilder;
use crate::rate_limiter::{RateLimitStore, RateLimiter};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

pub const ROAST_ROUTE: &str = "/api/github-roasting";
pub const HEALTH_ROUTE: &str = "/health";

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Components shared by every request
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<dyn RateLimitStore>,
    pub profiles: Arc<dyn ProfileSource>,
    pub generator: Arc<dyn RoastGenerator>,
    pub prompts: PromptBuilder,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        limiter: Arc<dyn RateLimitStore>,
        profiles: Arc<dyn ProfileSource>,
        generator: Arc<dyn RoastGenerator>,
        prompts: PromptBuilder,
    ) -> Self {
        Self {
            limiter,
            profiles,
            generator,
            prompts,
            started_at: Utc::now(),
        }
    }

    /// Wires the production components from configuration
    ///
    /// The returned limiter is also held by the state; callers use it to run
    /// the expiry janitor.
    pub fn from_config(config: &Config) -> Result<(Self, Arc<RateLimiter>)> {
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let state = Self::new(
            limiter.clone(),
            Arc::new(GitHubClient::new(config)?),
            Arc::new(GeminiClient::new(config)?),
            PromptBuilder::new(config.language.clone()),
        );
        Ok((state, limiter))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoastResponse {
    pub roasting: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub timestamp: DateTime<Utc>,
}

/// Builds the router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(ROAST_ROUTE, get(github_roasting))
        .route(HEALTH_ROUTE, get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /api/github-roasting?username=...`
async fn github_roasting(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Result<Json<RoastResponse>> {
    let username = first_username(&params)
        .ok_or_else(|| RoastError::Validation(USERNAME_REQUIRED.into()))?;

    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let client = client_key(&headers, peer)
        .ok_or_else(|| RoastError::Validation(CLIENT_IP_INVALID.into()))?;

    if let Err(e) = state.limiter.consume(&client).await {
        warn!("Rate limit hit for {}", client);
        return Err(e);
    }

    info!("Roasting {} for {}", username, client);
    let profile = state.profiles.fetch(&username).await?;
    let prompt = state.prompts.build(&profile, &username);
    debug!("Prompt for {} is {} bytes", username, prompt.len());
    let roasting = state.generator.generate(&prompt).await?;

    Ok(Json(RoastResponse { roasting }))
}

/// First non-blank `username` value; repeated parameters are tolerated
fn first_username(params: &[(String, String)]) -> Option<String> {
    params
        .iter()
        .filter(|(key, _)| key == "username")
        .map(|(_, value)| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = Utc::now();
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (now - state.started_at).num_seconds(),
        timestamp: now,
    })
}

/// Identifies the caller for rate limiting
///
/// Prefers the first entry of `X-Forwarded-For`, else the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').map(str::trim).find(|entry| !entry.is_empty()))
        .map(str::to_string);

    forwarded.or_else(|| peer.map(|addr| addr.ip().to_string()))
}
