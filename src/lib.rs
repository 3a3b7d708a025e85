#![warn(clippy::all)]

//! GitHub Roaster - an HTTP service that roasts GitHub profiles
//!
//! A single endpoint fetches a user's public profile, repositories and
//! profile README, folds them into a prompt and relays what Gemini writes
//! back.
//!
//! ## Pipeline
//! - Per-client fixed-window rate limiting
//! - GitHub fetch with one unauthenticated fallback
//! - Deterministic prompt rendering
//! - A single `generateContent` call
//!
//! ## Usage
//! ```rust,ignore
//! use github_roaster::{api, Config};
//!
//! async fn example() -> github_roaster::Result<()> {
//!     let config = Config::load(None)?;
//!     let (state, _limiter) = api::AppState::from_config(&config)?;
//!     let app = api::create_app(state);
//!     let listener = tokio::net::TcpListener::bind(config.socket_addr()?).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

/// HTTP routes and request handling
pub mod api;
/// Configuration module for the application
pub mod config;
/// Error handling types and utilities
pub mod error;
/// Gemini text generation
pub mod gemini;
/// GitHub profile fetching and shaping
pub mod github;
/// Logging configuration and utilities
pub mod logging;
/// Roast prompt rendering
pub mod prompts;
/// Per-client request limiting
pub mod rate_limiter;

pub use config::Config;
pub use error::{Result, RoastError};
pub use gemini::{GeminiClient, RoastGenerator};
pub use github::{GitHubClient, ProfileSource, ProfileSummary, RepoSummary};
pub use prompts::{build_prompt, PromptBuilder};
pub use rate_limiter::{RateLimitStore, RateLimiter};
