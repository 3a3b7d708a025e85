#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use github_roaster::api::{create_app, AppState};
use github_roaster::github::{GitHubRepo, GitHubUser, ProfileSource, ProfileSummary};
use github_roaster::{PromptBuilder, RateLimitStore, RateLimiter, Result, RoastError, RoastGenerator};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub mod test_helpers {
    use super::*;

    pub const TOKEN: &str = "test-token";

    pub fn setup_test_logger() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }

    pub fn user_json() -> Value {
        json!({
            "login": "octocat",
            "name": "The Octocat",
            "bio": null,
            "company": "@github",
            "location": "San Francisco",
            "followers": 9000,
            "following": 9,
            "public_repos": 8,
            "created_at": "2011-01-25T18:44:36Z",
            "updated_at": "2024-01-22T12:13:38Z"
        })
    }

    pub fn repos_json(count: usize) -> Value {
        let repos: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "name": format!("repo-{}", i),
                    "description": if i % 2 == 0 { json!("A repository") } else { json!(null) },
                    "language": "Rust",
                    "stargazers_count": i,
                    "open_issues_count": 0,
                    "license": if i == 0 { json!({ "key": "mit", "name": "MIT License" }) } else { json!(null) },
                    "fork": false,
                    "created_at": "2020-01-01T00:00:00Z",
                    "updated_at": "2024-01-01T00:00:00Z"
                })
            })
            .collect();
        Value::Array(repos)
    }

    pub fn gemini_json(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP"
            }]
        })
    }

    pub fn sample_profile() -> ProfileSummary {
        let user = GitHubUser {
            login: Some("octocat".into()),
            name: Some("The Octocat".into()),
            ..GitHubUser::default()
        };
        let repos = vec![GitHubRepo {
            name: Some("Hello-World".into()),
            ..GitHubRepo::default()
        }];
        ProfileSummary::from_parts(user, repos, Some("# Hi, I'm Octocat".into()))
    }

    /// Sends a GET through the router and decodes the JSON body
    pub async fn get(app: Router, uri: &str, forwarded_for: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(ip) = forwarded_for {
            request = request.header("x-forwarded-for", ip);
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// Sends a GET carrying a peer address the way `into_make_service_with_connect_info` would
    pub async fn get_from_peer(app: Router, uri: &str, peer: SocketAddr) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .extension(ConnectInfo(peer))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub fn app_with(
        limiter: Arc<dyn RateLimitStore>,
        profiles: Arc<dyn ProfileSource>,
        generator: Arc<dyn RoastGenerator>,
    ) -> Router {
        create_app(AppState::new(limiter, profiles, generator, PromptBuilder::default()))
    }

    pub fn default_limiter() -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(5, Duration::from_secs(60)))
    }
}

/// Profile source returning a canned profile or failure, counting calls
pub struct FakeProfiles {
    profile: Option<ProfileSummary>,
    pub calls: AtomicUsize,
    pub usernames: Mutex<Vec<String>>,
}

impl FakeProfiles {
    pub fn ok(profile: ProfileSummary) -> Arc<Self> {
        Arc::new(Self {
            profile: Some(profile),
            calls: AtomicUsize::new(0),
            usernames: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            profile: None,
            calls: AtomicUsize::new(0),
            usernames: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_username(&self) -> Option<String> {
        self.usernames.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ProfileSource for FakeProfiles {
    async fn fetch(&self, username: &str) -> Result<ProfileSummary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.usernames.lock().unwrap().push(username.to_string());
        self.profile
            .clone()
            .ok_or_else(|| RoastError::UpstreamFetch("user not found".into()))
    }
}

/// Generator echoing a canned reply and recording the prompts it saw
pub struct FakeGenerator {
    reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn ok(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl RoastGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| RoastError::Generation("quota exhausted for key AIza-secret".into()))
    }
}

/// Limiter that counts invocations and always admits
#[derive(Default)]
pub struct CountingLimiter {
    pub calls: AtomicUsize,
}

impl CountingLimiter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateLimitStore for CountingLimiter {
    async fn consume(&self, _key: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
