mod profile;

pub use profile::{
    GitHubLicense, GitHubRepo, GitHubUser, ProfileSummary, RepoSummary, MAX_REPOSITORIES,
    README_NOT_FOUND,
};

use crate::config::Config;
use crate::error::{Result, RoastError};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const CLIENT_USER_AGENT: &str = concat!("github-roaster/", env!("CARGO_PKG_VERSION"));

/// Source of shaped profiles
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetches and shapes the public profile of `username`
    ///
    /// The client tries the authenticated call set with the README on `main`.
    /// If that succeeds but `main` has no README, it probes `master` once with
    /// the same credentials before settling on the not-found sentinel. Any
    /// other failure reruns all three calls once, anonymously, against `master`.
    async fn fetch(&self, username: &str) -> Result<ProfileSummary>;
}

/// Result of a single upstream call
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Found(T),
    /// The provider answered 404
    NotFound,
    /// Transport error, any other non-success status, or an undecodable body
    Failed(String),
}

/// Credentials and README branch used for one round of the three calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchAttempt {
    pub authenticated: bool,
    pub branch: &'static str,
}

impl FetchAttempt {
    pub const PRIMARY: Self = Self {
        authenticated: true,
        branch: "main",
    };

    pub const FALLBACK: Self = Self {
        authenticated: false,
        branch: "master",
    };
}

/// The three raw pieces a summary is built from
pub type ProfileParts = (GitHubUser, Vec<GitHubRepo>, Option<String>);

/// GitHub REST and raw-content client
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: Url,
    raw_base: Url,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_endpoints(
            &config.github_api_base,
            &config.github_raw_base,
            config.github_token.clone(),
            config.request_timeout(),
        )
    }

    /// Builds a client against explicit API and raw-content hosts
    pub fn with_endpoints(
        api_base: &str,
        raw_base: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RoastError::Http)?;

        Ok(Self {
            client,
            api_base: parse_base(api_base)?,
            raw_base: parse_base(raw_base)?,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// `GET /users/{username}`
    pub async fn fetch_user(&self, username: &str, authenticated: bool) -> Outcome<GitHubUser> {
        match endpoint(&self.api_base, &["users", username]) {
            Ok(url) => self.get_json(url, authenticated).await,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }

    /// `GET /users/{username}/repos?sort=updated`
    pub async fn fetch_repos(&self, username: &str, authenticated: bool) -> Outcome<Vec<GitHubRepo>> {
        match endpoint(&self.api_base, &["users", username, "repos"]) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("sort", "updated");
                self.get_json(url, authenticated).await
            }
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }

    /// Raw `README.md` of the `{username}/{username}` profile repository
    pub async fn fetch_readme(&self, username: &str, branch: &str, authenticated: bool) -> Outcome<String> {
        let url = match endpoint(&self.raw_base, &[username, username, branch, "README.md"]) {
            Ok(url) => url,
            Err(e) => return Outcome::Failed(e.to_string()),
        };

        match self.send(url, authenticated).await {
            Outcome::Found(response) => match response.text().await {
                Ok(text) => Outcome::Found(text),
                Err(e) => Outcome::Failed(format!("Failed to read README body: {}", e)),
            },
            Outcome::NotFound => Outcome::NotFound,
            Outcome::Failed(reason) => Outcome::Failed(reason),
        }
    }

    /// Issues the profile, repository and README calls concurrently
    ///
    /// A README 404 is not a failure and yields `None`. Anything else that
    /// goes wrong fails the whole attempt.
    pub async fn fetch_all(&self, username: &str, attempt: FetchAttempt) -> std::result::Result<ProfileParts, String> {
        let authenticated = attempt.authenticated && self.token.is_some();
        debug!(
            "Fetching {} (authenticated: {}, branch: {})",
            username, authenticated, attempt.branch
        );

        let (user, repos, readme) = tokio::join!(
            self.fetch_user(username, authenticated),
            self.fetch_repos(username, authenticated),
            self.fetch_readme(username, attempt.branch, authenticated),
        );

        let user = match user {
            Outcome::Found(user) => user,
            Outcome::NotFound => return Err(format!("user {} not found", username)),
            Outcome::Failed(reason) => return Err(reason),
        };
        let repos = match repos {
            Outcome::Found(repos) => repos,
            Outcome::NotFound => return Err(format!("repositories of {} not found", username)),
            Outcome::Failed(reason) => return Err(reason),
        };
        let readme = match readme {
            Outcome::Found(text) => Some(text),
            Outcome::NotFound => None,
            Outcome::Failed(reason) => return Err(reason),
        };

        Ok((user, repos, readme))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, authenticated: bool) -> Outcome<T> {
        match self.send(url, authenticated).await {
            Outcome::Found(response) => {
                let url = response.url().clone();
                match response.json::<T>().await {
                    Ok(value) => Outcome::Found(value),
                    Err(e) => Outcome::Failed(format!("Failed to decode {}: {}", url, e)),
                }
            }
            Outcome::NotFound => Outcome::NotFound,
            Outcome::Failed(reason) => Outcome::Failed(reason),
        }
    }

    async fn send(&self, url: Url, authenticated: bool) -> Outcome<reqwest::Response> {
        let mut request = self
            .client
            .get(url.clone())
            .header(USER_AGENT, CLIENT_USER_AGENT);
        if authenticated {
            if let Some(token) = &self.token {
                request = request.header(AUTHORIZATION, format!("token {}", token));
            }
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Outcome::Failed(format!("GET {} failed: {}", url, e)),
        };

        match response.status() {
            status if status.is_success() => Outcome::Found(response),
            StatusCode::NOT_FOUND => Outcome::NotFound,
            status => Outcome::Failed(format!("GET {} returned {}", url, status)),
        }
    }
}

#[async_trait]
impl ProfileSource for GitHubClient {
    async fn fetch(&self, username: &str) -> Result<ProfileSummary> {
        let primary = FetchAttempt::PRIMARY;

        let (user, repos, readme) = match self.fetch_all(username, primary).await {
            Ok((user, repos, None)) => {
                // Older profile repositories still live on `master`.
                let authenticated = primary.authenticated && self.token.is_some();
                let readme = match self
                    .fetch_readme(username, FetchAttempt::FALLBACK.branch, authenticated)
                    .await
                {
                    Outcome::Found(text) => Some(text),
                    Outcome::NotFound => None,
                    Outcome::Failed(reason) => {
                        warn!("README probe for {} failed: {}", username, reason);
                        None
                    }
                };
                (user, repos, readme)
            }
            Ok(parts) => parts,
            Err(primary_reason) => {
                warn!(
                    "Primary GitHub fetch for {} failed, retrying without auth: {}",
                    username, primary_reason
                );
                self.fetch_all(username, FetchAttempt::FALLBACK)
                    .await
                    .map_err(|fallback_reason| {
                        RoastError::UpstreamFetch(format!(
                            "primary: {}; fallback: {}",
                            primary_reason, fallback_reason
                        ))
                    })?
            }
        };

        info!(
            "Fetched GitHub profile for {} ({} repositories, readme: {})",
            username,
            repos.len(),
            readme.is_some()
        );
        Ok(ProfileSummary::from_parts(user, repos, readme))
    }
}

fn parse_base(base: &str) -> Result<Url> {
    Url::parse(base).map_err(|e| RoastError::Config(format!("Invalid base URL '{}': {}", base, e)))
}

/// Appends percent-encoded path segments to `base`
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| RoastError::Config(format!("URL cannot be a base: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
