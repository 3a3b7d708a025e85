use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repositories kept in a summary, most recently updated first
pub const MAX_REPOSITORIES: usize = 50;

/// Stands in for the profile README when there isn't one
pub const README_NOT_FOUND: &str = "README.md not found";

/// User record from `GET /users/{username}`
///
/// Every field is optional; whatever the provider omits stays null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitHubUser {
    pub login: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub public_repos: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Repository record from `GET /users/{username}/repos`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitHubRepo {
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: Option<u64>,
    pub open_issues_count: Option<u64>,
    pub license: Option<GitHubLicense>,
    pub fork: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitHubLicense {
    pub name: Option<String>,
}

/// Shaped profile handed to the prompt builder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub public_repos: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub repositories: Vec<RepoSummary>,
    /// README text, or [`README_NOT_FOUND`]
    pub readme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoSummary {
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: Option<u64>,
    pub open_issues_count: Option<u64>,
    pub license: Option<String>,
    pub fork: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<GitHubRepo> for RepoSummary {
    fn from(repo: GitHubRepo) -> Self {
        Self {
            name: repo.name,
            description: repo.description,
            language: repo.language,
            stargazers_count: repo.stargazers_count,
            open_issues_count: repo.open_issues_count,
            license: repo.license.and_then(|license| license.name),
            fork: repo.fork,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
        }
    }
}

impl ProfileSummary {
    /// Projects the raw provider records into a summary
    ///
    /// Repositories keep the provider's order and are cut to
    /// [`MAX_REPOSITORIES`]. A missing or blank README becomes the sentinel.
    pub fn from_parts(user: GitHubUser, repos: Vec<GitHubRepo>, readme: Option<String>) -> Self {
        let repositories = repos
            .into_iter()
            .take(MAX_REPOSITORIES)
            .map(RepoSummary::from)
            .collect();

        let readme = readme
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| README_NOT_FOUND.to_string());

        Self {
            name: user.name,
            bio: user.bio,
            company: user.company,
            location: user.location,
            followers: user.followers,
            following: user.following,
            public_repos: user.public_repos,
            created_at: user.created_at,
            updated_at: user.updated_at,
            repositories,
            readme,
        }
    }

    /// Whether `readme` holds real content rather than the sentinel
    pub fn has_readme(&self) -> bool {
        self.readme != README_NOT_FOUND
    }
}
