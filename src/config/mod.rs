mod env_manager;

use crate::error::{Result, RoastError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub use env_manager::{get_env_value, load_dotenv};

/// Main configuration struct for the service
///
/// Built once at startup and handed to the components that need it. Nothing
/// below this module reads the process environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gemini API key, required to start
    pub gemini_api_key: Option<String>,
    /// GitHub token for authenticated requests
    pub github_token: Option<String>,
    /// Interface the HTTP server binds to
    pub host: String,
    /// Port the HTTP server listens on
    pub port: u16,
    /// GitHub REST API base URL
    pub github_api_base: String,
    /// Base URL for raw repository content
    pub github_raw_base: String,
    /// Generative Language API base URL
    pub gemini_api_base: String,
    /// Gemini model identifier
    pub model: String,
    /// Language the roast is written in
    pub language: String,
    /// Timeout applied to each outbound request
    pub request_timeout_secs: u64,
    /// Per-client request allowance
    pub rate_limit: RateLimitConfig,
    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
}

/// Fixed-window rate limit settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub capacity: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            window_secs: 60,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            github_token: None,
            host: "0.0.0.0".to_string(),
            port: 3000,
            github_api_base: "https://api.github.com".to_string(),
            github_raw_base: "https://raw.githubusercontent.com".to_string(),
            gemini_api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            language: "Bahasa Indonesia".to_string(),
            request_timeout_secs: 10,
            rate_limit: RateLimitConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from an optional TOML file, then applies
    /// environment overrides
    ///
    /// # Arguments
    /// * `path` - TOML file to read; defaults are used when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(get_env_value)
    }

    /// Parses a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RoastError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| RoastError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Applies overrides from a key/value lookup such as the process environment
    ///
    /// Empty values are treated as unset.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).and_then(env_manager::non_empty);

        if let Some(key) = get(env_manager::GEMINI_API_KEY) {
            self.gemini_api_key = Some(key);
        }
        if let Some(token) = get(env_manager::GITHUB_TOKEN) {
            self.github_token = Some(token);
        }
        if let Some(host) = get(env_manager::HOST) {
            self.host = host;
        }
        if let Some(port) = get(env_manager::PORT) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| RoastError::Config(format!("Invalid PORT value: {}", port)))?;
        }
        if let Some(level) = get(env_manager::LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(model) = get(env_manager::GEMINI_MODEL) {
            self.model = model;
        }
        if let Some(language) = get(env_manager::ROAST_LANGUAGE) {
            self.language = language;
        }
        Ok(self)
    }

    /// Checks that the configuration is usable before the server starts
    pub fn validate(&self) -> Result<()> {
        self.gemini_api_key()?;

        if let Some(token) = &self.github_token {
            if token.trim().is_empty() {
                return Err(RoastError::Config("GitHub token is empty".into()));
            }
        }
        if self.port == 0 {
            return Err(RoastError::Config("Port must be non-zero".into()));
        }
        for (name, base) in [
            ("github_api_base", &self.github_api_base),
            ("github_raw_base", &self.github_raw_base),
            ("gemini_api_base", &self.gemini_api_base),
        ] {
            Url::parse(base)
                .map_err(|e| RoastError::Config(format!("Invalid {} '{}': {}", name, base, e)))?;
        }
        if self.model.trim().is_empty() {
            return Err(RoastError::Config("Model identifier is empty".into()));
        }
        if self.rate_limit.capacity == 0 || self.rate_limit.window_secs == 0 {
            return Err(RoastError::Config(
                "Rate limit capacity and window must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Retrieves the Gemini API key
    pub fn gemini_api_key(&self) -> Result<&str> {
        self.gemini_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| RoastError::Config("GEMINI_API_KEY is not configured".into()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolves `host:port` into a bindable address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| RoastError::Config(format!("Cannot resolve {}:{}", self.host, self.port)))
    }
}
