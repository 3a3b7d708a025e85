use std::env;

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const PORT: &str = "PORT";
pub const HOST: &str = "HOST";
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const ROAST_LANGUAGE: &str = "ROAST_LANGUAGE";

/// Loads variables from a `.env` file in the working directory, if one exists.
///
/// Already-set process variables win over the file.
pub fn load_dotenv() -> bool {
    dotenv::dotenv().is_ok()
}

/// Reads an environment variable, treating empty values as unset
pub fn get_env_value(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    non_empty(value)
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
