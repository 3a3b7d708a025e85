use crate::github::ProfileSummary;

/// Default language the roast is written in
pub const DEFAULT_LANGUAGE: &str = "Bahasa Indonesia";

/// Instruction sent to the model. `{0}` is the username, `{1}` the profile
/// JSON and `{2}` the response language.
pub const ROAST_TEMPLATE: &str = r#"Provide a long, harsh, and sarcastic roast for the GitHub profile of {0}. Details: "{1}" (Respond 2 paragraph in {2} and avoid praise or advice)"#;

pub const README_ABSENT: &str = "Not Found";

/// Renders roast prompts for a fixed response language
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    language: String,
}

impl PromptBuilder {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Embeds the serialized profile and its README into the template
    pub fn build(&self, profile: &ProfileSummary, username: &str) -> String {
        let details = serde_json::to_string(profile).unwrap_or_else(|_| "{}".to_string());

        let mut prompt = render(ROAST_TEMPLATE, &[username, details.as_str(), self.language.as_str()]);

        if profile.has_readme() {
            prompt.push_str(&format!(", Profile Markdown: ```{}```", profile.readme));
        } else {
            prompt.push_str(&format!(", Profile Markdown: {}", README_ABSENT));
        }
        prompt
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

/// Substitutes `{n}` placeholders in a single pass over the template, so
/// braces inside the arguments are copied verbatim
fn render(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let placeholder = tail.find('}').and_then(|end| {
            tail[1..end]
                .parse::<usize>()
                .ok()
                .and_then(|index| args.get(index))
                .map(|arg| (*arg, end))
        });

        match placeholder {
            Some((arg, end)) => {
                out.push_str(arg);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Builds a prompt in the default language
pub fn build_prompt(profile: &ProfileSummary, username: &str) -> String {
    PromptBuilder::default().build(profile, username)
}
