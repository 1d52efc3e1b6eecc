// Type definitions and enums

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LLMProvider {
    Google,
}

impl LLMProvider {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "google" | "gemini" => Some(LLMProvider::Google),
            _ => None,
        }
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::Google => write!(f, "google"),
        }
    }
}

/// One structured-generation call.
///
/// Every call asks for strict JSON matching `response_schema`; the search tool and the
/// reasoning side channel are toggled per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub response_schema: serde_json::Value,
    pub enable_search: bool,
    pub thinking_budget: u32,
    pub include_thoughts: bool,
}

/// Result of a generation call: the JSON answer plus its side channels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Final answer text, `None` when the service produced no answer parts
    pub text: Option<String>,
    /// Reasoning fragments in the order the service returned them
    pub thoughts: Vec<String>,
    /// Web sources the service grounded its answer on
    pub citations: Vec<Citation>,
}

/// A grounding source reported by the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

impl Citation {
    pub const DEFAULT_TITLE: &'static str = "Scientific Resource";

    pub fn new(title: Option<&str>, uri: impl Into<String>) -> Self {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(Self::DEFAULT_TITLE);
        Self {
            title: title.to_string(),
            uri: uri.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_id() {
        assert_eq!(LLMProvider::from_id("gemini"), Some(LLMProvider::Google));
        assert_eq!(LLMProvider::from_id("google"), Some(LLMProvider::Google));
        assert_eq!(LLMProvider::from_id("openai"), None);
    }

    #[test]
    fn test_citation_title_fallback() {
        let citation = Citation::new(None, "https://example.org/a");
        assert_eq!(citation.title, "Scientific Resource");

        let citation = Citation::new(Some("  "), "https://example.org/b");
        assert_eq!(citation.title, "Scientific Resource");

        let citation = Citation::new(Some("Fabry review"), "https://example.org/c");
        assert_eq!(citation.title, "Fabry review");
    }
}
