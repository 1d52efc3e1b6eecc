use async_trait::async_trait;
use std::sync::Arc;

use crate::types::{AppError, AppResult, GenerationRequest, GenerationResponse, LLMProvider};

/// Structured-generation backend shared by every agent invocation.
#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn generate_content(&self, request: &GenerationRequest) -> AppResult<GenerationResponse>;
}

/// Configuration for LLM provider (renamed to avoid conflict with LLMProvider enum in types.rs)
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    pub api_base: Option<String>,
}

impl LLMProviderConfig {
    pub fn from_config(config: &crate::config::LLMConfig) -> Self {
        Self {
            name: config.provider.clone(),
            api_key: config.google_api_key.clone(),
            api_base: Some(config.api_base.clone()),
        }
    }
}

/// Build the one adapter handle that the orchestrator injects into all invocations.
pub fn create_adapter(provider: LLMProviderConfig) -> AppResult<Arc<dyn LLMAdapter>> {
    let kind = LLMProvider::from_id(&provider.name)
        .ok_or_else(|| AppError::Config(format!("Unsupported provider: {}", provider.name)))?;

    if provider.api_key.trim().is_empty() {
        return Err(AppError::Config(format!("No API key configured for provider {}", kind)));
    }

    let adapter: Arc<dyn LLMAdapter> = match kind {
        LLMProvider::Google => {
            let adapter = match provider.api_base {
                Some(base) => crate::llm::google::GoogleAdapter::with_base_url(&provider.api_key, base),
                None => crate::llm::google::GoogleAdapter::new(&provider.api_key),
            };
            Arc::new(adapter)
        }
    };

    Ok(adapter)
}
