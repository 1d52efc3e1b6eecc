//! Generation Invoker
//!
//! The single procedure every agent goes through: one schema-constrained generation call,
//! reasoning fragments surfaced as thought events, citations merged into the shared sink.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::citations::CitationSink;
use crate::events::{LogKind, LogSink};
use crate::llm::LLMAdapter;
use crate::models::strip_nulls;
use crate::types::{AppError, GenerationRequest};

pub const SYNTHESIS_COMPLETE: &str = "Data synthesis complete.";
pub const FALLBACK_NOTICE: &str = "error. Reverting to internal knowledge.";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Generation failed: {0}")]
    Generation(#[from] AppError),

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Response was not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Response did not match the {agent} schema: {reason}")]
    Schema { agent: String, reason: String },
}

/// Everything one generation call needs
#[derive(Debug, Clone)]
pub struct AgentInvocation<'a> {
    pub label: &'a str,
    pub start_logs: &'a [&'a str],
    pub context: &'a str,
    /// The user's query, repeated after the context when the instruction is query-specific
    pub query: Option<&'a str>,
    pub instruction: String,
    pub schema: Value,
    pub thinking_budget: u32,
}

impl AgentInvocation<'_> {
    pub fn prompt(&self) -> String {
        match self.query {
            Some(query) => format!(
                "{}\n\nUSER QUERY: {}\n\nINSTRUCTION: {}",
                self.context, query, self.instruction
            ),
            None => format!("{}\n\nINSTRUCTION: {}", self.context, self.instruction),
        }
    }
}

/// Shared handle to the generation service, cloned into every concurrent agent branch.
#[derive(Clone)]
pub struct GenerationInvoker {
    adapter: Arc<dyn LLMAdapter>,
    model: String,
    timeout: Duration,
    thinking_budget: u32,
}

impl GenerationInvoker {
    pub fn new(adapter: Arc<dyn LLMAdapter>, model: impl Into<String>, timeout: Duration, thinking_budget: u32) -> Self {
        Self {
            adapter,
            model: model.into(),
            timeout,
            thinking_budget,
        }
    }

    pub fn from_config(adapter: Arc<dyn LLMAdapter>, config: &crate::config::LLMConfig) -> Self {
        Self::new(
            adapter,
            config.model.clone(),
            config.request_timeout(),
            config.thinking_budget,
        )
    }

    /// Default reasoning budget for primary agents
    pub fn thinking_budget(&self) -> u32 {
        self.thinking_budget
    }

    /// Run one invocation and decode its answer as `T`.
    ///
    /// Progress events are only ever appended and citations only ever added. On failure a
    /// fallback event is emitted and the error is returned for the caller to degrade.
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        invocation: &AgentInvocation<'_>,
        log: &LogSink,
        citations: &CitationSink,
    ) -> Result<T, AgentError> {
        for line in invocation.start_logs {
            log.agent(invocation.label, LogKind::Progress, *line);
        }

        match self.call(invocation, log, citations).await {
            Ok(fragment) => {
                log.agent(invocation.label, LogKind::Progress, SYNTHESIS_COMPLETE);
                Ok(fragment)
            }
            Err(e) => {
                warn!(agent = %invocation.label, error = %e, "Agent invocation failed, degrading");
                log.agent(invocation.label, LogKind::Fallback, FALLBACK_NOTICE);
                Err(e)
            }
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        invocation: &AgentInvocation<'_>,
        log: &LogSink,
        citations: &CitationSink,
    ) -> Result<T, AgentError> {
        let request = GenerationRequest {
            model: self.model.clone(),
            prompt: invocation.prompt(),
            response_schema: invocation.schema.clone(),
            enable_search: true,
            thinking_budget: invocation.thinking_budget,
            include_thoughts: true,
        };

        let response = tokio::time::timeout(self.timeout, self.adapter.generate_content(&request))
            .await
            .map_err(|_| AgentError::Timeout(self.timeout))??;

        let value = parse_fragment(response.text.as_deref())?;

        // Side channels are kept once the answer is JSON, even if it then misses the schema
        for thought in response.thoughts {
            log.agent(invocation.label, LogKind::Thought, thought);
        }

        let added = citations.extend(response.citations).await;
        debug!(agent = %invocation.label, new_citations = added, "Agent response processed");

        into_fragment(invocation.label, value)
    }
}

/// Decode the answer text; an absent or blank answer is an empty fragment
pub fn parse_fragment(text: Option<&str>) -> Result<Value, AgentError> {
    let raw = text.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    let direct = match serde_json::from_str(raw) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    // Some models still wrap JSON in a Markdown fence despite the JSON mime type
    match fenced_body(raw) {
        Some(body) => serde_json::from_str(body).map_err(AgentError::InvalidJson),
        None => Err(AgentError::InvalidJson(direct)),
    }
}

/// Body of the first Markdown code fence, without its opening line and language tag
fn fenced_body(raw: &str) -> Option<&str> {
    let (_, after_open) = raw.split_once("```")?;
    let body = match after_open.split_once('\n') {
        Some((tag, rest)) if !tag.trim_start().starts_with(['{', '[']) => rest,
        _ => after_open,
    };
    let body = body.split("```").next().unwrap_or(body);
    Some(body.trim())
}

/// Map a JSON object onto a typed fragment, treating `null` members as absent
pub fn into_fragment<T: DeserializeOwned>(agent: &str, mut value: Value) -> Result<T, AgentError> {
    if !value.is_object() {
        return Err(AgentError::Schema {
            agent: agent.to_string(),
            reason: "expected a JSON object".to_string(),
        });
    }

    strip_nulls(&mut value);
    serde_json::from_value(value).map_err(|e| AgentError::Schema {
        agent: agent.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LogEvent;
    use crate::testing::{collecting_sink, Reply, ScriptedAdapter};
    use crate::types::{Citation, GenerationResponse};
    use serde_json::json;

    fn invocation(context: &str) -> AgentInvocation<'_> {
        AgentInvocation {
            label: "Clinical Agent",
            start_logs: &["Querying Orphanet Registry...", "Cross-referencing inheritance patterns..."],
            context,
            query: Some("Fabry disease"),
            instruction: "Extract clinical statistics".to_string(),
            schema: json!({ "type": "OBJECT", "properties": { "prevalence": { "type": "STRING" } } }),
            thinking_budget: 8192,
        }
    }

    fn invoker(adapter: ScriptedAdapter, timeout: Duration) -> (GenerationInvoker, Arc<ScriptedAdapter>) {
        let adapter = Arc::new(adapter);
        (
            GenerationInvoker::new(adapter.clone(), "test-model", timeout, 8192),
            adapter,
        )
    }

    fn messages(events: &[LogEvent]) -> Vec<String> {
        events.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_parse_fragment_variants() {
        assert_eq!(parse_fragment(None).unwrap(), json!({}));
        assert_eq!(parse_fragment(Some("   ")).unwrap(), json!({}));
        assert_eq!(parse_fragment(Some(r#"{"a":1}"#)).unwrap(), json!({ "a": 1 }));
        assert_eq!(
            parse_fragment(Some("```json\n{\"a\":2}\n```")).unwrap(),
            json!({ "a": 2 })
        );
        assert!(matches!(parse_fragment(Some("not json")), Err(AgentError::InvalidJson(_))));
    }

    #[test]
    fn test_parse_fragment_fence_tags_are_not_case_sensitive() {
        assert_eq!(
            parse_fragment(Some("```JSON\n{\"a\":1}\n```")).unwrap(),
            json!({ "a": 1 })
        );
        assert_eq!(
            parse_fragment(Some("Here is the report:\n```json\n{\"a\":2}\n```\nDone.")).unwrap(),
            json!({ "a": 2 })
        );
        assert_eq!(
            parse_fragment(Some("```\n{\"a\":3}\n```")).unwrap(),
            json!({ "a": 3 })
        );
        assert_eq!(parse_fragment(Some("```{\"a\":4}```")).unwrap(), json!({ "a": 4 }));
        assert!(matches!(
            parse_fragment(Some("```json\nstill not json\n```")),
            Err(AgentError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_prompt_without_query_has_no_query_line() {
        let invocation = AgentInvocation { query: None, ..invocation("CTX") };
        assert_eq!(invocation.prompt(), "CTX\n\nINSTRUCTION: Extract clinical statistics");
    }

    #[test]
    fn test_into_fragment_rejects_non_objects() {
        let result: Result<Value, _> = into_fragment("Clinical Agent", json!([1, 2]));
        assert!(matches!(result, Err(AgentError::Schema { .. })));
    }

    #[tokio::test]
    async fn test_success_logs_thoughts_in_order_and_collects_citations() {
        let response = GenerationResponse {
            text: Some(r#"{"prevalence":"1 in 40,000"}"#.to_string()),
            thoughts: vec!["first thought".to_string(), "second thought".to_string()],
            citations: vec![
                Citation::new(Some("A"), "https://a.org"),
                Citation::new(Some("A again"), "https://a.org"),
            ],
        };
        let (invoker, adapter) = invoker(
            ScriptedAdapter::new().with("clinical", Reply::Respond(response)),
            Duration::from_secs(5),
        );
        let (sink, events) = collecting_sink();
        let citations = CitationSink::new();

        let value: Value = invoker
            .invoke(&invocation("GROUNDING"), &sink, &citations)
            .await
            .unwrap();

        assert_eq!(value["prevalence"], "1 in 40,000");
        assert_eq!(
            messages(&events.lock().unwrap()),
            vec![
                "[Clinical Agent] Querying Orphanet Registry...",
                "[Clinical Agent] Cross-referencing inheritance patterns...",
                "[Clinical Agent 💭] first thought",
                "[Clinical Agent 💭] second thought",
                "[Clinical Agent] Data synthesis complete.",
            ]
        );
        assert_eq!(citations.snapshot().await.len(), 1);

        let requests = adapter.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].prompt,
            "GROUNDING\n\nUSER QUERY: Fabry disease\n\nINSTRUCTION: Extract clinical statistics"
        );
        assert!(requests[0].enable_search);
        assert!(requests[0].include_thoughts);
        assert_eq!(requests[0].thinking_budget, 8192);
        assert_eq!(requests[0].model, "test-model");
    }

    #[tokio::test]
    async fn test_failure_emits_fallback_and_returns_error() {
        let (invoker, _) = invoker(
            ScriptedAdapter::new().with("clinical", Reply::Fail("boom".to_string())),
            Duration::from_secs(5),
        );
        let (sink, events) = collecting_sink();
        let citations = CitationSink::new();

        let result: Result<Value, _> = invoker.invoke(&invocation("CTX"), &sink, &citations).await;

        assert!(matches!(result, Err(AgentError::Generation(_))));
        let events = events.lock().unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.kind, LogKind::Fallback);
        assert_eq!(last.to_string(), "[Clinical Agent] error. Reverting to internal knowledge.");
        assert!(citations.is_empty().await);
    }

    #[tokio::test]
    async fn test_unparseable_answer_is_failure() {
        let response = GenerationResponse {
            text: Some("I think the prevalence is low".to_string()),
            thoughts: vec!["should not be logged".to_string()],
            citations: vec![Citation::new(None, "https://x.org")],
        };
        let (invoker, _) = invoker(
            ScriptedAdapter::new().with("clinical", Reply::Respond(response)),
            Duration::from_secs(5),
        );
        let (sink, events) = collecting_sink();
        let citations = CitationSink::new();

        let result: Result<Value, _> = invoker.invoke(&invocation("CTX"), &sink, &citations).await;

        assert!(matches!(result, Err(AgentError::InvalidJson(_))));
        assert!(!events.lock().unwrap().iter().any(|e| e.is_thought()));
        assert!(citations.is_empty().await);
    }

    #[tokio::test]
    async fn test_schema_mismatch_keeps_thoughts_and_citations() {
        let response = GenerationResponse {
            text: Some("[1, 2]".to_string()),
            thoughts: vec!["weighing sources".to_string()],
            citations: vec![Citation::new(Some("Orphanet"), "https://www.orpha.net")],
        };
        let (invoker, _) = invoker(
            ScriptedAdapter::new().with("clinical", Reply::Respond(response)),
            Duration::from_secs(5),
        );
        let (sink, events) = collecting_sink();
        let citations = CitationSink::new();

        let result: Result<Value, _> = invoker.invoke(&invocation("CTX"), &sink, &citations).await;

        assert!(matches!(result, Err(AgentError::Schema { .. })));
        assert!(events.lock().unwrap().iter().any(|e| e.is_thought()));
        assert_eq!(citations.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_answer_is_empty_fragment() {
        let (invoker, _) = invoker(
            ScriptedAdapter::new().with("clinical", Reply::Respond(GenerationResponse::default())),
            Duration::from_secs(5),
        );
        let (sink, _) = collecting_sink();

        let value: Value = invoker
            .invoke(&invocation("CTX"), &sink, &CitationSink::new())
            .await
            .unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn test_timeout_degrades() {
        let slow = Reply::Delayed(
            Duration::from_secs(30),
            Box::new(Reply::Respond(GenerationResponse::default())),
        );
        let (invoker, _) = invoker(
            ScriptedAdapter::new().with("clinical", slow),
            Duration::from_millis(50),
        );
        let (sink, events) = collecting_sink();

        let result: Result<Value, _> = invoker
            .invoke(&invocation("CTX"), &sink, &CitationSink::new())
            .await;

        assert!(matches!(result, Err(AgentError::Timeout(_))));
        assert_eq!(events.lock().unwrap().last().unwrap().kind, LogKind::Fallback);
    }
}
