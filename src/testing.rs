// Test doubles for the generation service and the enrichment sources.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::events::{LogEvent, LogSink};
use crate::llm::LLMAdapter;
use crate::sources::{
    ClinVarVariant, EnrichmentSources, GeneRecord, OmimEntry, OrphanetRecord, PubMedArticle,
    UniProtEntry,
};
use crate::types::{AppError, AppResult, GenerationRequest, GenerationResponse};

pub fn collecting_sink() -> (LogSink, Arc<Mutex<Vec<LogEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let target = events.clone();
    let sink = LogSink::from_callback(move |event| target.lock().unwrap().push(event.clone()));
    (sink, events)
}

pub enum Reply {
    Respond(GenerationResponse),
    Fail(String),
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    pub fn json(value: serde_json::Value) -> Self {
        Reply::Respond(GenerationResponse {
            text: Some(value.to_string()),
            ..Default::default()
        })
    }
}

/// Which agent a request belongs to, recognised by its output schema
pub fn agent_key(request: &GenerationRequest) -> &'static str {
    let properties = &request.response_schema["properties"];
    if properties.get("prevalence").is_some() {
        "clinical"
    } else if properties.get("molecularMechanism").is_some() {
        "mechanism"
    } else if properties.get("clinicalTrials").is_some() {
        "discovery"
    } else if properties.get("repurposingCandidates").is_some() {
        "repurposing"
    } else {
        "unknown"
    }
}

/// Generation service double answering per agent from a script
#[derive(Default)]
pub struct ScriptedAdapter {
    replies: HashMap<&'static str, Reply>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, agent: &'static str, reply: Reply) -> Self {
        self.replies.insert(agent, reply);
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    async fn play(reply: &Reply) -> AppResult<GenerationResponse> {
        let mut current = reply;
        loop {
            match current {
                Reply::Respond(response) => return Ok(response.clone()),
                Reply::Fail(message) => return Err(AppError::LLMApi(message.clone())),
                Reply::Delayed(delay, next) => {
                    tokio::time::sleep(*delay).await;
                    current = next.as_ref();
                }
            }
        }
    }
}

#[async_trait]
impl LLMAdapter for ScriptedAdapter {
    async fn generate_content(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.get(agent_key(request)) {
            Some(reply) => Self::play(reply).await,
            None => Err(AppError::LLMApi("no scripted reply".to_string())),
        }
    }
}

/// Enrichment double with fixed answers and per-source latency
#[derive(Default)]
pub struct StaticSources {
    pub orphanet: Option<OrphanetRecord>,
    pub omim: Option<Vec<OmimEntry>>,
    pub uniprot: Option<Vec<UniProtEntry>>,
    pub gene: Option<GeneRecord>,
    pub clinvar: Option<Vec<ClinVarVariant>>,
    pub pubmed: Option<Vec<PubMedArticle>>,
    pub latency: HashMap<&'static str, Duration>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl StaticSources {
    async fn visit(&self, source: &'static str) {
        if let Some(delay) = self.latency.get(source) {
            tokio::time::sleep(*delay).await;
        }
        self.calls.lock().unwrap().push(source);
    }
}

#[async_trait]
impl EnrichmentSources for StaticSources {
    async fn orphanet(&self, _query: &str) -> Option<OrphanetRecord> {
        self.visit("orphanet").await;
        self.orphanet.clone()
    }

    async fn omim(&self, _query: &str) -> Option<Vec<OmimEntry>> {
        self.visit("omim").await;
        self.omim.clone()
    }

    async fn uniprot(&self, _query: &str) -> Option<Vec<UniProtEntry>> {
        self.visit("uniprot").await;
        self.uniprot.clone()
    }

    async fn gene(&self, _query: &str) -> Option<GeneRecord> {
        self.visit("gene").await;
        self.gene.clone()
    }

    async fn clinvar(&self, _query: &str) -> Option<Vec<ClinVarVariant>> {
        self.visit("clinvar").await;
        self.clinvar.clone()
    }

    async fn pubmed(&self, _query: &str) -> Option<Vec<PubMedArticle>> {
        self.visit("pubmed").await;
        self.pubmed.clone()
    }
}
