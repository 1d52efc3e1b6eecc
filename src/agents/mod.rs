//! Agent System
//!
//! Each agent is a fixed instruction template plus an output schema, bound to the shared
//! [`GenerationInvoker`]:
//!
//! - **Clinical Agent**: prevalence, inheritance and classification
//! - **Bio-Mechanism Agent**: molecular mechanism, target proteins, cellular vulnerability
//! - **Discovery Agent**: clinical trials, cross-disease insights, bibliography
//! - **Repurposing Agent**: on-demand drug repurposing candidates
//!
//! ## Pipeline Overview
//!
//! ```text
//!            Grounding Context
//!                    │
//!      ┌─────────────┼─────────────┐
//!      ▼             ▼             ▼
//! ┌──────────┐ ┌──────────┐ ┌───────────┐
//! │ Clinical │ │   Bio-   │ │ Discovery │   (concurrent)
//! │  Agent   │ │Mechanism │ │   Agent   │
//! └──────────┘ └──────────┘ └───────────┘
//!      │             │             │
//!      └─────────────┼─────────────┘
//!                    ▼
//!             Disease Insight ──► Repurposing Agent (later, on demand)
//! ```

pub mod clinical;
pub mod discovery;
pub mod invoker;
pub mod mechanism;
pub mod repurposing;

pub use clinical::ClinicalAgent;
pub use discovery::DiscoveryAgent;
pub use invoker::{AgentError, AgentInvocation, GenerationInvoker};
pub use mechanism::MechanismAgent;
pub use repurposing::RepurposingAgent;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::citations::CitationSink;
use crate::events::LogSink;
use crate::grounding::GroundingContext;

/// A primary agent run against the shared grounding context.
pub trait ResearchAgent: Send + Sync {
    type Fragment: DeserializeOwned + Default + Send;

    const LABEL: &'static str;
    const START_LOGS: &'static [&'static str];

    fn instruction(&self, query: &str) -> String;

    /// Output schema in the generation service's `responseSchema` dialect
    fn schema(&self) -> Value;
}

impl GenerationInvoker {
    pub async fn run_agent<A: ResearchAgent>(
        &self,
        agent: &A,
        query: &str,
        context: &GroundingContext,
        log: &LogSink,
        citations: &CitationSink,
    ) -> Result<A::Fragment, AgentError> {
        let invocation = AgentInvocation {
            label: A::LABEL,
            start_logs: A::START_LOGS,
            context: context.as_str(),
            query: Some(query),
            instruction: agent.instruction(query),
            schema: agent.schema(),
            thinking_budget: self.thinking_budget(),
        };

        self.invoke(&invocation, log, citations).await
    }
}
