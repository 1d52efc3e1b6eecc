//! Repurposing Agent
//!
//! Runs on demand after a search has finished, against a condensed context built from the
//! finished report rather than the full grounding context.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::invoker::{AgentInvocation, GenerationInvoker};
use crate::citations::CitationSink;
use crate::events::LogSink;
use crate::models::RepurposingCandidate;

const TASK: &str = "TASK: Drug Repurposing Generator
- Identify 3-5 existing approved drugs (from DrugBank/ChEMBL) that modulate the targets or pathways involved in this disease.
- Focus on drugs approved for OTHER indications that share mechanism overlap.
- Rate their feasibility (0-100).
- Provide specific validation steps.";

/// Candidates are kept as raw values so one malformed entry does not sink the rest
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RepurposingEnvelope {
    repurposing_candidates: Vec<Value>,
}

pub struct RepurposingAgent {
    thinking_budget: u32,
}

impl RepurposingAgent {
    pub const LABEL: &'static str = "Repurposing Agent";

    pub fn new(thinking_budget: u32) -> Self {
        Self { thinking_budget }
    }

    pub fn context(disease_name: &str, mechanism: &str, target_proteins: &[String]) -> String {
        format!(
            "CONTEXT:\nDISEASE: {}\nMECHANISM: {}\nTARGETS: {}",
            disease_name,
            mechanism,
            target_proteins.join(", ")
        )
    }

    pub fn schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "repurposingCandidates": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "drugName": { "type": "STRING" },
                            "originalIndication": { "type": "STRING" },
                            "mechanismOfAction": { "type": "STRING" },
                            "feasibilityScore": { "type": "NUMBER" },
                            "rationale": { "type": "STRING" },
                            "validationSteps": { "type": "ARRAY", "items": { "type": "STRING" } }
                        },
                        "required": [
                            "drugName",
                            "originalIndication",
                            "mechanismOfAction",
                            "feasibilityScore",
                            "rationale",
                            "validationSteps"
                        ]
                    }
                }
            }
        })
    }

    /// Generate candidates for a finished report. Never fails: any error yields an empty list.
    pub async fn generate(
        &self,
        invoker: &GenerationInvoker,
        disease_name: &str,
        mechanism: &str,
        target_proteins: &[String],
    ) -> Vec<RepurposingCandidate> {
        let context = Self::context(disease_name, mechanism, target_proteins);
        let invocation = AgentInvocation {
            label: Self::LABEL,
            start_logs: &[],
            context: &context,
            query: None,
            instruction: TASK.to_string(),
            schema: Self::schema(),
            thinking_budget: self.thinking_budget,
        };

        // Runs outside any search, so progress and citations have nowhere to go
        let envelope: RepurposingEnvelope = match invoker
            .invoke(&invocation, &LogSink::discard(), &CitationSink::new())
            .await
        {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(disease = %disease_name, error = %e, "Repurposing agent failed");
                return Vec::new();
            }
        };

        let candidates = collect_candidates(envelope.repurposing_candidates);
        info!(disease = %disease_name, count = candidates.len(), "Repurposing candidates generated");
        candidates
    }
}

fn collect_candidates(raw: Vec<Value>) -> Vec<RepurposingCandidate> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<RepurposingCandidate>(value) {
            Ok(candidate) if !candidate.drug_name.trim().is_empty() => Some(candidate.clamp_score()),
            Ok(_) => {
                warn!("Skipping repurposing candidate without a drug name");
                None
            }
            Err(e) => {
                warn!(error = %e, "Skipping malformed repurposing candidate");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedAdapter};
    use std::sync::Arc;
    use std::time::Duration;

    fn setup(reply: Reply) -> (GenerationInvoker, Arc<ScriptedAdapter>) {
        let adapter = Arc::new(ScriptedAdapter::new().with("repurposing", reply));
        let invoker = GenerationInvoker::new(adapter.clone(), "test-model", Duration::from_secs(5), 8192);
        (invoker, adapter)
    }

    #[test]
    fn test_context_lists_targets() {
        let context = RepurposingAgent::context(
            "Fabry disease",
            "Gb3 accumulation",
            &["GLA".to_string(), "LAMP2".to_string()],
        );
        assert_eq!(
            context,
            "CONTEXT:\nDISEASE: Fabry disease\nMECHANISM: Gb3 accumulation\nTARGETS: GLA, LAMP2"
        );
    }

    #[tokio::test]
    async fn test_empty_target_list_still_queries() {
        let (invoker, adapter) = setup(Reply::json(json!({
            "repurposingCandidates": [{
                "drugName": "Migalastat",
                "originalIndication": "Fabry disease (amenable variants)",
                "mechanismOfAction": "Pharmacological chaperone",
                "feasibilityScore": 85,
                "rationale": "Stabilizes misfolded enzyme",
                "validationSteps": ["In vitro amenability assay"]
            }]
        })));

        let candidates = RepurposingAgent::new(4096)
            .generate(&invoker, "Fabry disease", "Gb3 accumulation", &[])
            .await;

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].feasibility_score, 85.0);

        let requests = adapter.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("TARGETS: \n\nINSTRUCTION: TASK: Drug Repurposing Generator"));
        assert_eq!(requests[0].thinking_budget, 4096);
        assert!(requests[0].enable_search);
    }

    #[tokio::test]
    async fn test_failure_yields_empty_list() {
        let (invoker, _) = setup(Reply::Fail("quota exceeded".to_string()));

        let candidates = RepurposingAgent::new(4096)
            .generate(&invoker, "Fabry disease", "Gb3 accumulation", &["GLA".to_string()])
            .await;

        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_candidates_are_skipped_and_scores_clamped() {
        let (invoker, _) = setup(Reply::json(json!({
            "repurposingCandidates": [
                { "drugName": "Ambroxol", "feasibilityScore": 130 },
                { "drugName": "Broken", "feasibilityScore": "very high" },
                { "rationale": "no drug named" },
                { "drugName": "Lucerastat", "feasibilityScore": -10 }
            ]
        })));

        let candidates = RepurposingAgent::new(4096)
            .generate(&invoker, "Fabry disease", "", &[])
            .await;

        let names: Vec<_> = candidates.iter().map(|c| c.drug_name.as_str()).collect();
        assert_eq!(names, vec!["Ambroxol", "Lucerastat"]);
        assert_eq!(candidates[0].feasibility_score, 100.0);
        assert_eq!(candidates[1].feasibility_score, 0.0);
    }

    #[tokio::test]
    async fn test_missing_candidate_list_is_empty() {
        let (invoker, _) = setup(Reply::json(json!({})));

        let candidates = RepurposingAgent::new(4096)
            .generate(&invoker, "Fabry disease", "", &[])
            .await;
        assert!(candidates.is_empty());
    }
}
