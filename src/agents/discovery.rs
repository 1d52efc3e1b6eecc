//! Discovery Agent
//!
//! Clinical pipeline and comparative report: active trials, diseases sharing a mechanism,
//! and a curated bibliography. Drug repurposing is deliberately left to
//! [`RepurposingAgent`](super::RepurposingAgent).

use serde_json::{json, Value};

use super::ResearchAgent;
use crate::models::DiscoveryFragment;

pub struct DiscoveryAgent;

impl ResearchAgent for DiscoveryAgent {
    type Fragment = DiscoveryFragment;

    const LABEL: &'static str = "Discovery Agent";
    const START_LOGS: &'static [&'static str] = &[
        "Scanning ClinicalTrials.gov...",
        "Synthesizing PubMed bibliography...",
        "Running deep web search for comparative models...",
    ];

    fn instruction(&self, query: &str) -> String {
        format!(
            r#"Generate a Clinical Pipeline & Comparative Report for "{query}".

STRATEGY:
1. COMBINE the provided PubMed API context with a fresh 'googleSearch'.
2. SEARCH QUERY 1: "active clinical trials {query} recruitment status". Use this to fill 'clinicalTrials'.
3. SEARCH QUERY 2: "structural homology {query} other diseases" or "shared biological pathway {query} mechanism". Use this for 'crossDiseaseInsights'.

NOTE: Do NOT perform drug repurposing search in this step. That is handled by a separate agent."#,
            query = query
        )
    }

    fn schema(&self) -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "clinicalTrials": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "title": { "type": "STRING" },
                            "phase": { "type": "STRING" },
                            "status": { "type": "STRING" },
                            "intervention": { "type": "STRING" },
                            "identifier": { "type": "STRING" }
                        },
                        "required": ["title", "phase", "status", "intervention"]
                    }
                },
                "clinicalTrialsSummary": { "type": "STRING" },
                "crossDiseaseInsights": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "diseaseName": { "type": "STRING" },
                            "sharedMechanism": { "type": "STRING" },
                            "researchOpportunity": { "type": "STRING" },
                            "sharedGenes": { "type": "ARRAY", "items": { "type": "STRING" } },
                            "pathwayOverlap": {
                                "type": "ARRAY",
                                "items": { "type": "STRING" },
                                "description": "Specific biological pathways shared (Reactome/KEGG)"
                            },
                            "structuralSimilarity": {
                                "type": "STRING",
                                "description": "Brief analysis of protein structural homology"
                            }
                        },
                        "required": ["diseaseName", "sharedMechanism", "researchOpportunity"]
                    }
                },
                "crossDiseaseSummary": { "type": "STRING" },
                "bibliography": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "title": { "type": "STRING" },
                            "authors": { "type": "STRING" },
                            "journal": { "type": "STRING" },
                            "year": { "type": "STRING" },
                            "doi": { "type": "STRING" },
                            "link": { "type": "STRING" }
                        },
                        "required": ["title", "authors", "journal", "year", "link"]
                    }
                },
                "bibliographySummary": { "type": "STRING" },
                "researchSynthesis": { "type": "STRING" }
            },
            "required": [
                "clinicalTrials",
                "crossDiseaseInsights",
                "bibliography",
                "researchSynthesis",
                "bibliographySummary"
            ]
        })
    }
}
