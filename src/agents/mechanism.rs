//! Bio-Mechanism Agent
//!
//! Molecular pathophysiology: the mechanism narrative, a panel of target proteins with
//! structural annotations, and the cellular vulnerability profile.

use serde_json::{json, Value};

use super::ResearchAgent;
use crate::models::MechanismFragment;

pub struct MechanismAgent;

impl ResearchAgent for MechanismAgent {
    type Fragment = MechanismFragment;

    const LABEL: &'static str = "Bio-Mechanism Agent";
    const START_LOGS: &'static [&'static str] = &[
        "Retrieving proteomics context...",
        "Analyzing AlphaFold structural confidence...",
        "Mapping functional domains & druggability...",
    ];

    fn instruction(&self, query: &str) -> String {
        format!(
            r#"Analyze molecular pathophysiology for "{query}".

STRATEGY:
1. START with the UniProt IDs provided in the API Context.
2. USE 'googleSearch' to EXPAND this list. Search for "protein interaction network {query}" or "downstream signaling effectors {query}".
3. Build a rich structural proteomics panel. Aim for 5-8 distinct proteins (e.g. including chaperones, receptors).
4. For each protein, use the API data for the ID, but use Google Search/Internal knowledge to fill in 'domains', 'pLDDT', and 'druggability' if not obvious.
5. Attach ClinVar variants from the API context to the matching protein's 'mutations' where they apply."#,
            query = query
        )
    }

    fn schema(&self) -> Value {
        let string_list = json!({ "type": "ARRAY", "items": { "type": "STRING" } });

        json!({
            "type": "OBJECT",
            "properties": {
                "molecularMechanism": { "type": "STRING" },
                "targetProteins": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING" },
                            "uniprotId": { "type": "STRING" },
                            "function": { "type": "STRING" },
                            "molecularFunction": {
                                "type": "STRING",
                                "description": "Detailed molecular function description"
                            },
                            "alphaFoldStatus": { "type": "STRING" },
                            "plddt": {
                                "type": "STRING",
                                "description": "Estimated pLDDT confidence score range (e.g. 'High > 90')"
                            },
                            "domains": {
                                "type": "ARRAY",
                                "items": { "type": "STRING" },
                                "description": "Functional domains (Pfam/InterPro)"
                            },
                            "pathways": {
                                "type": "ARRAY",
                                "items": { "type": "STRING" },
                                "description": "Signaling pathways involved"
                            },
                            "tissueExpression": {
                                "type": "STRING",
                                "description": "Primary tissue expression"
                            },
                            "druggability": {
                                "type": "STRING",
                                "description": "Assessment of druggability (e.g. 'Small Molecule', 'Biologic')"
                            },
                            "interactionPartners": {
                                "type": "ARRAY",
                                "items": { "type": "STRING" },
                                "description": "Key protein-protein interaction partners"
                            },
                            "sequence": { "type": "STRING" },
                            "mutations": {
                                "type": "ARRAY",
                                "items": {
                                    "type": "OBJECT",
                                    "properties": {
                                        "hgvs": { "type": "STRING" },
                                        "clinvarId": { "type": "STRING" },
                                        "significance": { "type": "STRING" }
                                    },
                                    "required": ["hgvs"]
                                }
                            }
                        },
                        "required": ["name", "uniprotId", "mutations", "molecularFunction", "domains"]
                    }
                },
                "cellularVulnerability": {
                    "type": "OBJECT",
                    "properties": {
                        "cellTypesInvolved": string_list,
                        "keyVulnerabilityFactors": string_list,
                        "nonCellAutonomousMechanisms": string_list,
                        "therapeuticImplications": string_list,
                        "evidenceLinks": string_list
                    },
                    "required": ["cellTypesInvolved", "keyVulnerabilityFactors"]
                }
            },
            "required": ["molecularMechanism", "targetProteins", "cellularVulnerability"]
        })
    }
}
