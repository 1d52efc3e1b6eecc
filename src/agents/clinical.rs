//! Clinical Agent
//!
//! Epidemiology and nosology: prevalence, inheritance pattern and the disease's place in the
//! Orphanet classification hierarchy.

use serde_json::{json, Value};

use super::ResearchAgent;
use crate::models::ClinicalFragment;

pub struct ClinicalAgent;

impl ResearchAgent for ClinicalAgent {
    type Fragment = ClinicalFragment;

    const LABEL: &'static str = "Clinical Agent";
    const START_LOGS: &'static [&'static str] = &[
        "Querying Orphanet Registry...",
        "Cross-referencing inheritance patterns...",
    ];

    fn instruction(&self, query: &str) -> String {
        format!(
            r#"Extract clinical statistics for "{query}".

STRATEGY:
- Use the Orphanet/OMIM data from the API context and your internal knowledge.
- AND ACTIVELY SEARCH GOOGLE for "latest prevalence {query}" or "updated clinical classification {query}".
- Combine sources to ensure the prevalence data is up-to-date."#,
            query = query
        )
    }

    fn schema(&self) -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "prevalence": { "type": "STRING" },
                "inheritance": { "type": "STRING" },
                "classification": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "category": { "type": "STRING" },
                            "subgroups": { "type": "ARRAY", "items": { "type": "STRING" } }
                        }
                    }
                },
                "classificationSummary": { "type": "STRING" },
                "orphanetId": { "type": "STRING" },
                "omimId": { "type": "STRING" }
            },
            "required": ["name", "prevalence", "inheritance", "classification"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::invoker::into_fragment;

    #[test]
    fn test_fragment_from_minimal_answer() {
        let fragment: ClinicalFragment = into_fragment(
            ClinicalAgent::LABEL,
            json!({
                "name": "Fabry disease",
                "prevalence": "1 in 40,000",
                "inheritance": "X-linked",
                "classification": []
            }),
        )
        .unwrap();

        assert_eq!(fragment.name, "Fabry disease");
        assert_eq!(fragment.inheritance, "X-linked");
        assert!(fragment.classification.is_empty());
        assert_eq!(fragment.classification_summary, "");
        assert_eq!(fragment.orphanet_id, None);
    }

    #[test]
    fn test_fragment_with_hierarchy() {
        let fragment: ClinicalFragment = into_fragment(
            ClinicalAgent::LABEL,
            json!({
                "classification": [
                    { "category": "Rare inborn errors of metabolism", "subgroups": ["Sphingolipidosis"] },
                    { "category": "Rare renal disease" }
                ],
                "orphanetId": "ORPHA:324"
            }),
        )
        .unwrap();

        assert_eq!(fragment.classification.len(), 2);
        assert_eq!(fragment.classification[0].subgroups, vec!["Sphingolipidosis"]);
        assert!(fragment.classification[1].subgroups.is_empty());
        assert_eq!(fragment.orphanet_id.as_deref(), Some("ORPHA:324"));
    }
}
