// Report models shared by the agents, the merge step and the presentation layer.
// Every field defaults so a degraded agent still yields a complete record.

use serde::{Deserialize, Serialize};

use crate::types::Citation;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiseaseClassification {
    #[serde(deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub subgroups: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Mutation {
    /// HGVS notation, e.g. `p.Asn215Ser`
    #[serde(deserialize_with = "lenient::string")]
    pub hgvs: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub clinvar_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub significance: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetProtein {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub uniprot_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub function: String,
    #[serde(deserialize_with = "lenient::string")]
    pub molecular_function: String,
    #[serde(deserialize_with = "lenient::string")]
    pub alpha_fold_status: String,
    /// Estimated pLDDT confidence range, e.g. "High > 90"
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub plddt: Option<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub domains: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub pathways: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub tissue_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub druggability: Option<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub interaction_partners: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub sequence: String,
    #[serde(deserialize_with = "lenient::entries")]
    pub mutations: Vec<Mutation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CellularVulnerability {
    #[serde(deserialize_with = "lenient::string_list")]
    pub cell_types_involved: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub key_vulnerability_factors: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub non_cell_autonomous_mechanisms: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub therapeutic_implications: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub evidence_links: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClinicalTrial {
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub phase: String,
    #[serde(deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(deserialize_with = "lenient::string")]
    pub intervention: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrossDiseaseInsight {
    #[serde(deserialize_with = "lenient::string")]
    pub disease_name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub shared_mechanism: String,
    #[serde(deserialize_with = "lenient::string")]
    pub research_opportunity: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub shared_genes: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub pathway_overlap: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub structural_similarity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BibliographyEntry {
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub authors: String,
    #[serde(deserialize_with = "lenient::string")]
    pub journal: String,
    #[serde(deserialize_with = "lenient::string")]
    pub year: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub doi: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepurposingCandidate {
    pub drug_name: String,
    pub original_indication: String,
    pub mechanism_of_action: String,
    /// 0-100
    pub feasibility_score: f64,
    pub rationale: String,
    pub validation_steps: Vec<String>,
}

impl RepurposingCandidate {
    pub fn clamp_score(mut self) -> Self {
        self.feasibility_score = if self.feasibility_score.is_finite() {
            self.feasibility_score.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self
    }
}

/// Clinical agent output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClinicalFragment {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub prevalence: String,
    #[serde(deserialize_with = "lenient::string")]
    pub inheritance: String,
    #[serde(deserialize_with = "lenient::entries")]
    pub classification: Vec<DiseaseClassification>,
    #[serde(deserialize_with = "lenient::string")]
    pub classification_summary: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub orphanet_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub omim_id: Option<String>,
}

/// Bio-mechanism agent output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MechanismFragment {
    #[serde(deserialize_with = "lenient::string")]
    pub molecular_mechanism: String,
    #[serde(deserialize_with = "lenient::entries")]
    pub target_proteins: Vec<TargetProtein>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub cellular_vulnerability: CellularVulnerability,
}

/// Discovery agent output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscoveryFragment {
    #[serde(deserialize_with = "lenient::entries")]
    pub clinical_trials: Vec<ClinicalTrial>,
    #[serde(deserialize_with = "lenient::string")]
    pub clinical_trials_summary: String,
    #[serde(deserialize_with = "lenient::entries")]
    pub cross_disease_insights: Vec<CrossDiseaseInsight>,
    #[serde(deserialize_with = "lenient::string")]
    pub cross_disease_summary: String,
    #[serde(deserialize_with = "lenient::entries")]
    pub bibliography: Vec<BibliographyEntry>,
    #[serde(deserialize_with = "lenient::string")]
    pub bibliography_summary: String,
    #[serde(deserialize_with = "lenient::string")]
    pub research_synthesis: String,
}

/// The merged, caller-facing report of one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiseaseInsight {
    pub name: String,
    pub prevalence: String,
    pub inheritance: String,
    pub classification: Vec<DiseaseClassification>,
    pub classification_summary: String,
    pub molecular_mechanism: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omim_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orphanet_id: Option<String>,
    pub target_proteins: Vec<TargetProtein>,
    pub therapeutic_approaches: Vec<String>,
    pub clinical_trials: Vec<ClinicalTrial>,
    pub clinical_trials_summary: String,
    pub cross_disease_insights: Vec<CrossDiseaseInsight>,
    pub cross_disease_summary: String,
    pub repurposing_candidates: Vec<RepurposingCandidate>,
    pub cellular_vulnerability: CellularVulnerability,
    pub research_synthesis: String,
    pub bibliography: Vec<BibliographyEntry>,
    pub bibliography_summary: String,
    pub grounding_sources: Vec<Citation>,
    pub data_sources_validated: Vec<String>,
    pub quality_warnings: Vec<String>,
}

/// Orchestrator-side inputs to the merge
#[derive(Debug, Clone, Default)]
pub struct MergeProvenance {
    pub data_sources_validated: Vec<String>,
    pub grounding_sources: Vec<Citation>,
    pub quality_warnings: Vec<String>,
}

impl DiseaseInsight {
    /// Combine the three primary fragments into one report.
    ///
    /// Repurposing candidates always start empty; they are filled in later on demand.
    pub fn merge(
        clinical: ClinicalFragment,
        mechanism: MechanismFragment,
        discovery: DiscoveryFragment,
        provenance: MergeProvenance,
    ) -> Self {
        let therapeutic_approaches = mechanism.cellular_vulnerability.therapeutic_implications.clone();

        Self {
            name: clinical.name,
            prevalence: clinical.prevalence,
            inheritance: clinical.inheritance,
            classification: clinical.classification,
            classification_summary: clinical.classification_summary,
            omim_id: clinical.omim_id,
            orphanet_id: clinical.orphanet_id,
            molecular_mechanism: mechanism.molecular_mechanism,
            target_proteins: mechanism.target_proteins,
            cellular_vulnerability: mechanism.cellular_vulnerability,
            therapeutic_approaches,
            clinical_trials: discovery.clinical_trials,
            clinical_trials_summary: discovery.clinical_trials_summary,
            cross_disease_insights: discovery.cross_disease_insights,
            cross_disease_summary: discovery.cross_disease_summary,
            bibliography: discovery.bibliography,
            bibliography_summary: discovery.bibliography_summary,
            research_synthesis: discovery.research_synthesis,
            repurposing_candidates: Vec::new(),
            grounding_sources: provenance.grounding_sources,
            data_sources_validated: provenance.data_sources_validated,
            quality_warnings: provenance.quality_warnings,
        }
    }

    pub fn target_protein_names(&self) -> Vec<String> {
        self.target_proteins
            .iter()
            .map(|p| p.name.clone())
            .filter(|n| !n.trim().is_empty())
            .collect()
    }

    /// The one place a finished report is mutated: splice in on-demand repurposing results
    pub fn apply_repurposing(&mut self, candidates: Vec<RepurposingCandidate>) {
        self.repurposing_candidates = candidates;
    }
}

/// Remove `null` members recursively so that defaults apply instead of type errors
pub fn strip_nulls(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        serde_json::Value::Array(items) => {
            items.retain(|v| !v.is_null());
            items.iter_mut().for_each(strip_nulls);
        }
        _ => {}
    }
}

/// Field-level deserializers for model output.
///
/// A stray type in one member (a number where a string was asked for, a bare string in an
/// object list) loses that member or entry only, never the whole fragment.
mod lenient {
    use serde::de::{DeserializeOwned, Deserializer};
    use serde::Deserialize;
    use serde_json::Value;
    use tracing::warn;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(scalar_text(Value::deserialize(deserializer)?).filter(|s| !s.is_empty()))
    }

    /// A single scalar is accepted as a one-element list
    pub fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
            other => scalar_text(other).into_iter().collect(),
        })
    }

    pub fn entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let items = match Value::deserialize(deserializer)? {
            Value::Array(items) => items,
            single @ Value::Object(_) => vec![single],
            other => {
                warn!(found = %other, "Expected a list of objects, ignoring");
                Vec::new()
            }
        };

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Dropping malformed entry");
                    None
                }
            })
            .collect())
    }

    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(serde_json::from_value(value).unwrap_or_else(|e| {
            warn!(error = %e, "Malformed object, using defaults");
            T::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn required_fields() -> [&'static str; 20] {
        [
            "name",
            "prevalence",
            "inheritance",
            "classification",
            "classificationSummary",
            "molecularMechanism",
            "targetProteins",
            "therapeuticApproaches",
            "clinicalTrials",
            "clinicalTrialsSummary",
            "crossDiseaseInsights",
            "crossDiseaseSummary",
            "repurposingCandidates",
            "cellularVulnerability",
            "researchSynthesis",
            "bibliography",
            "bibliographySummary",
            "groundingSources",
            "dataSourcesValidated",
            "qualityWarnings",
        ]
    }

    #[test]
    fn test_empty_fragments_merge_to_complete_record() {
        for mask in 0..8u8 {
            let clinical: ClinicalFragment = if mask & 1 == 0 {
                serde_json::from_value(json!({})).unwrap()
            } else {
                serde_json::from_value(json!({ "name": "Fabry disease" })).unwrap()
            };
            let mechanism: MechanismFragment = if mask & 2 == 0 {
                serde_json::from_value(json!({})).unwrap()
            } else {
                serde_json::from_value(json!({ "molecularMechanism": "Gb3 accumulation" })).unwrap()
            };
            let discovery: DiscoveryFragment = if mask & 4 == 0 {
                serde_json::from_value(json!({})).unwrap()
            } else {
                serde_json::from_value(json!({ "researchSynthesis": "ERT and chaperones" })).unwrap()
            };

            let insight = DiseaseInsight::merge(clinical, mechanism, discovery, MergeProvenance::default());
            let value = serde_json::to_value(&insight).unwrap();

            for field in required_fields() {
                let present = &value[field];
                assert!(
                    present.is_string() || present.is_array() || present.is_object(),
                    "field {field} missing or null for mask {mask}"
                );
            }
            assert_eq!(value["repurposingCandidates"], json!([]));
            assert!(value["cellularVulnerability"]["therapeuticImplications"].is_array());
        }
    }

    #[test]
    fn test_empty_mutations_preserved() {
        let mechanism: MechanismFragment = serde_json::from_value(json!({
            "molecularMechanism": "Lysosomal storage",
            "targetProteins": [{ "name": "GLA", "uniprotId": "P06280", "mutations": [] }]
        }))
        .unwrap();

        let insight = DiseaseInsight::merge(
            ClinicalFragment::default(),
            mechanism,
            DiscoveryFragment::default(),
            MergeProvenance::default(),
        );
        let value = serde_json::to_value(&insight).unwrap();
        assert_eq!(value["targetProteins"][0]["mutations"], json!([]));
    }

    #[test]
    fn test_therapeutic_approaches_promoted() {
        let mechanism = MechanismFragment {
            cellular_vulnerability: CellularVulnerability {
                therapeutic_implications: vec!["Enzyme replacement".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let insight = DiseaseInsight::merge(
            ClinicalFragment::default(),
            mechanism,
            DiscoveryFragment::default(),
            MergeProvenance::default(),
        );
        assert_eq!(insight.therapeutic_approaches, vec!["Enzyme replacement"]);
    }

    #[test]
    fn test_strip_nulls_lets_defaults_apply() {
        let mut raw = json!({
            "name": null,
            "classification": null,
            "targetProteins": [null, { "name": "GLA", "domains": null, "mutations": [null] }]
        });
        strip_nulls(&mut raw);

        let clinical: ClinicalFragment = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(clinical.name, "");
        assert!(clinical.classification.is_empty());

        let mechanism: MechanismFragment = serde_json::from_value(raw).unwrap();
        assert_eq!(mechanism.target_proteins.len(), 1);
        assert!(mechanism.target_proteins[0].domains.is_empty());
        assert!(mechanism.target_proteins[0].mutations.is_empty());
    }

    #[test]
    fn test_apply_repurposing_and_protein_names() {
        let mut insight = DiseaseInsight {
            target_proteins: vec![
                TargetProtein { name: "GLA".to_string(), ..Default::default() },
                TargetProtein { name: " ".to_string(), ..Default::default() },
            ],
            ..Default::default()
        };
        assert_eq!(insight.target_protein_names(), vec!["GLA"]);

        insight.apply_repurposing(vec![RepurposingCandidate {
            drug_name: "Migalastat".to_string(),
            feasibility_score: 90.0,
            ..Default::default()
        }]);
        assert_eq!(insight.repurposing_candidates.len(), 1);
    }

    #[test]
    fn test_clamp_score() {
        let high = RepurposingCandidate { feasibility_score: 140.0, ..Default::default() }.clamp_score();
        assert_eq!(high.feasibility_score, 100.0);
        let low = RepurposingCandidate { feasibility_score: -3.0, ..Default::default() }.clamp_score();
        assert_eq!(low.feasibility_score, 0.0);
        let nan = RepurposingCandidate { feasibility_score: f64::NAN, ..Default::default() }.clamp_score();
        assert_eq!(nan.feasibility_score, 0.0);
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let value: Value = serde_json::to_value(TargetProtein::default()).unwrap();
        assert!(value.get("uniprotId").is_some());
        assert!(value.get("alphaFoldStatus").is_some());
        assert!(value.get("interactionPartners").is_some());
    }

    #[test]
    fn test_stray_member_types_keep_the_rest_of_the_fragment() {
        let mechanism: MechanismFragment = serde_json::from_value(json!({
            "molecularMechanism": "Gb3 accumulation",
            "targetProteins": [
                { "name": "GLA", "plddt": "High > 90", "domains": ["Glyco_hydro_27"] },
                { "name": "LAMP2", "plddt": 92, "domains": "Lamp", "mutations": ["p.Asn215Ser"] },
                "HEXA"
            ],
            "cellularVulnerability": { "cellTypesInvolved": 3 }
        }))
        .unwrap();

        assert_eq!(mechanism.molecular_mechanism, "Gb3 accumulation");
        let names: Vec<_> = mechanism.target_proteins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["GLA", "LAMP2"]);
        assert_eq!(mechanism.target_proteins[1].plddt.as_deref(), Some("92"));
        assert_eq!(mechanism.target_proteins[1].domains, vec!["Lamp"]);
        assert!(mechanism.target_proteins[1].mutations.is_empty());
        assert_eq!(mechanism.cellular_vulnerability.cell_types_involved, vec!["3"]);

        let clinical: ClinicalFragment = serde_json::from_value(json!({
            "name": "Fabry disease",
            "orphanetId": 324,
            "classification": { "category": "Lysosomal", "subgroups": [] }
        }))
        .unwrap();
        assert_eq!(clinical.orphanet_id.as_deref(), Some("324"));
        assert_eq!(clinical.classification.len(), 1);
    }
}
