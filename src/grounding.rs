//! Grounding Context
//!
//! Serializes everything the enrichment phase found into the text block that prefixes every
//! primary agent prompt, followed by the directive telling the model how to combine that fixed
//! data with live search.

use serde::Serialize;

use crate::sources::{
    ClinVarVariant, GeneRecord, OmimEntry, OrphanetRecord, PubMedArticle, SourceKind, UniProtEntry,
};

/// Always reported as validated: structures come from generative prediction, not a lookup
pub const STRUCTURE_PREDICTION_SOURCE: &str = "AlphaFold DB";

const HYBRID_STRATEGY: &str = "HYBRID STRATEGY INSTRUCTION:
You have access to specific API data ABOVE and general 'googleSearch' tool capability.
YOU MUST COMBINE BOTH.
1. Use the API data for precise IDs, gene names, and validated variants.
2. Use 'googleSearch' to find RECENT updates, clinical trials, and broader biological context that the APIs miss.";

/// Results of one enrichment pass, one slot per registry.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentBundle {
    pub orphanet: Option<OrphanetRecord>,
    pub omim: Option<Vec<OmimEntry>>,
    pub uniprot: Option<Vec<UniProtEntry>>,
    pub gene: Option<GeneRecord>,
    pub clinvar: Option<Vec<ClinVarVariant>>,
    pub pubmed: Option<Vec<PubMedArticle>>,
}

impl EnrichmentBundle {
    pub fn has(&self, source: SourceKind) -> bool {
        match source {
            SourceKind::Orphanet => self.orphanet.is_some(),
            SourceKind::Omim => self.omim.is_some(),
            SourceKind::UniProt => self.uniprot.is_some(),
            SourceKind::NcbiGene => self.gene.is_some(),
            SourceKind::ClinVar => self.clinvar.is_some(),
            SourceKind::PubMed => self.pubmed.is_some(),
        }
    }

    /// Sources that returned data, in lookup order, plus the structure-prediction source
    pub fn validated_sources(&self) -> Vec<String> {
        SourceKind::ALL
            .iter()
            .filter(|source| self.has(**source))
            .map(|source| source.display_name().to_string())
            .chain(std::iter::once(STRUCTURE_PREDICTION_SOURCE.to_string()))
            .collect()
    }
}

/// Prompt prefix shared by the three primary agents of one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingContext(String);

impl GroundingContext {
    pub fn build(bundle: &EnrichmentBundle) -> Self {
        let lines = [
            block(
                "Orphanet",
                &bundle.orphanet,
                "No Orphanet data found, using internal knowledge",
            ),
            block(
                "OMIM",
                &bundle.omim,
                "No OMIM data found, using internal knowledge",
            ),
            block("UniProt", &bundle.uniprot, "No UniProt data found"),
            block("NCBI Gene", &bundle.gene, "No Gene data found"),
            block("ClinVar", &bundle.clinvar, "No ClinVar data found"),
            block("PubMed", &bundle.pubmed, "No recent PubMed papers found"),
        ];

        Self(format!(
            "REAL-TIME API CONTEXT (GROUND TRUTH):\n{}\n\n{}",
            lines.join("\n"),
            HYBRID_STRATEGY
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn block<T: Serialize>(label: &str, data: &Option<T>, missing: &str) -> String {
    // Missing data is rendered as a JSON string, same as the data itself is rendered as JSON
    let rendered = data
        .as_ref()
        .and_then(|d| serde_json::to_string(d).ok())
        .unwrap_or_else(|| serde_json::Value::String(missing.to_string()).to_string());
    format!("- {} Data: {}", label, rendered)
}
