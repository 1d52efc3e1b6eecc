//! Source Enrichment Clients
//!
//! Lookups against public bio-data registries, run before any generation call so the agents
//! can be grounded in registry identifiers:
//! - Orphanet (rare disease nomenclature, Orphadata XML product)
//! - OMIM, NCBI Gene, ClinVar and PubMed (NCBI E-utilities)
//! - UniProt (protein knowledgebase REST API)
//!
//! Every lookup returns `None` when the source is unreachable, answers with something
//! unexpected, or simply has nothing for the query. Nothing here ever fails a search.

pub mod ncbi;
pub mod orphanet;
pub mod uniprot;

pub use ncbi::{ClinVarVariant, GeneRecord, OmimEntry, PubMedArticle};
pub use orphanet::OrphanetRecord;
pub use uniprot::UniProtEntry;

use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use thiserror::Error;
use tracing::warn;

use crate::config::EnrichmentConfig;
use crate::types::AppResult;

/// Errors raised inside a client before they are collapsed to "not found"
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// The registries consulted during enrichment, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Orphanet,
    Omim,
    UniProt,
    NcbiGene,
    ClinVar,
    PubMed,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Orphanet,
        SourceKind::Omim,
        SourceKind::UniProt,
        SourceKind::NcbiGene,
        SourceKind::ClinVar,
        SourceKind::PubMed,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::Orphanet => "Orphanet",
            SourceKind::Omim => "OMIM",
            SourceKind::UniProt => "UniProt",
            SourceKind::NcbiGene => "NCBI Gene",
            SourceKind::ClinVar => "ClinVar",
            SourceKind::PubMed => "PubMed",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One lookup per registry. Implementations must swallow their own failures.
#[async_trait]
pub trait EnrichmentSources: Send + Sync {
    async fn orphanet(&self, query: &str) -> Option<OrphanetRecord>;
    async fn omim(&self, query: &str) -> Option<Vec<OmimEntry>>;
    async fn uniprot(&self, query: &str) -> Option<Vec<UniProtEntry>>;
    async fn gene(&self, query: &str) -> Option<GeneRecord>;
    async fn clinvar(&self, query: &str) -> Option<Vec<ClinVarVariant>>;
    async fn pubmed(&self, query: &str) -> Option<Vec<PubMedArticle>>;
}

/// HTTP client for all registries
pub struct BioDataClient {
    client: Client,
    config: EnrichmentConfig,
}

impl BioDataClient {
    pub fn new(config: EnrichmentConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("orphafold/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    pub(crate) fn config(&self) -> &EnrichmentConfig {
        &self.config
    }
}

/// Collapse a client result to "not found", keeping the reason in the diagnostics
fn settle<T>(source: SourceKind, result: Result<Option<T>, SourceError>) -> Option<T> {
    match result {
        Ok(found) => found,
        Err(e) => {
            warn!(source = %source, error = %e, "Source unavailable, continuing without it");
            None
        }
    }
}

/// An empty record list carries no grounding, so it counts as absent
pub(crate) fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

#[async_trait]
impl EnrichmentSources for BioDataClient {
    async fn orphanet(&self, query: &str) -> Option<OrphanetRecord> {
        settle(SourceKind::Orphanet, self.fetch_orphanet(query).await)
    }

    async fn omim(&self, query: &str) -> Option<Vec<OmimEntry>> {
        settle(SourceKind::Omim, self.fetch_omim(query).await)
    }

    async fn uniprot(&self, query: &str) -> Option<Vec<UniProtEntry>> {
        settle(SourceKind::UniProt, self.fetch_uniprot(query).await)
    }

    async fn gene(&self, query: &str) -> Option<GeneRecord> {
        settle(SourceKind::NcbiGene, self.fetch_gene(query).await)
    }

    async fn clinvar(&self, query: &str) -> Option<Vec<ClinVarVariant>> {
        settle(SourceKind::ClinVar, self.fetch_clinvar(query).await)
    }

    async fn pubmed(&self, query: &str) -> Option<Vec<PubMedArticle>> {
        settle(SourceKind::PubMed, self.fetch_pubmed(query).await)
    }
}
