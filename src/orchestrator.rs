//! Research Orchestrator
//!
//! Drives one deep search end to end:
//!
//! ```text
//! Idle ──► Enriching ──► Grounding ──► AgentsRunning ──► Merged
//!          (sequential)               (join barrier over 3 agents)
//! ```
//!
//! Nothing after query validation can fail the search. Unreachable registries are left out of
//! the grounding context and failed agents contribute empty defaults.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::agents::{
    AgentError, ClinicalAgent, DiscoveryAgent, GenerationInvoker, MechanismAgent, RepurposingAgent,
    ResearchAgent,
};
use crate::citations::CitationSink;
use crate::config::Config;
use crate::events::LogSink;
use crate::grounding::{EnrichmentBundle, GroundingContext};
use crate::llm::{create_adapter, LLMProviderConfig};
use crate::models::{DiseaseInsight, MergeProvenance, RepurposingCandidate};
use crate::sources::{
    BioDataClient, ClinVarVariant, EnrichmentSources, GeneRecord, OmimEntry, OrphanetRecord,
    PubMedArticle, SourceKind, UniProtEntry,
};
use crate::types::{AppError, AppResult};

pub const COMPILATION_COMPLETE: &str = "Compilation complete. Finalizing structural report...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Enriching,
    Grounding,
    AgentsRunning,
    Merged,
}

fn enter(phase: SearchPhase) {
    info!(phase = ?phase, "Search phase");
}

fn querying_message(source: SourceKind) -> &'static str {
    match source {
        SourceKind::Orphanet => "📡 Querying Orphanet API for disease classification...",
        SourceKind::Omim => "📡 Querying OMIM database for phenotype-genotype data...",
        SourceKind::UniProt => "📡 Hitting UniProt API for primary protein targets...",
        SourceKind::NcbiGene => "📡 Querying NCBI Gene for genomic coordinates...",
        SourceKind::ClinVar => "📡 Scanning ClinVar for pathogenic genomic variations...",
        SourceKind::PubMed => "📡 Querying PubMed (NCBI) for latest research papers...",
    }
}

pub struct ResearchOrchestrator {
    sources: Arc<dyn EnrichmentSources>,
    invoker: GenerationInvoker,
    repurposing: RepurposingAgent,
    pacing: Duration,
}

impl ResearchOrchestrator {
    pub fn new(
        sources: Arc<dyn EnrichmentSources>,
        invoker: GenerationInvoker,
        repurposing_thinking_budget: u32,
        pacing: Duration,
    ) -> Self {
        Self {
            sources,
            invoker,
            repurposing: RepurposingAgent::new(repurposing_thinking_budget),
            pacing,
        }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let adapter = create_adapter(LLMProviderConfig::from_config(&config.llm))?;
        let sources = Arc::new(BioDataClient::new(config.enrichment.clone())?);

        info!(
            provider = %config.llm.provider,
            model = %config.llm.model,
            "Research orchestrator initialized"
        );

        Ok(Self::new(
            sources,
            GenerationInvoker::from_config(adapter, &config.llm),
            config.llm.repurposing_thinking_budget,
            config.enrichment.pacing(),
        ))
    }

    /// Run one full search and return the merged report.
    ///
    /// Fails only for an empty query; every later failure degrades into defaults and a
    /// quality warning.
    pub async fn perform_deep_search(&self, query: &str, log: &LogSink) -> AppResult<DiseaseInsight> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidRequest("Search query must not be empty".to_string()));
        }

        let span = info_span!("deep_search", search_id = %Uuid::new_v4(), query = %query);
        self.run_search(query, log).instrument(span).await
    }

    async fn run_search(&self, query: &str, log: &LogSink) -> AppResult<DiseaseInsight> {
        enter(SearchPhase::Idle);

        enter(SearchPhase::Enriching);
        let bundle = self.enrich(query, log).await;

        enter(SearchPhase::Grounding);
        let context = GroundingContext::build(&bundle);
        debug!(context_len = context.as_str().len(), "Grounding context built");

        enter(SearchPhase::AgentsRunning);
        let citations = CitationSink::new();
        let invoker = &self.invoker;
        let (clinical, mechanism, discovery) = tokio::join!(
            invoker.run_agent(&ClinicalAgent, query, &context, log, &citations),
            invoker.run_agent(&MechanismAgent, query, &context, log, &citations),
            invoker.run_agent(&DiscoveryAgent, query, &context, log, &citations),
        );

        let mut quality_warnings = Vec::new();
        let clinical = degrade::<ClinicalAgent>(clinical, &mut quality_warnings);
        let mechanism = degrade::<MechanismAgent>(mechanism, &mut quality_warnings);
        let discovery = degrade::<DiscoveryAgent>(discovery, &mut quality_warnings);

        log.progress(COMPILATION_COMPLETE);

        let insight = DiseaseInsight::merge(
            clinical,
            mechanism,
            discovery,
            MergeProvenance {
                data_sources_validated: bundle.validated_sources(),
                grounding_sources: citations.snapshot().await,
                quality_warnings,
            },
        );

        enter(SearchPhase::Merged);
        info!(
            sources = ?insight.data_sources_validated,
            citations = insight.grounding_sources.len(),
            degraded_agents = insight.quality_warnings.len(),
            "Deep search completed"
        );

        Ok(insight)
    }

    /// Consult every registry in order. Each result is awaited before the next lookup starts.
    async fn enrich(&self, query: &str, log: &LogSink) -> EnrichmentBundle {
        let sources = &self.sources;

        let orphanet = self
            .lookup(SourceKind::Orphanet, log, sources.orphanet(query), |record: &OrphanetRecord| {
                format!(
                    "✅ Found disease in Orphanet: {} (ORPHA:{})",
                    record.name, record.orpha_code
                )
            })
            .await;
        let omim = self
            .lookup(SourceKind::Omim, log, sources.omim(query), |entries: &Vec<OmimEntry>| {
                format!("✅ Retrieved {} OMIM entries.", entries.len())
            })
            .await;
        let uniprot = self
            .lookup(SourceKind::UniProt, log, sources.uniprot(query), |entries: &Vec<UniProtEntry>| {
                format!("✅ Found {} target candidates in UniProt.", entries.len())
            })
            .await;
        let gene = self
            .lookup(SourceKind::NcbiGene, log, sources.gene(query), |gene: &GeneRecord| {
                format!(
                    "✅ Identified gene: {} at {}.",
                    gene.symbol,
                    gene.location.as_deref().unwrap_or("unknown location")
                )
            })
            .await;
        let clinvar = self
            .lookup(SourceKind::ClinVar, log, sources.clinvar(query), |variants: &Vec<ClinVarVariant>| {
                format!("✅ Retrieved {} validated variants from ClinVar.", variants.len())
            })
            .await;
        let pubmed = self
            .lookup(SourceKind::PubMed, log, sources.pubmed(query), |papers: &Vec<PubMedArticle>| {
                format!("✅ Retrieved {} clinical papers from PubMed.", papers.len())
            })
            .await;

        EnrichmentBundle {
            orphanet,
            omim,
            uniprot,
            gene,
            clinvar,
            pubmed,
        }
    }

    async fn lookup<T, F>(
        &self,
        source: SourceKind,
        log: &LogSink,
        fetch: F,
        found: impl FnOnce(&T) -> String,
    ) -> Option<T>
    where
        F: Future<Output = Option<T>>,
    {
        log.progress(querying_message(source));
        let result = fetch.await;

        match &result {
            Some(data) => log.progress(found(data)),
            None => debug!(source = %source, "No data from source"),
        }

        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
        result
    }

    /// On-demand repurposing for a finished report; splice the result in with
    /// [`DiseaseInsight::apply_repurposing`].
    pub async fn generate_repurposing_candidates(
        &self,
        disease_name: &str,
        mechanism: &str,
        target_proteins: &[String],
    ) -> Vec<RepurposingCandidate> {
        self.repurposing
            .generate(&self.invoker, disease_name, mechanism, target_proteins)
            .await
    }
}

fn degrade<A: ResearchAgent>(
    result: Result<A::Fragment, AgentError>,
    warnings: &mut Vec<String>,
) -> A::Fragment {
    match result {
        Ok(fragment) => fragment,
        Err(e) => {
            warn!(agent = A::LABEL, error = %e, "Merging defaults for failed agent");
            warnings.push(format!("{} unavailable: {}", A::LABEL, e));
            A::Fragment::default()
        }
    }
}
