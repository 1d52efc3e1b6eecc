use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub llm: LLMConfig,
    pub enrichment: EnrichmentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: String,
    pub google_api_key: String,
    pub model: String,
    pub api_base: String,
    /// Reasoning budget for the three primary agents
    pub thinking_budget: u32,
    /// Reasoning budget for the on-demand repurposing agent
    pub repurposing_thinking_budget: u32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    pub eutils_base: String,
    pub uniprot_base: String,
    pub orphanet_url: String,
    pub request_timeout_secs: u64,
    /// Delay after each source lookup so progress events stream at a readable pace
    pub pacing_ms: u64,
    pub pubmed_max_results: u32,
    pub clinvar_max_results: u32,
    pub omim_max_results: u32,
    pub uniprot_max_results: u32,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            google_api_key: String::new(),
            model: "gemini-3-pro-preview".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            thinking_budget: 8192,
            repurposing_thinking_budget: 4096,
            request_timeout_secs: 120,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            eutils_base: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            uniprot_base: "https://rest.uniprot.org".to_string(),
            orphanet_url: "https://api.orphadata.com/EN_Product1.xml".to_string(),
            request_timeout_secs: 20,
            pacing_ms: 0,
            pubmed_max_results: 10,
            clinvar_max_results: 5,
            omim_max_results: 3,
            uniprot_max_results: 10,
        }
    }
}

impl LLMConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl EnrichmentConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let llm_defaults = LLMConfig::default();
        let enrichment_defaults = EnrichmentConfig::default();

        Ok(Self {
            llm: LLMConfig {
                provider: env::var("LLM_PROVIDER").unwrap_or(llm_defaults.provider),
                google_api_key: env::var("GEMINI_API_KEY")
                    .or_else(|_| env::var("GOOGLE_API_KEY"))
                    .unwrap_or_default(),
                model: env::var("LLM_MODEL").unwrap_or(llm_defaults.model),
                api_base: env::var("GEMINI_API_BASE").unwrap_or(llm_defaults.api_base),
                thinking_budget: env_or("LLM_THINKING_BUDGET", llm_defaults.thinking_budget)?,
                repurposing_thinking_budget: env_or(
                    "REPURPOSING_THINKING_BUDGET",
                    llm_defaults.repurposing_thinking_budget,
                )?,
                request_timeout_secs: env_or(
                    "LLM_REQUEST_TIMEOUT_SECS",
                    llm_defaults.request_timeout_secs,
                )?,
            },
            enrichment: EnrichmentConfig {
                eutils_base: env::var("NCBI_EUTILS_BASE").unwrap_or(enrichment_defaults.eutils_base),
                uniprot_base: env::var("UNIPROT_API_BASE").unwrap_or(enrichment_defaults.uniprot_base),
                orphanet_url: env::var("ORPHANET_PRODUCT_URL")
                    .unwrap_or(enrichment_defaults.orphanet_url),
                request_timeout_secs: env_or(
                    "ENRICHMENT_TIMEOUT_SECS",
                    enrichment_defaults.request_timeout_secs,
                )?,
                pacing_ms: env_or("ENRICHMENT_PACING_MS", enrichment_defaults.pacing_ms)?,
                pubmed_max_results: env_or(
                    "PUBMED_MAX_RESULTS",
                    enrichment_defaults.pubmed_max_results,
                )?,
                clinvar_max_results: env_or(
                    "CLINVAR_MAX_RESULTS",
                    enrichment_defaults.clinvar_max_results,
                )?,
                omim_max_results: env_or("OMIM_MAX_RESULTS", enrichment_defaults.omim_max_results)?,
                uniprot_max_results: env_or(
                    "UNIPROT_MAX_RESULTS",
                    enrichment_defaults.uniprot_max_results,
                )?,
            },
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
