// Orphafold - Multi-agent rare disease research orchestrator grounded in public bio-databases

pub mod config;
pub mod types;
pub mod events;
pub mod citations;
pub mod llm;
pub mod sources;   // Orphanet, NCBI E-utilities and UniProt lookups
pub mod grounding;
pub mod models;
pub mod agents;
pub mod orchestrator;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use config::Config;
pub use events::{LogEvent, LogKind, LogSink};
pub use models::{DiseaseInsight, RepurposingCandidate};
pub use orchestrator::ResearchOrchestrator;
pub use types::{AppError, AppResult};
