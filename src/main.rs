use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use orphafold::{Config, LogSink, ResearchOrchestrator};

#[derive(Parser)]
#[command(name = "orphafold")]
#[command(version, about = "Multi-agent rare disease research report generator")]
struct Cli {
    /// Disease name or free-text query
    query: String,

    #[arg(long, help = "Also generate drug repurposing candidates for the finished report")]
    repurpose: bool,

    #[arg(long, help = "Print compact JSON instead of pretty-printed")]
    compact: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orphafold=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "Configuration loaded");

    let orchestrator = ResearchOrchestrator::from_config(&config)?;

    // Stream progress to the terminal while the search runs
    let (log, mut events) = LogSink::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            eprintln!("{}", event);
        }
    });

    let result = orchestrator.perform_deep_search(&cli.query, &log).await;
    drop(log);
    printer
        .await
        .map_err(|e| anyhow::anyhow!("Progress printer failed: {}", e))?;

    let mut insight = result?;

    if cli.repurpose {
        info!("Generating repurposing candidates...");
        let disease_name = if insight.name.trim().is_empty() {
            cli.query.trim().to_string()
        } else {
            insight.name.clone()
        };
        let candidates = orchestrator
            .generate_repurposing_candidates(
                &disease_name,
                &insight.molecular_mechanism,
                &insight.target_protein_names(),
            )
            .await;
        insight.apply_repurposing(candidates);
    }

    let output = if cli.compact {
        serde_json::to_string(&insight)?
    } else {
        serde_json::to_string_pretty(&insight)?
    };
    println!("{}", output);

    Ok(())
}
