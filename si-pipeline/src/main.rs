//! insights - transcript insight extraction CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use si_common::{PipelineConfig, TomlConfig};
use si_pipeline::pipeline::{self, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "insights")]
#[command(about = "Extract structured sales insights from call transcripts")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the extraction pipeline
    Run {
        /// Process only the N most recent transcripts via the direct API
        #[arg(long)]
        sample: Option<u32>,

        /// Model override
        #[arg(long)]
        model: Option<String>,

        /// Write the batch input files without submitting
        #[arg(long)]
        dry_run: bool,

        /// Resume a previously submitted batch
        #[arg(long)]
        resume: bool,

        /// Reprocess transcripts that already have insights
        #[arg(long)]
        force: bool,
    },
    /// Show the status of the pending batch, if any
    Status,
    /// Create the database schema and seed the taxonomy
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "si_pipeline=info,si_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_sources(&TomlConfig::load_from(path)?),
        None => PipelineConfig::resolve()?,
    };

    match cli.command {
        Command::Run {
            sample,
            model,
            dry_run,
            resume,
            force,
        } => {
            let summary = pipeline::run(
                &config,
                RunOptions {
                    sample,
                    model,
                    dry_run,
                    resume,
                    force,
                },
            )
            .await?;
            println!("Transcripts: {}", summary.transcripts);
            println!("Chunks:      {}", summary.chunks);
            println!("Parsed:      {}", summary.insights_parsed);
            println!("Inserted:    {}", summary.insights_inserted);
            if summary.errors > 0 {
                println!("Errors:      {}", summary.errors);
            }
            if !summary.new_features.is_empty() {
                println!("New features: {}", summary.new_features.join(", "));
            }
        }
        Command::Status => {
            match pipeline::batch_status(&config).await? {
                Some(job) => {
                    println!("Batch ID:  {}", job.id);
                    println!("Status:    {}", job.status.as_str());
                    println!("Progress:  {}/{} completed", job.completed, job.total);
                    if job.failed > 0 {
                        println!("Failed:    {}", job.failed);
                    }
                }
                None => println!("No batch in progress."),
            }
            let counts = pipeline::stored_insight_counts(&config).await?;
            if !counts.is_empty() {
                println!("Stored insights:");
                for (insight_type, count) in counts {
                    println!("  {insight_type}: {count}");
                }
            }
        }
        Command::Seed => {
            let written = pipeline::seed(&config).await?;
            println!("Seeded {written} taxonomy features.");
        }
    }

    Ok(())
}
