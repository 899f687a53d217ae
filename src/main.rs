use chrono::{Local, NaiveTime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use market_watch::app::ports::ProductSource;
use market_watch::app::CleanUseCase;
use market_watch::config::{Config, DEFAULT_CONFIG_PATH};
use market_watch::domain::RunContext;
use market_watch::infra::{read_clean_batch, NdjsonBatchAdapter};
use market_watch::logging;
use market_watch::observability;
use market_watch::pipeline::ingestion::JsonFileSource;
use market_watch::pipeline::orchestrator::{analyze_use_case, batch_output};
use market_watch::pipeline::processing::cleaning::{Cleaner, CleaningAudit};
use market_watch::pipeline::schedule::{delay_until, parse_time_of_day};
use market_watch::pipeline::{PipelineOrchestrator, PipelineOutcome};

#[derive(Parser)]
#[command(name = "market_watch")]
#[command(about = "Competitive-intelligence pipeline for product listings")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline once: fetch, clean, analyze, report
    Run,
    /// Fetch products and save the raw batch
    Fetch,
    /// Clean a saved raw batch (JSON array or NDJSON)
    Clean {
        #[arg(long)]
        input: PathBuf,
        /// Directory for the clean batch, defaults to paths.processed_data
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Score sentiment, compute statistics and insights for a saved clean batch
    Analyze {
        #[arg(long)]
        input: PathBuf,
    },
    /// Run the full pipeline on a fixed interval until Ctrl-C
    Schedule {
        #[arg(long, default_value_t = 1440, value_parser = clap::value_parser!(u64).range(1..))]
        every_minutes: u64,
        /// Local time of the first run (HH:MM); without it the first run starts now
        #[arg(long, value_parser = parse_time_of_day)]
        at: Option<NaiveTime>,
    },
}

fn print_outcome(outcome: &PipelineOutcome) {
    println!("\n📊 Pipeline Results:");
    println!("   Run: {}", outcome.run_id);
    println!("   Duration: {:.2}s", outcome.duration.as_secs_f64());
    println!("   Products processed: {}", outcome.products_processed);
    println!("   Insights generated: {}", outcome.insights.len());
    println!("\n📁 Files created:");
    println!("   Raw: {}", outcome.files.raw.display());
    println!("   Clean: {}", outcome.files.clean.display());
    println!("   Analyzed: {}", outcome.files.analyzed.display());
    println!("   Dashboard: {}", outcome.files.dashboard.display());
    print_insights(&outcome.insights);
}

fn print_audit(audit: &CleaningAudit) {
    println!("\n🧹 Cleaning report:");
    println!("   Initial rows: {}", audit.initial_rows);
    for (rule, count) in audit.counts() {
        println!("   {}: {}", rule, count);
    }
    println!(
        "   Final rows: {} ({:.1}% removed)",
        audit.final_rows(),
        audit.removed_pct()
    );
}

fn print_insights(insights: &[String]) {
    if insights.is_empty() {
        return;
    }
    println!("\n💡 Insights:");
    for insight in insights {
        println!("   {}", insight);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)?;
    logging::init_logging(&config);
    if let Err(e) = observability::init() {
        warn!("Metrics disabled: {}", e);
    }

    match cli.command {
        Commands::Run => {
            println!("🚀 Running full pipeline...");
            let orchestrator = PipelineOrchestrator::from_config(&config)?;
            match orchestrator.run().await {
                Ok(outcome) => {
                    print_outcome(&outcome);
                    println!("\n✅ Pipeline completed successfully!");
                }
                Err(e) => {
                    println!("❌ Pipeline failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Fetch => {
            println!("📥 Fetching products...");
            let orchestrator = PipelineOrchestrator::from_config(&config)?;
            let (count, path) = orchestrator.fetch().await?;
            println!("✅ {} products saved to {}", count, path.display());
        }
        Commands::Clean { input, output_dir } => {
            println!("🧹 Cleaning {}...", input.display());
            let raw = JsonFileSource::new(&input).fetch_products().await?;
            let output = NdjsonBatchAdapter::new(
                &config.paths.raw_data,
                output_dir.unwrap_or_else(|| config.paths.processed_data.clone()),
            );
            let cleaner = Cleaner::new(config.cleaning.clone());
            let use_case = CleanUseCase::new(cleaner, Arc::new(output));
            let cleaned = use_case.clean(&RunContext::new(), &raw).await?;
            print_audit(&cleaned.audit);
            println!("\n✅ Clean batch saved to {}", cleaned.path.display());
        }
        Commands::Analyze { input } => {
            println!("🤖 Analyzing {}...", input.display());
            let batch = read_clean_batch(&input)?;
            let audit = CleaningAudit::new(batch.len());
            let use_case = analyze_use_case(&config, batch_output(&config));
            let out = use_case.analyze(&RunContext::new(), batch, audit).await?;
            print_insights(&out.report.insights);
            println!("\n✅ Dashboard saved to {}", out.dashboard_path.display());
        }
        Commands::Schedule { every_minutes, at } => {
            println!(
                "⏰ Running the pipeline every {} minutes (Ctrl-C to stop)",
                every_minutes
            );
            let orchestrator = PipelineOrchestrator::from_config(&config)?;
            let first_delay = match at {
                Some(at) => {
                    let delay = delay_until(Local::now().naive_local(), at);
                    println!("   First run at {} (in {}s)", at.format("%H:%M"), delay.as_secs());
                    delay
                }
                None => Duration::ZERO,
            };
            let period = Duration::from_secs(every_minutes * 60);
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + first_delay, period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match orchestrator.run().await {
                            Ok(outcome) => info!(
                                "Scheduled run {} finished: {} products, {} insights",
                                outcome.run_id,
                                outcome.products_processed,
                                outcome.insights.len()
                            ),
                            Err(e) => error!("Scheduled run failed: {:#}", e),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        println!("👋 Scheduler stopped");
                        break;
                    }
                }
            }
        }
    }

    if let Some(snapshot) = observability::render() {
        debug!("Metrics snapshot:\n{}", snapshot);
    }
    Ok(())
}
