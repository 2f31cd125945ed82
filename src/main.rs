//! Double Signal
//!
//! Live color-round forecaster with pattern mining and signal scoring.

use clap::{Parser, Subcommand};
use double_signal::{
    client::{HttpSource, OutcomeSource, SimulatedSource},
    config::Config,
    engine::Engine,
    monitor::LiveMonitor,
    storage::{Database, MemoryStore, OutcomeStore},
    types::sequence_text,
};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "double-signal")]
#[command(about = "Pattern-mining signal engine for Double color rounds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (defaults to config.toml or ~/.config/double-signal/config.toml)
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the live feed, emitting and scoring signals
    Run {
        /// Use the simulated feed instead of the live API
        #[arg(long)]
        simulate: bool,
        /// Keep state in memory only
        #[arg(long)]
        memory: bool,
    },
    /// Run one analysis pass over the stored log
    Analyze {
        /// Number of patterns to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Show running stats and recent settlements
    Stats {
        /// Number of settlements to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Check feed availability and stored log quality
    Check,
    /// Replay simulated rounds through an in-memory engine
    Simulate {
        /// Rounds to generate
        #[arg(short, long, default_value = "500")]
        rounds: usize,
        /// RNG seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    match cli.command {
        Commands::Run { simulate, memory } => run_live(config, simulate, memory).await,
        Commands::Analyze { limit } => analyze(config, limit).await,
        Commands::Stats { limit } => show_stats(config, limit).await,
        Commands::Check => check(config).await,
        Commands::Simulate { rounds, seed } => simulate(config, rounds, seed).await,
    }
}

async fn open_store(config: &Config, memory: bool) -> anyhow::Result<Arc<dyn OutcomeStore>> {
    if memory {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let path = shellexpand::tilde(&config.database.path).into_owned();
    tracing::info!("Using database {}", path);
    Ok(Arc::new(Database::connect(&path).await?))
}

async fn restored_engine(config: &Config, memory: bool) -> anyhow::Result<Engine> {
    let store = open_store(config, memory).await?;
    let mut engine = Engine::new(config, store);
    engine.restore().await;
    Ok(engine)
}

async fn run_live(config: Config, simulate: bool, memory: bool) -> anyhow::Result<()> {
    tracing::info!("Starting Double Signal");

    let source: Arc<dyn OutcomeSource> = if simulate {
        tracing::warn!("Using SIMULATED rounds - signals are not tied to the live game");
        Arc::new(SimulatedSource::new(&config.simulation))
    } else {
        Arc::new(HttpSource::new(&config.source)?)
    };

    let engine = restored_engine(&config, memory).await?;
    let monitor = LiveMonitor::new(Arc::new(Mutex::new(engine)), source, config.monitor.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    let stats = monitor.run(shutdown_rx).await;

    let engine = monitor.engine();
    let engine = engine.lock().await;
    println!("\nSession: {} backfilled, {} live rounds", stats.backfilled, stats.ingested);
    print_stats(&engine, 5);

    Ok(())
}

async fn analyze(config: Config, limit: usize) -> anyhow::Result<()> {
    let mut engine = restored_engine(&config, false).await?;
    engine.analyze().await;

    println!("\nAnalysis over {} rounds\n", engine.history().len());
    print_signal(&engine);

    println!("\nCandidates:");
    if engine.candidates().is_empty() {
        println!("  (none)");
    }
    for candidate in engine.candidates() {
        println!(
            "  {:<20} {:<6} {:>5.1}%  {:<12} {}",
            candidate.source.to_string(),
            candidate.color.to_string(),
            candidate.confidence,
            candidate.entry_delay.to_string(),
            candidate.reason
        );
    }

    println!("\nTop patterns:");
    println!("{:<32} {:>6} {:>9} {:>6}", "Sequence", "Seen", "Accuracy", "Next");
    println!("{}", "-".repeat(56));
    for pattern in engine.patterns().iter().take(limit) {
        println!(
            "{:<32} {:>6} {:>8.1}% {:>6}",
            pattern.text(),
            pattern.occurrences,
            pattern.accuracy,
            pattern.next.to_string()
        );
    }

    Ok(())
}

async fn show_stats(config: Config, limit: usize) -> anyhow::Result<()> {
    let engine = restored_engine(&config, false).await?;
    print_stats(&engine, limit);
    Ok(())
}

async fn check(config: Config) -> anyhow::Result<()> {
    let source = HttpSource::new(&config.source)?;
    let available = source.check_availability().await;
    println!("\nFeed: {}", if available { "available" } else { "UNAVAILABLE" });

    let engine = restored_engine(&config, false).await?;
    let report = engine.inspect_feed(config.monitor.anomaly_window);

    println!("Stored rounds inspected: {}", report.samples);
    if let Some(pct) = report.white_pct {
        println!("White frequency: {:.2}%", pct);
    }
    if report.is_clean() {
        println!("No anomalies");
    } else {
        println!("Anomalies:");
        for anomaly in &report.anomalies {
            println!("  - {}", anomaly);
        }
    }

    Ok(())
}

async fn simulate(mut config: Config, rounds: usize, seed: Option<u64>) -> anyhow::Result<()> {
    if seed.is_some() {
        config.simulation.seed = seed;
    }

    let source = SimulatedSource::new(&config.simulation);
    let mut engine = Engine::new(&config, Arc::new(MemoryStore::new()));

    for _ in 0..rounds {
        if let Some(raw) = source.fetch_latest().await? {
            engine.ingest(raw).await?;
        }
    }

    let colors: Vec<_> = engine.history().iter().rev().take(20).rev().map(|o| o.color).collect();
    println!("\nSimulated {} rounds, last 20: {}", engine.history().len(), sequence_text(&colors));
    print_signal(&engine);
    print_stats(&engine, 5);

    let report = engine.inspect_feed(config.monitor.anomaly_window);
    for anomaly in &report.anomalies {
        println!("Anomaly: {}", anomaly);
    }

    Ok(())
}

fn print_signal(engine: &Engine) {
    let signal = engine.signal();
    match signal.color {
        Some(color) => println!(
            "Signal: {} {} at {:.1}% ({}, {})",
            signal.action, color, signal.confidence, signal.strategy, signal.entry_delay
        ),
        None => println!(
            "Signal: {} ({}, {:.1}%)",
            signal.action, signal.strategy, signal.confidence
        ),
    }
    println!("Reason: {}", signal.reason);
}

fn print_stats(engine: &Engine, limit: usize) {
    let stats = engine.stats();

    println!("\nSignals scored: {}", stats.total);
    println!("Accuracy: {:.1}% ({} green / {} red)", stats.accuracy, stats.greens, stats.reds);
    println!("Streak: {} (best {})", stats.streak, stats.best_streak);
    println!("Simulated profit: {:.2} units", stats.profit);

    let recent: Vec<_> = engine.recent_settlements().collect();
    if recent.is_empty() {
        return;
    }

    println!("\nRecent settlements:");
    for s in recent.iter().rev().take(limit) {
        println!(
            "  {} {:<6} vs {:<6} {:>5.1}% {}  {}",
            s.settled_at.format("%H:%M:%S"),
            s.predicted.to_string(),
            s.actual.to_string(),
            s.confidence,
            if s.correct { "GREEN" } else { "RED  " },
            s.source.map(|k| k.to_string()).unwrap_or_default()
        );
    }
}
