//! tunematch-scorer - playlist/song compatibility ranking
//!
//! Subcommands:
//! - `rank <request.json>`: rank a playlist's candidate songs
//! - `mood <request.json>`: compare song moods with a playlist mood
//! - `health`: check the embedding service
//! - `init-config [path]`: write the effective configuration as TOML
//!
//! Configuration priority: command line > environment > TOML file > defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tunematch_common::config::{load_config, user_config_path, write_toml_config, TomlConfig};
use tunematch_common::logging::init_logging;
use tunematch_common::{ModelVariant, MoodRequest, RankingRequest};
use tunematch_scorer::evaluation::{publish, EvaluationReport, JsonLinesSink};
use tunematch_scorer::mood::MoodMatch;
use tunematch_scorer::{
    EmbeddingProvider, HttpEmbeddingClient, MatchRanker, MoodAnalyzer, MoodAnchors, RankOptions,
    RankingOutcome,
};

/// Command-line arguments for tunematch-scorer
#[derive(Parser, Debug)]
#[command(name = "tunematch-scorer")]
#[command(about = "Rank songs against a playlist by semantic aspect compatibility")]
#[command(version)]
struct Cli {
    /// Configuration file (overrides TUNEMATCH_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Embedding service base URL
    #[arg(long, global = true)]
    embedding_url: Option<String>,

    /// Deadline for a whole request in milliseconds
    #[arg(long, global = true)]
    deadline_ms: Option<u64>,

    /// Embedding model variant (general, creative, semantic, fast)
    #[arg(long, global = true)]
    model: Option<ModelVariant>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank candidate songs against a playlist
    Rank {
        /// JSON ranking request: {"playlist": {...}, "songs": [...]}
        request: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Also write every ranked result to this JSON-lines file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Compare scores with the songs' ground truth
        #[arg(long)]
        evaluate: bool,
    },

    /// Compare song moods with a playlist mood (valence/arousal/dominance)
    Mood {
        /// JSON mood request: {"playlist_mood": {...}, "song_moods": [...]}
        request: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Check that the embedding service is reachable
    Health,

    /// Write the effective configuration (file, environment and flags merged)
    InitConfig {
        /// Destination; defaults to the per-user config file
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, origin) =
        load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, &cli);

    init_logging(&config.logging).context("Failed to initialize logging")?;
    origin.log();

    if let Command::InitConfig { path } = &cli.command {
        return run_init_config(&config, path.as_deref());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        embedding_url = %config.embedding.base_url,
        model = %config.embedding.model,
        "Starting tunematch-scorer"
    );

    let client = Arc::new(
        HttpEmbeddingClient::new(&config.embedding).context("Failed to create embedding client")?,
    );

    match cli.command {
        Command::Rank {
            request,
            format,
            report,
            evaluate,
        } => {
            run_rank(
                &config,
                client,
                &request,
                format,
                report.as_deref(),
                evaluate,
            )
            .await
        }
        Command::Mood { request, format } => run_mood(&config, client, &request, format).await,
        Command::Health => run_health(&client).await,
        Command::InitConfig { .. } => Ok(()),
    }
}

fn apply_cli_overrides(config: &mut TomlConfig, cli: &Cli) {
    if let Some(url) = &cli.embedding_url {
        config.embedding.base_url = url.clone();
    }
    if let Some(ms) = cli.deadline_ms {
        config.ranking.deadline_ms = Some(ms);
    }
    if let Some(model) = cli.model {
        config.embedding.model = model;
    }
}

fn run_init_config(config: &TomlConfig, path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => user_config_path().context("No per-user config directory on this platform")?,
    };

    write_toml_config(config, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Configuration written");
    println!("{}", path.display());
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Cancel `token` on Ctrl+C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, cancelling");
            token.cancel();
        }
    });
}

async fn run_rank(
    config: &TomlConfig,
    client: Arc<HttpEmbeddingClient>,
    request_path: &Path,
    format: OutputFormat,
    report_path: Option<&Path>,
    evaluate: bool,
) -> Result<()> {
    let request: RankingRequest = read_json(request_path)?;

    let provider: Arc<dyn EmbeddingProvider> = client;
    let ranker = MatchRanker::new(provider, &config.ranking, config.embedding.model);

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());
    let options = RankOptions::new()
        .with_deadline_ms(config.ranking.deadline_ms)
        .with_cancel(cancel);

    let outcome = ranker
        .rank(&request, &options)
        .await
        .context("Ranking failed")?;

    if let Some(path) = report_path {
        let mut sink = JsonLinesSink::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let written = publish(&outcome, &mut sink).context("Failed to write report")?;
        info!(path = %path.display(), results = written, "Report written");
    }

    if evaluate {
        let report = EvaluationReport::build(&outcome, &request.songs);
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Table => print_evaluation(&report),
        }
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Table => print_ranking(&outcome),
    }
    Ok(())
}

async fn run_mood(
    config: &TomlConfig,
    client: Arc<HttpEmbeddingClient>,
    request_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    let request: MoodRequest = read_json(request_path)?;

    let anchors = match &config.mood.anchors_file {
        Some(path) => MoodAnchors::load(path).context("Failed to load mood anchors")?,
        None => MoodAnchors::default(),
    };

    let provider: Arc<dyn EmbeddingProvider> = client;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());
    let options = RankOptions::new()
        .with_deadline_ms(config.ranking.deadline_ms)
        .with_cancel(cancel.clone());

    let analyzer = tokio::select! {
        _ = cancel.cancelled() => anyhow::bail!("Mood comparison cancelled"),
        analyzer = MoodAnalyzer::new(provider, anchors, config.embedding.model) => {
            analyzer.context("Failed to embed mood anchors")?
        }
    };

    let matches = analyzer
        .rank_song_moods(&request, &options)
        .await
        .context("Mood comparison failed")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&matches)?),
        OutputFormat::Table => print_mood_matches(&request, &matches),
    }
    Ok(())
}

async fn run_health(client: &HttpEmbeddingClient) -> Result<()> {
    let health = client
        .health()
        .await
        .with_context(|| format!("Embedding service at {} unreachable", client.base_url()))?;

    println!(
        "{}: status={} models_loaded={}",
        client.base_url(),
        health.status,
        health.models_loaded
    );
    Ok(())
}

fn print_ranking(outcome: &RankingOutcome) {
    println!("Request {} (model: {})", outcome.request_id, outcome.model);
    println!("{}", "-".repeat(80));

    for (position, result) in outcome.results.iter().enumerate() {
        println!(
            "{:>3}. {:.3}  {}",
            position + 1,
            result.final_score,
            result.track_info
        );
        println!("      {}", result.explanation);
    }

    if !outcome.failures.is_empty() {
        println!("{}", "-".repeat(80));
        println!("Skipped {} song(s):", outcome.failures.len());
        for failure in &outcome.failures {
            println!(
                "  #{} {}: {}",
                failure.song_index, failure.track_info, failure.error
            );
        }
    }
}

fn print_evaluation(report: &EvaluationReport) {
    println!("{:>4}  {:>6}  {:>6}  {:>6}  Track", "Rank", "Score", "Truth", "Error");
    for entry in &report.entries {
        let truth = entry
            .ground_truth
            .map(|t| format!("{:.3}", t))
            .unwrap_or_else(|| "-".to_string());
        let error = entry
            .abs_error
            .map(|e| format!("{:.3}", e))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>4}  {:>6.3}  {:>6}  {:>6}  {}",
            entry.rank, entry.final_score, truth, error, entry.track
        );
    }

    match report.mean_abs_error {
        Some(mae) => println!("Mean absolute error: {:.3}", mae),
        None => println!("No ground truth available"),
    }
    if report.skipped > 0 {
        println!("Skipped songs: {}", report.skipped);
    }
}

fn print_mood_matches(request: &MoodRequest, matches: &[MoodMatch]) {
    println!(
        "Mood compatibility with playlist mood: {}",
        request.playlist_mood.mood
    );
    println!("{}", "-".repeat(80));
    for (position, m) in matches.iter().enumerate() {
        println!(
            "{:>3}. {} - Score: {:.2}",
            position + 1,
            m.song_mood,
            m.compatibility.score
        );
        println!("      {}", m.compatibility.explanation);
    }
}
