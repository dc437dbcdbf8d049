mod analyzer;
mod config;
mod model;
mod normalizer;
mod parser;
mod pipeline;
mod scraper;
mod storage;
mod utils;

use analyzer::{chart, PriceStats};
use config::{load_config, AppConfig};
use pipeline::PipelineContext;
use storage::SqliteStorage;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "PRICE_SNIPER_CONFIG";
const USAGE: &str = "usage: price-sniper [track <url> | history <url> | list | export <file.csv> | import <file.csv>]";

enum Command {
    Watch,
    Track(String),
    History(String),
    List,
    Export(String),
    Import(String),
}

fn parse_args() -> Result<Command, String> {
    let mut args = std::env::args().skip(1);
    let Some(cmd) = args.next() else {
        return Ok(Command::Watch);
    };
    let mut operand = || args.next().ok_or_else(|| format!("missing argument for {}", cmd));
    match cmd.as_str() {
        "watch" => Ok(Command::Watch),
        "track" => Ok(Command::Track(operand()?)),
        "history" => Ok(Command::History(operand()?)),
        "list" => Ok(Command::List),
        "export" => Ok(Command::Export(operand()?)),
        "import" => Ok(Command::Import(operand()?)),
        other => Err(format!("unknown command: {}", other)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let command = match parse_args() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };

    // Load configuration from file
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.json".into());
    let config = if Path::new(&config_path).exists() {
        match load_config(&config_path) {
            Ok(cfg) => Arc::new(cfg),
            Err(e) => {
                error!("Config load error ({}): {}", config_path, e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        info!("No config at {}, using defaults", config_path);
        Arc::new(AppConfig::default())
    };

    // One store for every caller, serialized by the mutex
    let storage = match SqliteStorage::new(&config.db_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        Command::Watch => watch(&config, storage).await,
        Command::Track(url) => track(&config, storage, &url).await,
        Command::History(url) => history(storage, &url).await,
        Command::List => list(storage).await,
        Command::Export(path) => export(storage, &path).await,
        Command::Import(path) => import(storage, &path).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Periodic trigger: track the configured addresses now and then on every interval.
async fn watch(config: &AppConfig, storage: Arc<Mutex<SqliteStorage>>) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = PipelineContext::from_config(config, storage)?;
    if config.tracked_urls.is_empty() {
        warn!("tracked_urls is empty; nothing will be observed");
    }

    loop {
        info!("🔎 Tracking {} addresses...", config.tracked_urls.len());
        let reports = ctx.track_all(&config.tracked_urls).await;
        let failed: Vec<&str> = reports
            .iter()
            .filter(|r| r.outcome.is_err())
            .map(|r| r.url.as_str())
            .collect();
        info!("✅ Recorded {}/{} prices", reports.len() - failed.len(), reports.len());
        if !failed.is_empty() {
            info!("No price this round for: {}", failed.join(", "));
        }

        info!("Waiting {}s for the next run...", config.check_interval_seconds);
        tokio::select! {
            _ = sleep(Duration::from_secs(config.check_interval_seconds)) => {
                info!("Timer triggered.");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down.");
                return Ok(());
            }
        }
    }
}

/// Interactive path: prints the tracking result as JSON for the front end.
async fn track(
    config: &AppConfig,
    storage: Arc<Mutex<SqliteStorage>>,
    url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = PipelineContext::from_config(config, storage)?;
    let result = ctx.track(url).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn history(storage: Arc<Mutex<SqliteStorage>>, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let history = storage.lock().await.history(url)?;
    let payload = serde_json::json!({
        "url": url,
        "count": history.len(),
        "stats": PriceStats::from_history(&history),
        "chart": chart::project(&history),
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

async fn list(storage: Arc<Mutex<SqliteStorage>>) -> Result<(), Box<dyn std::error::Error>> {
    for url in storage.lock().await.tracked_urls()? {
        println!("{}", url);
    }
    Ok(())
}

async fn export(storage: Arc<Mutex<SqliteStorage>>, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let observations = storage.lock().await.all()?;
    let file = BufWriter::new(File::create(path)?);
    storage::csv::write_observations(file, &observations)?;
    info!("Exported {} observations to {}", observations.len(), path);
    Ok(())
}

async fn import(storage: Arc<Mutex<SqliteStorage>>, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let parsed = storage::csv::parse_observations(&text);
    if parsed.skipped > 0 {
        warn!("Skipped {} malformed rows in {}", parsed.skipped, path);
    }
    let added = storage.lock().await.append_all(&parsed.observations)?;
    info!("Imported {} observations from {}", added, path);
    Ok(())
}
