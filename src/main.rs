use anyhow::Result;
use clap::{Parser, ValueEnum};
use ec2inv::app::App;
use ec2inv::aws::client::AwsClient;
use ec2inv::config::{profile_prefix, Config};
use ec2inv::inventory::CacheStore;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Attempts for the whole construct-and-run sequence before giving up.
const RETRIES: usize = 3;

/// Dynamic AWS inventory for automation tools
#[derive(Parser, Debug)]
#[command(name = "ec2inv", version, about, long_about = None)]
struct Args {
    /// List all groups (the default when --host is not given)
    #[arg(long)]
    list: bool,

    /// Print all variables for one host, by endpoint
    #[arg(long)]
    host: Option<String>,

    /// Rebuild the cache with fresh API calls before answering
    #[arg(long)]
    refresh_cache: bool,

    /// Only emit the tag-derived group names
    #[arg(long)]
    tags_only: bool,

    /// Override the cache directory
    #[arg(long)]
    cache_path: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Logs go to a file: stdout belongs to the JSON the automation tool reads.
fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return None;
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .expect("Failed to open log file");

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ec2inv started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("ec2inv").join("ec2inv.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".ec2inv").join("ec2inv.log");
    }
    PathBuf::from("ec2inv.log")
}

async fn run(args: &Args) -> Result<()> {
    let config = Config::load();

    let cache_dir = config.cache_dir(args.cache_path.as_deref());
    std::fs::create_dir_all(&cache_dir)?;
    let cache = CacheStore::new(
        &cache_dir,
        Duration::from_secs(config.cache_max_age),
        &profile_prefix(),
    );

    let client = AwsClient::new().await;
    let mut app = App::new(client, config, cache, args.tags_only);

    if args.refresh_cache || !app.cache_is_valid() {
        app.refresh_all().await?;
    }

    let output = match &args.host {
        Some(endpoint) => {
            if args.list {
                tracing::warn!("--list is ignored when --host is given");
            }
            app.host(endpoint).await?
        }
        None => app.list()?,
    };
    println!("{output}");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut last_error = None;
    for attempt in 1..=RETRIES {
        match run(&args).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                tracing::error!("attempt {attempt}/{RETRIES} failed: {err:?}");
                eprintln!("Error: {err:?}");
                last_error = Some(err);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("inventory run failed")))
}
