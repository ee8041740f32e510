//! PowerCurve CLI
//!
//! Ingests power recordings, reprocesses them and prints range aggregates.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use powercurve::curve::{DateRange, PowerCurve, RangeAggregator};
use powercurve::recording::{JsonFileSource, Recording, RecordingProcessor};
use powercurve::storage::config::{load_config, load_config_from, save_config, save_config_to};
use powercurve::storage::{CurveStore, Database, SqliteCurveStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "powercurve")]
#[command(about = "Mean maximal power curves for cycling recordings")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file (overrides config file)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Log filter (overrides config file, ignored when RUST_LOG is set)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a recording from a JSON sample file and compute its curve
    Ingest {
        /// JSON array of {"timestamp", "power"} objects
        samples: PathBuf,
        /// Activity date
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Recording identifier (random if omitted)
        #[arg(long)]
        id: Option<Uuid>,
    },
    /// Recompute the curve of an existing recording
    Reprocess {
        /// Recording identifier
        id: Uuid,
        /// JSON array of {"timestamp", "power"} objects
        samples: PathBuf,
    },
    /// Print the best curve over processed recordings in a date range
    Curve {
        /// First day, inclusive
        #[arg(long)]
        start: NaiveDate,
        /// Last day, inclusive
        #[arg(long)]
        end: NaiveDate,
    },
    /// Delete a recording and its curve points
    Delete {
        /// Recording identifier
        id: Uuid,
    },
    /// Write the effective configuration to the config file
    InitConfig,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => load_config().context("loading configuration")?,
    };

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Parsed command line arguments: config={:?}", args.config);

    if let Some(database) = &args.database {
        let database = resolve_database(database)?;
        config.storage.database_file = database.to_string_lossy().into_owned();
    }

    if let Command::InitConfig = args.command {
        match &args.config {
            Some(path) => save_config_to(&config, path),
            None => save_config(&config),
        }
        .context("writing configuration")?;
        tracing::info!("Configuration written");
        return Ok(());
    }

    let db_path = config.database_path();
    let db = Database::open(&db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    let store = SqliteCurveStore::new(db.connection());
    let curve_config = config.analysis.curve_config();

    match args.command {
        Command::Ingest { samples, date, id } => {
            let source = JsonFileSource::new(samples);
            let recording = Recording::with_id(id.unwrap_or_else(Uuid::new_v4), date)
                .with_label(source.path().to_string_lossy());
            let curve = RecordingProcessor::with_config(&store, &curve_config)
                .ingest(&recording, &source)
                .with_context(|| format!("processing recording {}", recording.id))?;
            print_curve(Some(recording.id), &curve)?;
        }
        Command::Reprocess { id, samples } => {
            let curve = RecordingProcessor::with_config(&store, &curve_config)
                .process(&id, &JsonFileSource::new(&samples))
                .with_context(|| format!("reprocessing recording {}", id))?;
            print_curve(Some(id), &curve)?;
        }
        Command::Curve { start, end } => {
            let range = DateRange::new(start, end)?;
            let curve = RangeAggregator::new(&store).aggregate(&range)?;
            print_curve(None, &curve)?;
        }
        Command::Delete { id } => {
            store
                .delete_recording(&id)
                .with_context(|| format!("deleting recording {}", id))?;
            tracing::info!("Deleted recording {}", id);
        }
        Command::InitConfig => {}
    }

    Ok(())
}

/// Resolve a `--database` path against the current directory.
fn resolve_database(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("reading current directory")?;
    Ok(cwd.join(path))
}

/// Print a curve as JSON keyed by duration in seconds.
fn print_curve(id: Option<Uuid>, curve: &PowerCurve) -> Result<()> {
    let output = match id {
        Some(id) => serde_json::json!({ "id": id, "curve": curve }),
        None => serde_json::json!({ "curve": curve }),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
