mod artifacts;
mod commands;
mod config;
mod error;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

use drdata_core::{MemoryCache, Session};
use drdata_introspect::PostgresDatabase;

use config::DrdataConfig;
use error::CliError;

#[derive(Parser, Debug)]
#[command(
    name = "drdata",
    version,
    about = "Introspect, fill, load and truncate a PostgreSQL schema"
)]
struct Cli {
    /// Configuration file (TOML, or JSON with a .json extension).
    #[arg(long, global = true, env = "DRDATA_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Also write JSON log lines to this file.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the schema and its table insertion order as JSON.
    Biopsy(BiopsyArgs),
    /// Insert randomly generated rows into every table.
    Inject(InjectArgs),
    /// Load one CSV file, or a directory of `<table>.csv` files.
    Transplant(TransplantArgs),
    /// Truncate every table.
    Cleanse,
}

#[derive(Args, Debug)]
struct BiopsyArgs {
    /// Existing directory the JSON files are written to.
    #[arg(long, value_name = "DIR")]
    export: PathBuf,
}

#[derive(Args, Debug)]
struct InjectArgs {
    /// Rows per table; defaults to `generate.rows` from the config.
    #[arg(long)]
    rows: Option<u64>,
    /// Seed for reproducible data; defaults to `generate.seed`.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct TransplantArgs {
    /// CSV file or directory of CSV files named after tables.
    #[arg(long, value_name = "PATH")]
    source: PathBuf,
    /// Target table; required when the source is a file.
    #[arg(long, value_name = "TABLE")]
    destination: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::init_logging(cli.log_file.as_deref()) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(event = "command_failed", error = %err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.ok_or(CliError::MissingConfig)?;
    let config = DrdataConfig::load(&config_path)?;
    let target = config.db.redacted();
    let timer = Instant::now();

    let pool = PgPoolOptions::new()
        .max_connections(config.db.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(config.db.connect_options()?)
        .await
        .map_err(|source| CliError::Connect {
            target: target.clone(),
            source,
        })?;
    info!(event = "connected", target = %target, schema = %config.db.schema);

    let database = PostgresDatabase::new(pool, config.db.introspect_options());
    let mut cache = MemoryCache::new();
    let mut session = Session::new(&database, &mut cache, config.fingerprint()?);
    let database_name = config.db.database_name();
    let label = database_name.as_deref().unwrap_or(database.namespace());

    match cli.command {
        Command::Biopsy(args) => {
            println!("Starting biopsy of {label}");
            let exported =
                commands::biopsy(&mut session, &args.export, database_name.as_deref()).await?;
            println!("Wrote {}", exported.schema_path.display());
            println!("Wrote {}", exported.order_path.display());
        }
        Command::Inject(args) => {
            let rows = args.rows.or(config.generate.rows).ok_or_else(|| {
                CliError::Usage("inject needs --rows or generate.rows in the config".to_string())
            })?;
            let report =
                commands::inject(&mut session, config.generate_options(args.seed), rows).await?;
            println!(
                "Injected {} rows into {} tables of {label} (seed {})",
                report.rows_written(),
                report.tables.len(),
                report.seed
            );
        }
        Command::Transplant(args) => {
            println!("Starting transplant into {label}");
            let report = commands::transplant(
                &mut session,
                &args.source,
                args.destination.as_deref(),
                config.csv_options(),
            )
            .await?;
            for load in &report.loaded {
                println!("{}: {} rows from {}", load.table, load.rows, load.file.display());
            }
            for file in &report.unmatched {
                println!("ignored {} (no table with that name)", file.display());
            }
        }
        Command::Cleanse => {
            let truncated = commands::cleanse(&mut session).await?;
            println!("Truncated {} tables of {label}", truncated.len());
        }
    }

    info!(
        event = "command_finished",
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}
