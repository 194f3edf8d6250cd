use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feedless_cli::cli::{import_jsonl, run_server, ApiResponse, AppState, CliCommand, CliConfig};
use feedless_core::store::SqliteLog;
use feedless_core::tracing_setup::init_tracing;
use feedless_core::{EntryFilter, Queries};

#[derive(Parser)]
#[command(name = "feedless")]
#[command(about = "Query and serve a local social log")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short, global = true)]
    pretty: bool,

    /// Path to JSON config file (dataDir, bindAddr, profileCacheIntervalSecs)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON API over HTTP
    Serve {
        /// Overrides bindAddr from the config file
        #[arg(long)]
        bind: Option<String>,
    },

    /// Resolve a profile
    Profile { id: String },

    /// Public wall of a profile
    Posts { id: String },

    /// Private messages addressed to a profile
    Vanishing { id: String },

    /// Friends and pending requests of a profile
    Friends { id: String },

    /// Relationship of SOURCE towards DEST
    Status { source: String, dest: String },

    /// Find people by self-asserted name
    Search { query: String },

    /// Raw log entries, newest first
    Entries {
        #[arg(long)]
        author: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// Import records from a JSON-lines file
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let core_config = config.core_config();

    std::fs::create_dir_all(&core_config.data_dir).with_context(|| {
        format!("Failed to create data dir: {}", core_config.data_dir.display())
    })?;
    let log = Arc::new(SqliteLog::open(core_config.log_path())?);

    let command = match cli.command {
        Commands::Serve { bind } => {
            let queries = Queries::from_backend(log.clone(), &core_config);
            let _sweeper = queries.profiles().cache().spawn_sweeper();
            let bind_addr = bind.unwrap_or(config.bind_addr);
            return run_server(&bind_addr, AppState { queries, writer: log }).await;
        }
        Commands::Import { file } => {
            let inserted = import_jsonl(&log, &file)?;
            let response = ApiResponse::success(serde_json::json!({ "inserted": inserted }));
            return print_response(&response, cli.pretty);
        }
        Commands::Profile { id } => CliCommand::Profile { id },
        Commands::Posts { id } => CliCommand::Posts { id },
        Commands::Vanishing { id } => CliCommand::Vanishing { id },
        Commands::Friends { id } => CliCommand::Friends { id },
        Commands::Status { source, dest } => CliCommand::Status { source, dest },
        Commands::Search { query } => CliCommand::Search { query },
        Commands::Entries { author, kind } => CliCommand::Entries {
            filter: EntryFilter { author, kind },
        },
    };

    let queries = Queries::from_backend(log, &core_config);
    let response = command.execute(&queries).await;
    print_response(&response, cli.pretty)?;
    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_response(response: &ApiResponse, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(response)?
    } else {
        serde_json::to_string(response)?
    };
    println!("{}", json);
    Ok(())
}
