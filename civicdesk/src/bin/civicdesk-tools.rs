use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use civicdesk::logging::init_tracing;
use civicdesk::{InMemoryRecordStore, ToolServer, serve_connection};

/// Serves the civicdesk status operations over stdin/stdout.
#[derive(Parser, Debug)]
#[command(name = "civicdesk-tools", version, about)]
struct Cli {
    /// Record file to answer lookups from.
    #[arg(long, value_name = "PATH", env = "CIVICDESK_RECORDS")]
    records: PathBuf,

    /// Name reported during discovery.
    #[arg(long, default_value = "civicdesk-tools")]
    name: String,

    /// Debug-level logs on stderr.
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("civicdesk-tools: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let store = InMemoryRecordStore::from_path(&cli.records)
        .with_context(|| format!("loading records from {}", cli.records.display()))?;
    let server = ToolServer::with_builtin_operations(cli.name, Arc::new(store))
        .context("registering operations")?;

    serve_connection(Arc::new(server), tokio::io::stdin(), tokio::io::stdout())
        .await
        .context("serving stdio")?;
    Ok(())
}
