use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use civicdesk::config::AppConfig;
use civicdesk::logging::init_tracing;
use civicdesk::runtime::build_runtime;

/// Government-service assistant for Aadhaar, PAN, passport and grievance status.
#[derive(Parser, Debug)]
#[command(name = "civicdesk", version, about)]
struct Cli {
    /// Configuration file (defaults to ./civicdesk.toml when present).
    #[arg(long, value_name = "PATH", env = "CIVICDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Record file for the in-process tool server.
    #[arg(long, value_name = "PATH")]
    records: Option<PathBuf>,

    /// Print the discovered operations and exit.
    #[arg(long)]
    list_tools: bool,

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
            eprintln!("civicdesk: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(records) = cli.records {
        config.records = records;
    }

    let credential = config
        .resolve_credential(|key| std::env::var(key).ok())
        .context("resolving the reasoning credential")?;
    let runtime = build_runtime(&config, credential)
        .await
        .context("starting tool servers")?;

    if cli.list_tools {
        for definition in runtime.operations() {
            println!(
                "{} [{}] ({}): {}",
                definition.name, definition.domain, definition.input_key, definition.description
            );
        }
        return Ok(());
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let turns = runtime
        .conversation_loop()
        .run(stdin, tokio::io::stdout())
        .await
        .context("conversation loop")?;

    tracing::info!(phase = "shutdown", event = "conversation_ended", turns);
    Ok(())
}
