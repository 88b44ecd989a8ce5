//! Casebook CLI - Main Entry Point
//!
//! Edits the dynamic field values of a test case collection: list the
//! placeholders each test case uses, record values globally or per test
//! case, preview `faker.*` expressions, and move the data in and out as a
//! JSON document.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod output;
mod workspace;

use commands::{fields, state, transfer, values};
use config::CliConfig;
use output::{print_error, print_success};
use workspace::Session;

/// Casebook - Dynamic test data for test case collections
#[derive(Parser)]
#[command(name = "casebook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "casebook.toml", env = "CASEBOOK_CONFIG", global = true)]
    config: PathBuf,

    /// Working state file (overrides the configured one)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the fields each test case uses and the common ones
    Fields(fields::FieldsArgs),

    /// Show recorded values of a field
    Get(values::GetArgs),

    /// Record a value, evaluating `faker.*` expressions
    Set(values::SetArgs),

    /// Complete a partially typed expression
    Suggest(values::SuggestArgs),

    /// Evaluate an expression once without storing it
    Eval(values::EvalArgs),

    /// Show or change the edit mode
    Mode(state::ModeArgs),

    /// Write the export document
    Export(transfer::ExportArgs),

    /// Load an exported document, reordering the test cases to match
    Import(transfer::ImportArgs),

    /// Print test case payloads with values substituted
    Render(fields::RenderArgs),

    /// Drop values of test cases that no longer exist
    Prune(state::PruneArgs),

    /// Remove every recorded value
    Clear,

    /// Write a default configuration file
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(&cli.config)?;
    let format = cli.format;

    if let Commands::Init = cli.command {
        config.save(&cli.config)?;
        print_success(&format!("Wrote {}", cli.config.display()));
        return Ok(());
    }

    let state_path = cli.state.unwrap_or_else(|| config.state_path.clone());
    let mut session = Session::open(&config, state_path).await?;

    match cli.command {
        Commands::Fields(args) => fields::list(args, &session, format).await?,
        Commands::Get(args) => values::get(args, &session, format).await?,
        Commands::Set(args) => values::set(args, &mut session, format).await?,
        Commands::Suggest(args) => values::suggest(args, &session, format)?,
        Commands::Eval(args) => values::eval(args, &mut session, format)?,
        Commands::Mode(args) => state::mode(args, &mut session, format)?,
        Commands::Export(args) => transfer::export(args, &session, &config, format).await?,
        Commands::Import(args) => transfer::import(args, &mut session, format).await?,
        Commands::Render(args) => fields::render(args, &session, format).await?,
        Commands::Prune(args) => state::prune(args, &mut session, format).await?,
        Commands::Clear => state::clear(&mut session)?,
        Commands::Init => {}
    }

    session.save_if_changed().await?;
    Ok(())
}
