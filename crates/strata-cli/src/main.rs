//! Strata CLI entry point.
//!
//! Binary name: `strata`
//!
//! Parses CLI arguments, initializes tracing and the memory engine, then
//! dispatches to the appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;
use strata_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(filter_for_verbosity(cli.verbose, cli.quiet), cli.otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "strata", &mut std::io::stdout());
        return Ok(());
    }

    let mut state = AppState::init(cli.data_dir.clone(), !cli.no_model).await?;
    let json = cli.json;

    match cli.command {
        Commands::Add { text, id, meta } => {
            cli::memory::add_document(&mut state, id, &text, &meta, json).await?;
        }

        Commands::AddVector {
            id,
            vector,
            timestamp,
            meta,
        } => {
            cli::memory::add_vector(&mut state, &id, vector, timestamp.as_deref(), &meta, json)
                .await?;
        }

        Commands::Query {
            text,
            vector,
            top_k,
            filter,
        } => {
            cli::query::query(&state, text.as_deref(), vector, top_k, &filter, json).await?;
        }

        Commands::List { filter } => {
            cli::memory::list_items(&state, &filter, json)?;
        }

        Commands::Get { id } => {
            cli::memory::get_item(&state, &id, json)?;
        }

        Commands::Ids => {
            cli::memory::list_ids(&state, json)?;
        }

        Commands::Slice {
            start,
            end,
            include_cold,
        } => {
            cli::memory::slice(&state, &start, &end, include_cold, json)?;
        }

        Commands::Trace { id, depth } => {
            cli::query::trace(&state, &id, depth, json)?;
        }

        Commands::Relate {
            a,
            b,
            weight,
            edge_type,
        } => {
            cli::query::relate(&mut state, &a, &b, weight, edge_type, json).await?;
        }

        Commands::Status => {
            cli::status::status(&state, json)?;
        }

        Commands::Sweep => {
            cli::status::sweep(&mut state, json).await?;
        }

        Commands::Embed { texts } => {
            cli::embed::embed(&state, &texts, json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    state.close().await
}
