//! Hermod - tool-calling assistant with MCP tools and retrieval context.
//!
//! Main entry point for the Hermod CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod bootstrap;
mod commands;

use commands::{ask, chat, ingest, reset, serve, tools};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Hermod - tool-calling assistant with MCP tools and retrieval context
#[derive(Parser, Debug)]
#[command(name = "hermod")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration directory (default: $XDG_CONFIG_HOME/hermod)
    #[arg(long, global = true, env = hermod_config::CONFIG_DIR_ENV)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP tool server
    Serve(serve::ServeArgs),

    /// Enter interactive chat mode (REPL)
    Chat(chat::ChatArgs),

    /// Ask a one-shot question
    Ask(ask::AskArgs),

    /// Index a text file for retrieval
    Ingest(ingest::IngestArgs),

    /// List the tools every configured provider offers
    Tools(tools::ToolsArgs),

    /// Clear a stored conversation
    Reset(reset::ResetArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = cli
        .config_dir
        .clone()
        .or_else(hermod_config::xdg_config_dir)
        .unwrap_or_else(|| PathBuf::from(".hermod"));

    // Console (human-readable) + daily rolling JSON file
    let filter = if cli.verbose {
        "hermod=debug,hermod_agent=debug,hermod_llm=debug,hermod_mcp=debug,hermod_rag=debug,hermod_server=debug,hermod_session=debug,info"
    } else {
        "hermod=info,hermod_agent=info,hermod_mcp=info,hermod_server=info,warn"
    };

    let file_appender = tracing_appender::rolling::daily(config_dir.join("logs"), "hermod.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "hermod=trace,hermod_agent=trace,hermod_llm=trace,hermod_mcp=trace,hermod_rag=trace,hermod_server=trace,hermod_session=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context::load(config_dir, cli.verbose)?;

    match cli.command {
        Commands::Serve(args) => serve::run(args, &ctx).await,
        Commands::Chat(args) => chat::run(args, &ctx).await,
        Commands::Ask(args) => ask::run(args, &ctx).await,
        Commands::Ingest(args) => ingest::run(args, &ctx).await,
        Commands::Tools(args) => tools::run(args, &ctx).await,
        Commands::Reset(args) => reset::run(args, &ctx).await,
    }
}
