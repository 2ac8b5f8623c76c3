//! Serve command - runs the MCP tool server.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use hermod_server::{Server, ToolCatalog, socket_addr};

use super::Context;

/// Arguments for the serve command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let mut server_config = ctx.config().server();
    if let Some(bind) = args.bind {
        server_config.bind = bind;
    }
    if let Some(port) = args.port {
        server_config.port = port;
    }

    let addr = socket_addr(&server_config.bind, server_config.port)?;
    let catalog = ToolCatalog::from_config(&server_config, ctx.config_dir())?;

    if ctx.verbose {
        println!("Data directory: {}", ctx.config_dir().display());
        match server_config.resolve_git_repo_path() {
            Some(repo) => println!("Git repository: {}", repo.display()),
            None => println!("Git repository: not configured"),
        }
    }
    println!("MCP endpoint: http://{}{}", addr, hermod_server::routes::MCP_PATH);

    Server::new(Arc::new(catalog)).run(addr).await?;
    Ok(())
}
