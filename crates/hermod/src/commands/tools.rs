//! Tools command - discover and print the aggregated catalog.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::Context;
use crate::bootstrap;

/// Arguments for the tools command.
#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Print each tool's input schema
    #[arg(long)]
    pub schema: bool,
}

/// Run the tools command.
pub async fn run(args: ToolsArgs, ctx: &Context) -> Result<()> {
    let orchestrator = bootstrap::create_orchestrator(ctx.config(), ctx.config_dir())?;
    let count = orchestrator.discover_tools().await;
    let dim = Style::new().dim();

    if count == 0 {
        println!("{}", dim.apply_to("No tools available"));
        return Ok(());
    }

    let mut tools = orchestrator.tools();
    tools.sort_by(|a, b| a.name.cmp(&b.name));

    println!("{}", style(format!("{} tools", count)).bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    for tool in &tools {
        let provider = orchestrator.provider_for(&tool.name).unwrap_or_default();
        println!(
            "  {} {}",
            style(&tool.name).cyan(),
            dim.apply_to(format!("({})", provider))
        );
        if let Some(ref description) = tool.description {
            println!("      {}", description);
        }
        if args.schema
            && let Some(ref schema) = tool.input_schema
        {
            println!("      {}", dim.apply_to(schema.to_string()));
        }
    }
    Ok(())
}
