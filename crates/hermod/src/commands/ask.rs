//! Ask command - one-shot question to the agent.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::{Context, session_or_default};
use crate::bootstrap::{self, Mode};

/// Arguments for the ask command.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question or prompt to send
    #[arg(required = true)]
    pub prompt: String,

    /// Continue an existing session
    #[arg(short, long)]
    pub session: Option<String>,
}

/// Run the ask command.
pub async fn run(args: AskArgs, ctx: &Context) -> Result<()> {
    let agent = bootstrap::build_agent(ctx, Mode::Batch)?;
    let session_id = session_or_default(args.session);
    let dim = Style::new().dim();

    if ctx.verbose {
        println!("{}", dim.apply_to(format!("Session: {}", session_id)));
        println!();
    }

    let response = match agent.turn(&session_id, &args.prompt).await {
        Ok(response) => response,
        Err(e) => {
            let red = Style::new().red();
            eprintln!("{} {}", red.apply_to("Error:"), e);
            return Err(e.into());
        }
    };

    if ctx.verbose {
        for call in &response.tool_calls {
            let status = if call.success { "done" } else { "failed" };
            println!("{}", dim.apply_to(format!("[{}: {}]", call.name, status)));
        }
    }

    println!("{}", response.text);

    if response.truncated {
        eprintln!(
            "{}",
            Style::new()
                .yellow()
                .apply_to("(stopped after the iteration limit; the answer may be incomplete)")
        );
    }

    if ctx.verbose {
        println!();
        println!(
            "{}",
            dim.apply_to(format!(
                "{} model calls, {} tool calls, {} tokens, {} ms",
                response.iterations,
                response.tool_calls.len(),
                response.usage.total_tokens,
                response.duration_ms()
            ))
        );
    }

    Ok(())
}
