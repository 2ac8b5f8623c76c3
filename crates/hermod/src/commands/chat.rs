//! Chat command - interactive REPL mode.

use anyhow::Result;
use clap::Args;

use super::repl::Repl;
use super::{Context, session_or_default};
use crate::bootstrap::{self, Mode};

/// Arguments for the chat command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Resume an existing session
    #[arg(short, long)]
    pub session: Option<String>,
}

/// Run the chat command (REPL).
pub async fn run(args: ChatArgs, ctx: &Context) -> Result<()> {
    let agent = bootstrap::build_agent(ctx, Mode::Interactive)?;
    let mut repl = Repl::new(agent, session_or_default(args.session), ctx.verbose)?;
    repl.run().await
}
