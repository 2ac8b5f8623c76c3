//! Reset command - clear a stored conversation.

use anyhow::Result;
use clap::Args;
use hermod_session::{ConversationStore, FileConversationStore};

use super::{Context, session_or_default};

/// Arguments for the reset command.
#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Session to clear (default: "default")
    #[arg(short, long)]
    pub session: Option<String>,
}

/// Run the reset command.
pub async fn run(args: ResetArgs, ctx: &Context) -> Result<()> {
    let session_id = session_or_default(args.session);
    let store = FileConversationStore::new(ctx.config().session().cache_dir_in(ctx.config_dir()));

    store.open(&session_id).clear().await?;
    tracing::info!(%session_id, "conversation cleared");
    println!("Cleared session '{}'", session_id);
    Ok(())
}
