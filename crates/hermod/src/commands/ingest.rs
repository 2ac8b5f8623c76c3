//! Ingest command - index a document for retrieval.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use console::Style;

use super::Context;
use crate::bootstrap;

/// Arguments for the ingest command.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// UTF-8 text file to index
    pub file: PathBuf,
}

/// Run the ingest command.
pub async fn run(args: IngestArgs, ctx: &Context) -> Result<()> {
    let rag = ctx.config().rag();
    if !rag.enabled {
        eprintln!("warning: [rag] is disabled; the document is indexed but not used in chat");
    }

    let ingestor = bootstrap::create_ingestor(&rag, ctx.config_dir())?;
    let record = ingestor
        .ingest_file(&args.file)
        .await
        .with_context(|| format!("failed to ingest {}", args.file.display()))?;

    let green = Style::new().green();
    println!(
        "{} {} ({} chunks of ~{} tokens)",
        green.apply_to("Indexed"),
        record.metadata.file_name,
        record.metadata.total_chunks,
        record.metadata.tokens_per_chunk
    );
    if ctx.verbose {
        let dim = Style::new().dim();
        println!(
            "{}",
            dim.apply_to(format!(
                "Store: {}",
                rag.store_path_in(ctx.config_dir()).display()
            ))
        );
    }
    Ok(())
}
