//! CLI command handlers.

pub mod ask;
pub mod chat;
pub mod ingest;
pub mod repl;
pub mod reset;
pub mod serve;
pub mod tools;

use std::path::{Path, PathBuf};

use anyhow::Result;
use hermod_config::{HermodConfig, LoadedConfig};

/// Session used when `--session` is not given.
pub const DEFAULT_SESSION: &str = "default";

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Layered configuration (user file, then `./hermod.toml`).
    pub loaded: LoadedConfig,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Load configuration from `config_dir` and the working directory.
    pub fn load(config_dir: PathBuf, verbose: bool) -> Result<Self> {
        let loaded = hermod_config::load_config_with_options(None, Some(&config_dir))?;

        for warning in &loaded.warnings {
            eprintln!("warning: {}", warning);
        }
        for source in loaded.loaded_from() {
            tracing::debug!(path = %source.display(), "loaded config");
        }

        Ok(Self { loaded, verbose })
    }

    pub fn config(&self) -> &HermodConfig {
        &self.loaded.config
    }

    /// Base directory for logs, sessions and data files.
    pub fn config_dir(&self) -> &Path {
        &self.loaded.config_dir
    }
}

/// The session id to use, falling back to [`DEFAULT_SESSION`].
pub fn session_or_default(session: Option<String>) -> String {
    session
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION.to_string())
}
