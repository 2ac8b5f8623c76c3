//! Configuration system for Hermod.
//!
//! TOML configuration with layered discovery (user config, then
//! project-local `hermod.toml`, then CLI flags applied by the binary) and
//! environment fallbacks for secrets and paths.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    CONFIG_DIR_ENV, ConfigSource, LoadedConfig, load_config, load_config_file,
    load_config_with_options, save_config, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
