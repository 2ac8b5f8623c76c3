//! Configuration types.
//!
//! ```toml
//! [llm]
//! provider = "openai"
//! model = "gpt-4o-mini"
//! # api_key falls back to OPENAI_API_KEY
//!
//! [agent]
//! system_prompt = "You are Hermod, a concise assistant."
//! max_iterations = 5
//!
//! [[mcp.servers]]
//! name = "remote"
//! url = "http://localhost:8080/mcp"
//!
//! [rag]
//! rerank = true
//!
//! [server]
//! port = 8080
//! git_repo_path = "/srv/repo"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Environment fallback for `llm.api_key`.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment fallback for `server.git_repo_path`.
pub const GIT_REPO_PATH_ENV: &str = "GIT_REPO_PATH";

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Top-level configuration. Every section is optional; a layer that sets a
/// section replaces that whole section from earlier layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HermodConfig {
    pub llm: Option<LlmConfig>,
    pub agent: Option<AgentSection>,
    pub mcp: Option<McpConfig>,
    pub rag: Option<RagConfig>,
    pub session: Option<SessionConfig>,
    pub server: Option<ServerConfig>,
}

impl HermodConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: HermodConfig) {
        if other.llm.is_some() {
            self.llm = other.llm;
        }
        if other.agent.is_some() {
            self.agent = other.agent;
        }
        if other.mcp.is_some() {
            self.mcp = other.mcp;
        }
        if other.rag.is_some() {
            self.rag = other.rag;
        }
        if other.session.is_some() {
            self.session = other.session;
        }
        if other.server.is_some() {
            self.server = other.server;
        }
    }

    pub fn llm(&self) -> LlmConfig {
        self.llm.clone().unwrap_or_default()
    }

    pub fn agent(&self) -> AgentSection {
        self.agent.clone().unwrap_or_default()
    }

    pub fn mcp(&self) -> McpConfig {
        self.mcp.clone().unwrap_or_default()
    }

    pub fn rag(&self) -> RagConfig {
        self.rag.clone().unwrap_or_default()
    }

    pub fn session(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }

    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM
// ─────────────────────────────────────────────────────────────────────────────

/// Which chat backend to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Any OpenAI-compatible `/chat/completions` endpoint.
    #[default]
    Openai,
    /// A local Ollama server.
    Ollama,
}

/// `[llm]` section. Unset values fall back to the backend's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Prefer the `OPENAI_API_KEY` environment variable over storing this.
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LlmConfig {
    /// The API key from config, else from `OPENAI_API_KEY`.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.to_string());
        }
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::missing(format!("llm.api_key (or {API_KEY_ENV})"))),
        }
    }

    pub fn has_plaintext_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────────────────────────────────────

/// `[agent]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    pub system_prompt: Option<String>,
    /// Iteration cap for interactive chat.
    pub max_iterations: u32,
    /// Iteration cap for one-shot `ask` runs.
    pub batch_max_iterations: u32,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            system_prompt: None,
            max_iterations: 5,
            batch_max_iterations: 20,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MCP
// ─────────────────────────────────────────────────────────────────────────────

/// `[mcp]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    /// Serve the built-in tool catalog in-process alongside remote servers.
    pub local_tools: bool,
    pub servers: Vec<McpServerEntry>,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            local_tools: true,
            servers: Vec::new(),
        }
    }
}

impl McpConfig {
    pub fn enabled_servers(&self) -> impl Iterator<Item = &McpServerEntry> {
        self.servers.iter().filter(|s| s.enabled)
    }
}

/// One `[[mcp.servers]]` entry: a remote MCP server over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerEntry {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Defaults to 30.
    pub timeout_secs: Option<u64>,
    /// Defaults to 3.
    pub retries: Option<u32>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl McpServerEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            timeout_secs: None,
            retries: None,
            enabled: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RAG
// ─────────────────────────────────────────────────────────────────────────────

/// `[rag]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub enabled: bool,
    pub rerank: bool,
    pub top_k: usize,
    pub top_n: usize,
    pub chunk_tokens: usize,
    pub overlap_tokens: usize,
    pub ollama_url: String,
    pub embedding_model: String,
    pub rerank_model: String,
    /// Defaults to `embeddings_cache.json` in the config directory.
    pub store_path: Option<PathBuf>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rerank: false,
            top_k: 20,
            top_n: 5,
            chunk_tokens: 50,
            overlap_tokens: 5,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            rerank_model: "llama3.2".to_string(),
            store_path: None,
        }
    }
}

impl RagConfig {
    pub fn store_path_in(&self, base: &Path) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| base.join("embeddings_cache.json"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session / Server
// ─────────────────────────────────────────────────────────────────────────────

/// `[session]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Defaults to `sessions/` in the config directory.
    pub cache_dir: Option<PathBuf>,
}

impl SessionConfig {
    pub fn cache_dir_in(&self, base: &Path) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| base.join("sessions"))
    }
}

/// `[server]` section: the MCP tool server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Falls back to `GIT_REPO_PATH`.
    pub git_repo_path: Option<PathBuf>,
    /// Defaults to `tickets.json` in the config directory.
    pub tickets_path: Option<PathBuf>,
    /// Defaults to `tasks.json` in the config directory.
    pub tasks_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            git_repo_path: None,
            tickets_path: None,
            tasks_path: None,
        }
    }
}

impl ServerConfig {
    /// Configured repository path, else `GIT_REPO_PATH`. `None` when neither is set.
    pub fn resolve_git_repo_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.git_repo_path {
            return Some(path.clone());
        }
        std::env::var(GIT_REPO_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }

    pub fn tickets_path_in(&self, base: &Path) -> PathBuf {
        self.tickets_path
            .clone()
            .unwrap_or_else(|| base.join("tickets.json"))
    }

    pub fn tasks_path_in(&self, base: &Path) -> PathBuf {
        self.tasks_path.clone().unwrap_or_else(|| base.join("tasks.json"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_empty_config_defaults() {
        let config = HermodConfig::from_toml("").unwrap();
        assert_eq!(config, HermodConfig::new());
        assert_eq!(config.agent().max_iterations, 5);
        assert_eq!(config.agent().batch_max_iterations, 20);
        assert_eq!(config.rag().top_k, 20);
        assert_eq!(config.rag().top_n, 5);
        assert_eq!(config.rag().chunk_tokens, 50);
        assert_eq!(config.rag().overlap_tokens, 5);
        assert_eq!(config.rag().embedding_model, "nomic-embed-text");
        assert_eq!(config.server().port, DEFAULT_PORT);
        assert!(config.mcp().local_tools);
    }

    #[test]
    fn test_full_config_parses() {
        let config = HermodConfig::from_toml(
            r#"
[llm]
provider = "ollama"
model = "llama3.2"
temperature = 0.3

[agent]
system_prompt = "Be brief."
max_iterations = 8

[[mcp.servers]]
name = "remote"
url = "http://localhost:9000/mcp"
headers = { Authorization = "Bearer t" }
retries = 1

[[mcp.servers]]
name = "off"
url = "http://localhost:9001/mcp"
enabled = false

[rag]
rerank = true
top_n = 3

[server]
port = 9090
git_repo_path = "/srv/repo"
"#,
        )
        .unwrap();

        assert_eq!(config.llm().provider, LlmProvider::Ollama);
        assert_eq!(config.llm().temperature, Some(0.3));
        assert_eq!(config.agent().max_iterations, 8);
        // unset fields in a present section keep their defaults
        assert_eq!(config.agent().batch_max_iterations, 20);

        let mcp = config.mcp();
        assert_eq!(mcp.servers.len(), 2);
        assert_eq!(mcp.servers[0].headers["Authorization"], "Bearer t");
        assert_eq!(mcp.servers[0].retries, Some(1));
        let enabled: Vec<_> = mcp.enabled_servers().map(|s| s.name.as_str()).collect();
        assert_eq!(enabled, ["remote"]);

        assert!(config.rag().rerank);
        assert_eq!(config.rag().top_n, 3);
        assert_eq!(config.rag().top_k, 20);
        assert_eq!(config.server().port, 9090);
        assert_eq!(config.server().bind, DEFAULT_BIND);
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(HermodConfig::from_toml("[nonsense]\nx = 1\n").is_err());
    }

    #[test]
    fn test_merge_replaces_sections() {
        let mut base = HermodConfig::from_toml("[server]\nport = 1\n[rag]\ntop_k = 7\n").unwrap();
        base.merge(HermodConfig::from_toml("[server]\nport = 2\n").unwrap());
        assert_eq!(base.server().port, 2);
        assert_eq!(base.rag().top_k, 7);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = HermodConfig::from_toml("[agent]\nmax_iterations = 9\n").unwrap();
        let again = HermodConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, again);
    }

    #[test]
    fn test_default_paths() {
        let base = Path::new("/var/lib/hermod");
        let config = HermodConfig::new();
        assert_eq!(config.rag().store_path_in(base), base.join("embeddings_cache.json"));
        assert_eq!(config.session().cache_dir_in(base), base.join("sessions"));
        assert_eq!(config.server().tickets_path_in(base), base.join("tickets.json"));
        assert_eq!(config.server().tasks_path_in(base), base.join("tasks.json"));
    }

    #[test]
    #[serial]
    fn test_api_key_resolution() {
        unsafe { std::env::remove_var(API_KEY_ENV) };
        let err = LlmConfig::default().resolve_api_key().unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
        assert!(err.to_string().contains("llm.api_key (or OPENAI_API_KEY)"));

        unsafe { std::env::set_var(API_KEY_ENV, "from-env") };
        assert_eq!(LlmConfig::default().resolve_api_key().unwrap(), "from-env");

        let explicit = LlmConfig {
            api_key: Some("from-file".to_string()),
            ..Default::default()
        };
        assert_eq!(explicit.resolve_api_key().unwrap(), "from-file");
        assert!(explicit.has_plaintext_api_key());
        unsafe { std::env::remove_var(API_KEY_ENV) };
    }

    #[test]
    #[serial]
    fn test_git_repo_path_resolution() {
        unsafe { std::env::remove_var(GIT_REPO_PATH_ENV) };
        assert_eq!(ServerConfig::default().resolve_git_repo_path(), None);

        unsafe { std::env::set_var(GIT_REPO_PATH_ENV, "/env/repo") };
        assert_eq!(
            ServerConfig::default().resolve_git_repo_path(),
            Some(PathBuf::from("/env/repo"))
        );

        let configured = ServerConfig {
            git_repo_path: Some(PathBuf::from("/cfg/repo")),
            ..Default::default()
        };
        assert_eq!(configured.resolve_git_repo_path(), Some(PathBuf::from("/cfg/repo")));
        unsafe { std::env::remove_var(GIT_REPO_PATH_ENV) };
    }
}
