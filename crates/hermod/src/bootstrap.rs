//! Builds runtime components from configuration.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use hermod_agent::{Agent, AgentConfig};
use hermod_config::{AgentSection, HermodConfig, LlmConfig, LlmProvider, McpServerEntry, RagConfig};
use hermod_llm::{
    OllamaBackend, OllamaConfig, OllamaEmbedder, OllamaEmbedderConfig, OpenAiBackend,
    OpenAiConfig, SharedBackend, SharedEmbedder,
};
use hermod_mcp::{LocalProvider, McpClient, McpOrchestrator, McpServerConfig, SharedProvider};
use hermod_rag::{Chunker, EmbeddingStore, FileEmbeddingStore, Ingestor, LlmReranker, Retriever};
use hermod_server::ToolCatalog;
use hermod_session::FileConversationStore;

use crate::commands::Context;

/// Provider id of the in-process tool catalog.
pub const LOCAL_PROVIDER: &str = "local";

/// How the agent will be driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    Batch,
}

// ─────────────────────────────────────────────────────────────────────────────
// Model backend
// ─────────────────────────────────────────────────────────────────────────────

/// Create the chat backend named by `[llm]`.
///
/// An OpenAI-compatible endpoint needs an API key unless `base_url` points
/// somewhere else (local gateways usually take none).
pub fn create_backend(llm: &LlmConfig) -> Result<SharedBackend> {
    match llm.provider {
        LlmProvider::Openai => {
            let mut config = OpenAiConfig::default();
            match llm.resolve_api_key() {
                Ok(key) => config = config.with_api_key(key),
                Err(e) if llm.base_url.is_none() => return Err(e.into()),
                Err(_) => config.api_key = None,
            }
            if let Some(ref base_url) = llm.base_url {
                config = config.with_base_url(base_url);
            }
            if let Some(ref model) = llm.model {
                config = config.with_model(model);
            }
            if let Some(secs) = llm.timeout_secs {
                config = config.with_timeout(Duration::from_secs(secs));
            }
            if let Some(retries) = llm.max_retries {
                config = config.with_max_retries(retries);
            }
            Ok(Arc::new(OpenAiBackend::new(config)?))
        }
        LlmProvider::Ollama => {
            let mut config = OllamaConfig::default();
            if let Some(ref base_url) = llm.base_url {
                config = config.with_base_url(base_url);
            }
            if let Some(ref model) = llm.model {
                config = config.with_model(model);
            }
            if let Some(secs) = llm.timeout_secs {
                config = config.with_timeout(Duration::from_secs(secs));
            }
            Ok(Arc::new(OllamaBackend::new(config)?))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tools
// ─────────────────────────────────────────────────────────────────────────────

pub fn server_config(entry: &McpServerEntry) -> McpServerConfig {
    let mut config = McpServerConfig::new(&entry.name, &entry.url);
    for (key, value) in &entry.headers {
        config = config.with_header(key, value);
    }
    if let Some(secs) = entry.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(retries) = entry.retries {
        config = config.with_retries(retries);
    }
    config
}

/// Create the orchestrator over the local catalog and every enabled server.
///
/// Tools are not discovered here; the first agent turn (or `hermod tools`)
/// does that.
pub fn create_orchestrator(config: &HermodConfig, data_dir: &Path) -> Result<Arc<McpOrchestrator>> {
    let mcp = config.mcp();
    let mut providers: Vec<SharedProvider> = Vec::new();

    if mcp.local_tools {
        let catalog = ToolCatalog::from_config(&config.server(), data_dir)?;
        providers.push(Arc::new(LocalProvider::new(LOCAL_PROVIDER, Arc::new(catalog))));
    }

    for entry in mcp.enabled_servers() {
        let client = McpClient::connect(server_config(entry))?;
        tracing::debug!(server = %entry.name, url = %entry.url, "configured MCP server");
        providers.push(Arc::new(client));
    }

    if providers.is_empty() {
        tracing::warn!("no tool providers configured");
    }

    Ok(Arc::new(McpOrchestrator::new(providers)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Retrieval
// ─────────────────────────────────────────────────────────────────────────────

pub fn create_embedder(rag: &RagConfig) -> Result<SharedEmbedder> {
    let config = OllamaEmbedderConfig::default()
        .with_base_url(&rag.ollama_url)
        .with_model(&rag.embedding_model);
    Ok(Arc::new(OllamaEmbedder::new(config)?))
}

pub fn create_store(rag: &RagConfig, data_dir: &Path) -> Arc<dyn EmbeddingStore> {
    Arc::new(FileEmbeddingStore::new(rag.store_path_in(data_dir)))
}

/// `None` when `[rag] enabled = false`.
pub fn create_retriever(rag: &RagConfig, data_dir: &Path) -> Result<Option<Arc<Retriever>>> {
    if !rag.enabled {
        return Ok(None);
    }

    let mut retriever = Retriever::new(create_embedder(rag)?, create_store(rag, data_dir))
        .with_top_k(rag.top_k)
        .with_top_n(rag.top_n);

    if rag.rerank {
        let scorer = OllamaBackend::new(
            OllamaConfig::default()
                .with_base_url(&rag.ollama_url)
                .with_model(&rag.rerank_model),
        )?;
        let reranker = LlmReranker::new(Arc::new(scorer)).with_model(&rag.rerank_model);
        retriever = retriever.with_reranker(Arc::new(reranker));
    }

    Ok(Some(Arc::new(retriever)))
}

pub fn create_ingestor(rag: &RagConfig, data_dir: &Path) -> Result<Ingestor> {
    Ok(
        Ingestor::new(create_embedder(rag)?, create_store(rag, data_dir))
            .with_chunker(Chunker::new(rag.chunk_tokens, rag.overlap_tokens)),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────────────────────────────────────

pub fn agent_config(section: &AgentSection, llm: &LlmConfig, mode: Mode) -> AgentConfig {
    let mut config = match mode {
        Mode::Interactive => {
            AgentConfig::interactive().with_max_iterations(section.max_iterations)
        }
        Mode::Batch => AgentConfig::batch().with_max_iterations(section.batch_max_iterations),
    };
    if let Some(ref prompt) = section.system_prompt {
        config = config.with_system_prompt(prompt);
    }
    if let Some(temperature) = llm.temperature {
        config = config.with_temperature(temperature);
    }
    if let Some(max_tokens) = llm.max_tokens {
        config = config.with_max_tokens(max_tokens);
    }
    config
}

/// Wire backend, tools, conversations and retrieval into an agent.
pub fn build_agent(ctx: &Context, mode: Mode) -> Result<Agent> {
    let config = ctx.config();
    let data_dir = ctx.config_dir();
    let llm = config.llm();

    let mut builder = Agent::builder()
        .with_backend(create_backend(&llm)?)
        .with_orchestrator(create_orchestrator(config, data_dir)?)
        .with_conversations(Arc::new(FileConversationStore::new(
            config.session().cache_dir_in(data_dir),
        )))
        .with_config(agent_config(&config.agent(), &llm, mode));

    if let Some(retriever) = create_retriever(&config.rag(), data_dir)? {
        builder = builder.with_retriever(retriever);
    }

    Ok(builder.build()?)
}
