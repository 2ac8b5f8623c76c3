//! Retrieval-augmented context for Hermod.
//!
//! Documents are split into overlapping word windows, embedded, normalized
//! and kept in an [`EmbeddingStore`]. At query time the [`Retriever`] ranks
//! every stored chunk by cosine similarity, optionally asks a [`Reranker`] to
//! re-score the best candidates, and renders the survivors as a prompt
//! section.
//!
//! ```text
//!   ingest                              retrieve
//!   ──────                              ────────
//!   text ──► Chunker ──► Embedder       query ──► Embedder ──► normalize
//!                          │                                     │
//!                      normalize                          cosine vs. store
//!                          │                                     │
//!                          ▼                               top-K ─► Reranker?
//!                    EmbeddingStore ◄────────────────────        │
//!                                                          top-N ─► context
//! ```

pub mod chunk;
pub mod error;
pub mod ingest;
pub mod rerank;
pub mod retriever;
pub mod store;
pub mod vector;

pub use chunk::{Chunker, DEFAULT_CHUNK_TOKENS, DEFAULT_OVERLAP_TOKENS, TextChunk, estimate_tokens};
pub use error::{RagError, Result};
pub use ingest::Ingestor;
pub use rerank::{
    DEFAULT_RERANK_MODEL, LlmReranker, NEUTRAL_SCORE, Reranker, SharedReranker, parse_score,
};
pub use retriever::{DEFAULT_TOP_K, DEFAULT_TOP_N, RetrievedChunk, Retriever, format_context};
pub use store::{
    DEFAULT_STORE_FILE, DocumentEmbeddings, DocumentMetadata, EmbeddedChunk, EmbeddingStore,
    FileEmbeddingStore, MemoryEmbeddingStore,
};
pub use vector::{cosine_similarity, normalize, normalize_l2};
