//! Conversation persistence for Hermod.
//!
//! A [`ConversationCache`] holds one session's ordered messages and is
//! rewritten in full after every completed turn. A [`ConversationStore`]
//! hands out the cache for a given session id.
//!
//! # Example
//!
//! ```rust,ignore
//! use hermod_session::{ConversationStore, FileConversationStore};
//!
//! let store = FileConversationStore::new("/var/lib/hermod/sessions");
//! let cache = store.open("default");
//! let history = cache.messages().await;
//! ```

mod cache;
mod error;
mod store;

pub use cache::{ConversationCache, FileConversationCache, MemoryConversationCache};
pub use error::{Result, SessionError};
pub use store::{
    ConversationStore, FileConversationStore, MemoryConversationStore, SharedConversationStore,
};
