//! Support tickets kept in a flat JSON file.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolResult;
use crate::json_file::JsonListFile;

pub const DEFAULT_TICKETS_FILE: &str = "tickets.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub username: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub title: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Fields for a new ticket. A missing or blank date becomes today.
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub username: String,
    pub title: String,
    pub question: String,
    pub answer: Option<String>,
    pub date: Option<String>,
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn list(&self) -> ToolResult<Vec<Ticket>>;
    async fn create(&self, ticket: NewTicket) -> ToolResult<Ticket>;
}

/// Today's local date as `YYYY-MM-DD`.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

pub struct JsonTicketStore {
    file: JsonListFile<Ticket>,
}

impl JsonTicketStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonListFile::new(path),
        }
    }
}

#[async_trait]
impl TicketStore for JsonTicketStore {
    async fn list(&self) -> ToolResult<Vec<Ticket>> {
        self.file.load().await
    }

    async fn create(&self, ticket: NewTicket) -> ToolResult<Ticket> {
        let date = ticket
            .date
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(today);
        let ticket = Ticket {
            username: ticket.username,
            date,
            title: ticket.title,
            question: ticket.question,
            answer: ticket.answer,
        };
        self.file.push(ticket.clone()).await?;
        tracing::info!(path = %self.file.path().display(), title = %ticket.title, "created ticket");
        Ok(ticket)
    }
}

pub fn format_tickets(tickets: &[Ticket]) -> String {
    if tickets.is_empty() {
        return "No tickets found".to_string();
    }
    let entries: Vec<String> = tickets
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let mut entry = format!(
                "{}. [{}] {} (from {})\nQuestion: {}",
                i + 1,
                t.date,
                t.title,
                t.username,
                t.question
            );
            if let Some(answer) = &t.answer {
                entry.push_str(&format!("\nAnswer: {}", answer));
            }
            entry
        })
        .collect();
    format!("{} tickets:\n\n{}", tickets.len(), entries.join("\n\n"))
}
