//! Durable conversation history, backed by SQLite.
//!
//! Persistence is best-effort from the orchestrator's point of view: a
//! history failure is logged and never fails the request. Conversations are
//! keyed by the same string id the memory layer uses.

use mizan_core::{EngineError, EngineResult, Role};
use mizan_retrieval::Chunk;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Summary row for a stored conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    #[serde(rename = "messageCount")]
    pub message_count: i64,
}

/// One persisted message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: String,
    pub content: String,
    /// Chunks that backed an assistant message, empty otherwise
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Chunk>,
    pub timestamp: String,
}

/// SQLite-backed conversation store.
pub struct ConversationHistory {
    conn: Mutex<Connection>,
}

impl ConversationHistory {
    /// Open (or create) the history database at `path`.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::from_connection(conn)
    }

    /// In-memory database, used in tests.
    pub fn open_in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> EngineResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS conversations (
                id            TEXT PRIMARY KEY,
                title         TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL,
                message_count INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                role            TEXT NOT NULL,
                content         TEXT NOT NULL,
                sources         TEXT,
                timestamp       TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_conversations_updated
                ON conversations(updated_at DESC);
            CREATE INDEX IF NOT EXISTS idx_messages_conversation
                ON messages(conversation_id, timestamp);",
        )
        .map_err(db_err)?;

        debug!("conversation history database ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert the conversation row if it does not exist yet. The title is
    /// derived from the first user message.
    pub fn ensure_conversation(&self, id: &str, first_message: &str) -> EngineResult<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let now = now_iso();
        conn.execute(
            "INSERT OR IGNORE INTO conversations (id, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![id, derive_title(first_message), now],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Append one message, bumping the conversation's counters.
    pub fn add_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
        sources: &[Chunk],
    ) -> EngineResult<()> {
        let sources_json = serde_json::to_string(sources)?;
        let now = now_iso();

        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO messages (conversation_id, role, content, sources, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![conversation_id, role.as_str(), content, sources_json, now],
        )
        .map_err(db_err)?;
        conn.execute(
            "UPDATE conversations
             SET updated_at = ?1, message_count = message_count + 1
             WHERE id = ?2",
            params![now, conversation_id],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// All messages of a conversation in chronological order, or `None` when
    /// the conversation is unknown.
    pub fn messages(&self, conversation_id: &str) -> EngineResult<Option<Vec<StoredMessage>>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());

        let exists: Option<String> = conn
            .query_row(
                "SELECT id FROM conversations WHERE id = ?1",
                params![conversation_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        if exists.is_none() {
            return Ok(None);
        }

        let mut stmt = conn
            .prepare(
                "SELECT role, content, sources, timestamp
                 FROM messages WHERE conversation_id = ?1
                 ORDER BY timestamp ASC, id ASC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![conversation_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(db_err)?;

        let mut messages = Vec::new();
        for row in rows {
            let (role, content, sources, timestamp) = row.map_err(db_err)?;
            let sources = sources
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?
                .unwrap_or_default();
            messages.push(StoredMessage {
                role,
                content,
                sources,
                timestamp,
            });
        }
        Ok(Some(messages))
    }

    /// Conversation summaries, most recently updated first.
    pub fn list(&self, limit: usize, offset: usize) -> EngineResult<Vec<ConversationSummary>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn
            .prepare(
                "SELECT id, title, created_at, updated_at, message_count
                 FROM conversations
                 ORDER BY updated_at DESC
                 LIMIT ?1 OFFSET ?2",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], |row| {
                Ok(ConversationSummary {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                    message_count: row.get(4)?,
                })
            })
            .map_err(db_err)?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row.map_err(db_err)?);
        }
        Ok(summaries)
    }

    /// Delete a conversation and its messages. Returns whether it existed.
    pub fn delete(&self, conversation_id: &str) -> EngineResult<bool> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "DELETE FROM messages WHERE conversation_id = ?1",
            params![conversation_id],
        )
        .map_err(db_err)?;
        let deleted = conn
            .execute(
                "DELETE FROM conversations WHERE id = ?1",
                params![conversation_id],
            )
            .map_err(db_err)?;
        Ok(deleted > 0)
    }
}

fn db_err(err: rusqlite::Error) -> EngineError {
    EngineError::History(err.to_string())
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// First line of the message, clipped to 80 characters.
fn derive_title(message: &str) -> String {
    let first_line = message.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return "Untitled conversation".to_string();
    }
    first_line.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunk() -> Chunk {
        Chunk {
            id: "c1".to_string(),
            text: "text".to_string(),
            page: 4,
            source_file: "standards.pdf".to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn test_round_trip() {
        let history = ConversationHistory::open_in_memory().unwrap();
        history.ensure_conversation("conv-1", "What is Riba?").unwrap();
        history
            .add_message("conv-1", Role::User, "What is Riba?", &[])
            .unwrap();
        history
            .add_message("conv-1", Role::Assistant, "Riba is interest.", &[sample_chunk()])
            .unwrap();

        let messages = history.messages("conv-1").unwrap().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "What is Riba?");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[1].sources.len(), 1);
        assert_eq!(messages[1].sources[0].page, 4);
    }

    #[test]
    fn test_unknown_conversation_is_none() {
        let history = ConversationHistory::open_in_memory().unwrap();
        assert!(history.messages("missing").unwrap().is_none());
    }

    #[test]
    fn test_ensure_conversation_is_idempotent() {
        let history = ConversationHistory::open_in_memory().unwrap();
        history.ensure_conversation("conv-1", "first").unwrap();
        history.ensure_conversation("conv-1", "second").unwrap();

        let listed = history.list(10, 0).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "first");
    }

    #[test]
    fn test_list_orders_by_update() {
        let history = ConversationHistory::open_in_memory().unwrap();
        history.ensure_conversation("a", "question a").unwrap();
        history.ensure_conversation("b", "question b").unwrap();
        // Touch "a" so it becomes the most recently updated
        history.add_message("a", Role::User, "more", &[]).unwrap();

        let listed = history.list(10, 0).unwrap();
        assert_eq!(listed[0].id, "a");
        assert_eq!(listed[0].message_count, 1);
    }

    #[test]
    fn test_delete() {
        let history = ConversationHistory::open_in_memory().unwrap();
        history.ensure_conversation("conv-1", "hello").unwrap();
        history.add_message("conv-1", Role::User, "hello", &[]).unwrap();

        assert!(history.delete("conv-1").unwrap());
        assert!(history.messages("conv-1").unwrap().is_none());
        assert!(!history.delete("conv-1").unwrap());
    }

    #[test]
    fn test_title_derivation() {
        assert_eq!(derive_title("What is Murabaha?\nmore"), "What is Murabaha?");
        assert_eq!(derive_title("   "), "Untitled conversation");
        let long = "x".repeat(200);
        assert_eq!(derive_title(&long).chars().count(), 80);
    }
}
