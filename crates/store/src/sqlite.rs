//! SQLite-backed storage.
//!
//! Implements the history, project, and completion-cache traits on a
//! single database. All SQL lives in `sql/*.sql` files, loaded via
//! `include_str!`.

use crate::{
    CacheKey, Completion, CompletionStore, HistoryStore, ProjectSnapshot, ProjectStore, Turn,
};
use anyhow::{Context, Result};
use llm::{FinishReason, Role};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

const SQL_SCHEMA: &str = include_str!("../sql/schema.sql");
const SQL_APPEND_TURN: &str = include_str!("../sql/append_turn.sql");
const SQL_LIST_TURNS: &str = include_str!("../sql/list_turns.sql");
const SQL_CLEAR_TURNS: &str = include_str!("../sql/clear_turns.sql");
const SQL_LOOKUP_COMPLETION: &str = include_str!("../sql/lookup_completion.sql");
const SQL_STORE_COMPLETION: &str = include_str!("../sql/store_completion.sql");
const SQL_PURGE_COMPLETIONS: &str = include_str!("../sql/purge_completions.sql");
const SQL_SELECT_PROJECT: &str = include_str!("../sql/select_project.sql");
const SQL_UPSERT_PROJECT: &str = include_str!("../sql/upsert_project.sql");

/// Durable store backed by a single SQLite database.
///
/// Wraps a `rusqlite::Connection` in a `Mutex` for thread safety; every
/// statement runs at single-key granularity, no cross-store transaction
/// is needed by the gateway.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<()> {
        self.conn.lock().execute_batch(SQL_SCHEMA)?;
        Ok(())
    }
}

impl HistoryStore for SqliteStore {
    async fn append(&self, conversation: &str, turn: Turn) -> Result<()> {
        self.conn.lock().execute(
            SQL_APPEND_TURN,
            params![
                conversation,
                turn.role.as_str(),
                turn.content,
                turn.created_at as i64
            ],
        )?;
        Ok(())
    }

    async fn list(&self, conversation: &str) -> Result<Vec<Turn>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(SQL_LIST_TURNS)?;
        let rows = stmt.query_map([conversation], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut turns = Vec::new();
        for row in rows {
            let (role, content, created_at) = row?;
            turns.push(Turn {
                role: role.parse::<Role>().context("corrupt role column")?,
                content,
                created_at: created_at as u64,
            });
        }
        Ok(turns)
    }

    async fn clear(&self, conversation: &str) -> Result<()> {
        self.conn.lock().execute(SQL_CLEAR_TURNS, [conversation])?;
        Ok(())
    }
}

impl ProjectStore for SqliteStore {
    async fn get(&self, id: &str) -> Result<Option<ProjectSnapshot>> {
        let conn = self.conn.lock();
        let snapshot = conn
            .query_row(SQL_SELECT_PROJECT, [id], |row| {
                Ok(ProjectSnapshot {
                    name: row.get(0)?,
                    description: row.get(1)?,
                    status: row.get(2)?,
                })
            })
            .optional()?;
        Ok(snapshot)
    }

    async fn put(&self, id: &str, snapshot: &ProjectSnapshot) -> Result<()> {
        self.conn.lock().execute(
            SQL_UPSERT_PROJECT,
            params![id, snapshot.name, snapshot.description, snapshot.status],
        )?;
        Ok(())
    }
}

impl CompletionStore for SqliteStore {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<Completion>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                SQL_LOOKUP_COMPLETION,
                params![key.conversation.as_str(), key.text, key.model.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, reply, finish_reason, created)) = row else {
            return Ok(None);
        };
        Ok(Some(Completion {
            id,
            created: created as u64,
            reply,
            finish_reason: finish_reason
                .parse::<FinishReason>()
                .context("corrupt finish_reason column")?,
        }))
    }

    async fn store(&self, key: &CacheKey, completion: &Completion) -> Result<()> {
        self.conn.lock().execute(
            SQL_STORE_COMPLETION,
            params![
                key.conversation.as_str(),
                key.text,
                key.model.as_str(),
                completion.id,
                completion.reply,
                completion.finish_reason.as_str(),
                completion.created as i64
            ],
        )?;
        Ok(())
    }

    async fn purge(&self, conversation: &str) -> Result<()> {
        self.conn
            .lock()
            .execute(SQL_PURGE_COMPLETIONS, [conversation])?;
        Ok(())
    }
}
