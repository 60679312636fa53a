//! `SQLite`-backed store of named conversations.
//!
//! One row per conversation name; the body is the conversation's JSON
//! encoding, replaced wholesale on every write. Each operation is one
//! statement, atomic at single-entry granularity. Several handles may be
//! open against the same file; writers racing on the same name get
//! whatever serialization SQLite itself provides, nothing more.

use crate::conversation::Conversation;
use crate::error::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Named conversation store.
pub struct ConversationStore {
    conn: Mutex<Connection>,
}

impl ConversationStore {
    /// Open (or create) a store at the given database path. Parent
    /// directories are created as needed; an existing store keeps all of
    /// its entries.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;
        debug!(path = %db_path.display(), "opened conversation store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store, useful for tests and throwaway sessions.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS conversations (
                name  TEXT PRIMARY KEY,
                body  TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::Internal(format!("lock error: {e}")))
    }

    /// Store a conversation under `name`, replacing any previous entry.
    ///
    /// Empty conversations are never persisted: returns `Ok(false)` and
    /// leaves the store untouched.
    pub fn put(&self, name: &str, conversation: &Conversation) -> Result<bool> {
        if conversation.is_empty() {
            return Ok(false);
        }
        let body = conversation.to_json()?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO conversations (name, body) VALUES (?1, ?2)",
            params![name, body],
        )?;
        debug!(name, messages = conversation.len(), "stored conversation");
        Ok(true)
    }

    /// Fetch the conversation stored under `name`. A missing name is not an
    /// error; it resolves to a fresh empty conversation.
    pub fn get(&self, name: &str) -> Result<Conversation> {
        let conn = self.lock()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM conversations WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => {
                serde_json::from_str(&body).map_err(|source| Error::MalformedRecord {
                    name: name.to_string(),
                    source,
                })
            }
            None => Ok(Conversation::new()),
        }
    }

    /// Remove the entry for `name`. Removing an absent name is a no-op.
    pub fn delete(&self, name: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM conversations WHERE name = ?1",
            params![name],
        )?;
        Ok(())
    }

    /// Fetch and remove in one step, returning what was read.
    pub fn pop(&self, name: &str) -> Result<Conversation> {
        let conversation = self.get(name)?;
        self.delete(name)?;
        Ok(conversation)
    }

    /// All stored names, in storage order (not guaranteed sorted).
    pub fn names(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name FROM conversations")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<Vec<String>>>()
            .map_err(Error::from)
    }

    /// Full enumeration of `(name, conversation)` pairs, in storage order.
    pub fn items(&self) -> Result<Vec<(String, Conversation)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name, body FROM conversations")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (name, body) = row?;
            let conversation =
                serde_json::from_str(&body).map_err(|source| Error::MalformedRecord {
                    name: name.clone(),
                    source,
                })?;
            items.push((name, conversation));
        }
        Ok(items)
    }

    /// Copy every entry of `other` into this store, `other` winning on
    /// name collisions. Returns the number of entries written.
    pub fn merge(&self, other: &ConversationStore) -> Result<usize> {
        let mut written = 0;
        for (name, conversation) in other.items()? {
            if self.put(&name, &conversation)? {
                written += 1;
            }
        }
        Ok(written)
    }

    /// Number of stored conversations.
    pub fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// True when no conversations are stored.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, ConversationStore) {
        let tmp = TempDir::new().unwrap();
        let store = ConversationStore::open(&tmp.path().join("chats.db")).unwrap();
        (tmp, store)
    }

    fn sample(text: &str) -> Conversation {
        let mut c = Conversation::new();
        c.add_user(text);
        c.add_assistant("reply");
        c
    }

    #[test]
    fn put_then_get_round_trips() {
        let (_tmp, store) = temp_store();
        let original = sample("hello");

        assert!(store.put("greeting", &original).unwrap());
        let loaded = store.get("greeting").unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded.options, original.options);
    }

    #[test]
    fn empty_conversation_is_refused() {
        let (_tmp, store) = temp_store();
        assert!(!store.put("nothing", &Conversation::new()).unwrap());
        assert!(store.names().unwrap().is_empty());
    }

    #[test]
    fn conversation_with_only_log_entries_is_stored() {
        let (_tmp, store) = temp_store();
        let mut c = Conversation::new();
        c.exchange_log
            .push((serde_json::json!({}), serde_json::json!({})));
        assert!(store.put("log-only", &c).unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn second_put_replaces_wholesale() {
        let (_tmp, store) = temp_store();
        let mut first = sample("one");
        first
            .exchange_log
            .push((serde_json::json!({"a": 1}), serde_json::json!({})));
        store.put("chat", &first).unwrap();

        let second = sample("two");
        store.put("chat", &second).unwrap();

        let loaded = store.get("chat").unwrap();
        assert_eq!(loaded, second);
        // The old exchange log was not merged in.
        assert!(loaded.exchange_log.is_empty());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn missing_name_resolves_to_empty() {
        let (_tmp, store) = temp_store();
        let c = store.get("never-stored").unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn delete_missing_is_silent() {
        let (_tmp, store) = temp_store();
        store.delete("ghost").unwrap();
    }

    #[test]
    fn pop_returns_and_removes() {
        let (_tmp, store) = temp_store();
        store.put("chat", &sample("hi")).unwrap();

        let popped = store.pop("chat").unwrap();
        assert_eq!(popped.len(), 2);
        assert!(store.get("chat").unwrap().is_empty());
        assert!(store.pop("chat").unwrap().is_empty());
    }

    #[test]
    fn names_and_items_enumerate_everything() {
        let (_tmp, store) = temp_store();
        store.put("alpha", &sample("a")).unwrap();
        store.put("beta", &sample("b")).unwrap();

        let mut names = store.names().unwrap();
        names.sort();
        assert_eq!(names, vec!["alpha", "beta"]);

        let items = store.items().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|(_, c)| c.len() == 2));
    }

    #[test]
    fn merge_copies_entries_and_source_wins() {
        let a = ConversationStore::in_memory().unwrap();
        let b = ConversationStore::in_memory().unwrap();

        a.put("shared", &sample("from a")).unwrap();
        a.put("only-a", &sample("a")).unwrap();
        b.put("shared", &sample("from b")).unwrap();
        b.put("only-b", &sample("b")).unwrap();

        let written = a.merge(&b).unwrap();
        assert_eq!(written, 2);
        assert_eq!(a.len().unwrap(), 3);
        assert_eq!(
            a.get("shared").unwrap().messages[0].content,
            "from b"
        );
    }

    #[test]
    fn malformed_record_surfaces_as_error() {
        let (_tmp, store) = temp_store();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO conversations (name, body) VALUES ('bad', 'not json')",
                [],
            )
            .unwrap();
        }
        let err = store.get("bad").unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }

    #[test]
    fn reopen_preserves_entries() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("chats.db");

        {
            let store = ConversationStore::open(&db_path).unwrap();
            store.put("durable", &sample("kept")).unwrap();
        }
        {
            let store = ConversationStore::open(&db_path).unwrap();
            let loaded = store.get("durable").unwrap();
            assert_eq!(loaded.messages[0].content, "kept");
            assert_eq!(loaded.messages[1].role, Role::Assistant);
        }
    }

    #[test]
    fn open_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("state").join("deep").join("chats.db");
        let store = ConversationStore::open(&nested).unwrap();
        assert!(store.is_empty().unwrap());
        assert!(nested.exists());
    }
}
