//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The rest of the core goes through `PersistenceProvider`; `SqliteSaves`
//! adapts a `SaveStore` slot to that trait.

use crate::{
    error::{GameError, GameResult},
    persistence::PersistenceProvider,
    snapshot::SaveHeader,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Rows kept per slot; older ones are pruned after each write.
pub const KEEP_ROWS_PER_SLOT: i64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SaveRow {
    pub id:       String,
    pub slot:     String,
    pub version:  String,
    pub payload:  String,
    pub saved_at: i64,
    pub seq:      i64,
}

pub struct SaveStore {
    conn: Mutex<Connection>,
}

impl SaveStore {
    /// Open (or create) the save database at `path`.
    pub fn open(path: &str) -> GameResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: the autosave writer never blocks readers.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GameResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GameResult<()> {
        self.lock()?.execute_batch(include_str!("../migrations/001_saves.sql"))?;
        Ok(())
    }

    fn lock(&self) -> GameResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| GameError::Persistence("save database lock poisoned".into()))
    }

    // ── Saves ──────────────────────────────────────────────────

    /// Insert a new row for `slot` and prune old ones. Returns the row id.
    pub fn write_save(&self, slot: &str, version: &str, payload: &str, saved_at: i64) -> GameResult<String> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM saves WHERE slot = ?1",
            params![slot],
            |row| row.get(0),
        )?;
        let id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO saves (id, slot, version, payload, saved_at, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, slot, version, payload, saved_at, seq],
        )?;
        tx.execute(
            "DELETE FROM saves WHERE slot = ?1 AND seq <= ?2",
            params![slot, seq - KEEP_ROWS_PER_SLOT],
        )?;
        tx.commit()?;
        Ok(id)
    }

    pub fn latest_save(&self, slot: &str) -> GameResult<Option<SaveRow>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, slot, version, payload, saved_at, seq
                 FROM saves WHERE slot = ?1
                 ORDER BY seq DESC LIMIT 1",
                params![slot],
                |row| {
                    Ok(SaveRow {
                        id:       row.get(0)?,
                        slot:     row.get(1)?,
                        version:  row.get(2)?,
                        payload:  row.get(3)?,
                        saved_at: row.get(4)?,
                        seq:      row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn save_count(&self, slot: &str) -> GameResult<i64> {
        let conn = self.lock()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM saves WHERE slot = ?1",
            params![slot],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Distinct slot names, alphabetical.
    pub fn slots(&self) -> GameResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT slot FROM saves ORDER BY slot ASC")?;
        let slots = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(slots)
    }
}

/// One named slot of a `SaveStore`, usable as the loop's provider.
#[derive(Clone)]
pub struct SqliteSaves {
    store: Arc<SaveStore>,
    slot:  String,
}

impl SqliteSaves {
    pub fn new(store: Arc<SaveStore>, slot: impl Into<String>) -> Self {
        Self { store, slot: slot.into() }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }
}

impl PersistenceProvider for SqliteSaves {
    fn load(&self) -> GameResult<Option<String>> {
        Ok(self.store.latest_save(&self.slot)?.map(|row| row.payload))
    }

    fn save(&self, payload: &str) -> GameResult<()> {
        let header = SaveHeader::peek(payload);
        let id = self.store.write_save(&self.slot, &header.version, payload, header.last_saved_timestamp)?;
        log::debug!("store: slot {} saved as {id}", self.slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<SaveStore> {
        let store = SaveStore::in_memory().unwrap();
        store.migrate().unwrap();
        Arc::new(store)
    }

    #[test]
    fn file_store_opens_in_wal_mode() {
        let path = std::env::temp_dir().join(format!("beat-idle-{}.db", Uuid::new_v4()));
        let path_str = path.to_string_lossy().to_string();
        {
            let store = SaveStore::open(&path_str).unwrap();
            store.migrate().unwrap();
            let mode: String = store
                .conn
                .lock()
                .unwrap()
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap();
            assert_eq!(mode, "wal");
            store.write_save("main", "3.0.0", "{}", 1).unwrap();
            assert_eq!(store.save_count("main").unwrap(), 1);
        }
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{path_str}{suffix}"));
        }
    }

    #[test]
    fn missing_directory_is_an_error() {
        let path = std::env::temp_dir().join(format!("beat-idle-missing-{}", Uuid::new_v4())).join("saves.db");
        assert!(matches!(SaveStore::open(&path.to_string_lossy()), Err(GameError::Database(_))));
    }

    #[test]
    fn empty_slot_loads_none() {
        let saves = SqliteSaves::new(store(), "main");
        assert_eq!(saves.load().unwrap(), None);
    }

    #[test]
    fn latest_write_wins() {
        let store = store();
        let saves = SqliteSaves::new(Arc::clone(&store), "main");
        saves.save(r#"{"version":"3.0.0","lastSavedTimestamp":1}"#).unwrap();
        saves.save(r#"{"version":"3.0.0","lastSavedTimestamp":2}"#).unwrap();
        let row = store.latest_save("main").unwrap().unwrap();
        assert_eq!(row.saved_at, 2);
        assert_eq!(row.version, "3.0.0");
        assert_eq!(row.seq, 2);
        assert!(Uuid::parse_str(&row.id).is_ok());
    }

    #[test]
    fn slots_are_isolated_and_pruned() {
        let store = store();
        let a = SqliteSaves::new(Arc::clone(&store), "a");
        let b = SqliteSaves::new(Arc::clone(&store), "b");
        for i in 0..8 {
            a.save(&format!(r#"{{"lastSavedTimestamp":{i}}}"#)).unwrap();
        }
        b.save("not json at all").unwrap();
        assert_eq!(store.save_count("a").unwrap(), KEEP_ROWS_PER_SLOT);
        assert_eq!(store.save_count("b").unwrap(), 1);
        assert_eq!(b.load().unwrap().as_deref(), Some("not json at all"));
        assert_eq!(store.slots().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }
}
