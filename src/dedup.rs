//! Durable dedup store for already-processed phrases.
//!
//! Backed by SQLite in WAL mode. Inserts accumulate in a memory batch that is
//! flushed in one transaction; a crash loses at most one unflushed batch.
//! Lookups always hit the durable table (plus the pending batch), never the
//! batch alone, so concurrent workers converge once a flush lands.

use crate::error::Result;
use rusqlite::{params, Connection};
use std::path::Path;

/// Default number of buffered inserts before a flush
pub const DEFAULT_BATCH_SIZE: usize = 1000;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS phrases (
        phrase TEXT PRIMARY KEY,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_phrases_created ON phrases(created_at);
";

/// Persistent set of phrases already processed
pub struct DedupStore {
    conn: Connection,
    buffer: Vec<String>,
    batch_size: usize,
}

impl DedupStore {
    /// Open (or create) the store file
    pub fn open(path: &Path, batch_size: usize) -> Result<Self> {
        Self::init(Connection::open(path)?, batch_size)
    }

    /// Ephemeral in-memory store (tests, `--memory-db`)
    pub fn open_in_memory(batch_size: usize) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, batch_size)
    }

    fn init(conn: Connection, batch_size: usize) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            buffer: Vec::new(),
            batch_size: batch_size.max(1),
        })
    }

    /// Point query against the durable table plus the pending batch
    pub fn seen(&self, phrase: &str) -> Result<bool> {
        if self.buffer.iter().any(|p| p == phrase) {
            return Ok(true);
        }
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM phrases WHERE phrase = ?1)",
            params![phrase],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    /// Buffer a phrase for insertion; flushes when the batch fills up
    pub fn record(&mut self, phrase: &str) -> Result<()> {
        self.buffer.push(phrase.to_string());
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Write the pending batch in one transaction
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let now = chrono::Utc::now().timestamp();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO phrases (phrase, created_at) VALUES (?1, ?2)",
            )?;
            for phrase in &self.buffer {
                stmt.execute(params![phrase, now])?;
            }
        }
        tx.commit()?;
        self.buffer.clear();
        Ok(())
    }

    /// Number of durable rows (flushes first)
    pub fn len(&mut self) -> Result<usize> {
        self.flush()?;
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM phrases", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Drop for DedupStore {
    fn drop(&mut self) {
        // Shutdown guarantee: nothing recorded is lost with the process
        if let Err(err) = self.flush() {
            tracing::warn!("dedup store flush on drop failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        dir.push(format!("seedscan_dedup_{unique}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_record_then_seen() {
        let mut store = DedupStore::open_in_memory(DEFAULT_BATCH_SIZE).unwrap();
        assert!(!store.seen("alpha beta").unwrap());
        store.record("alpha beta").unwrap();
        // Visible through the pending batch before any flush
        assert!(store.seen("alpha beta").unwrap());
        store.flush().unwrap();
        assert!(store.seen("alpha beta").unwrap());
    }

    #[test]
    fn test_double_record_is_idempotent() {
        let mut store = DedupStore::open_in_memory(DEFAULT_BATCH_SIZE).unwrap();
        store.record("phrase").unwrap();
        store.record("phrase").unwrap();
        assert!(store.seen("phrase").unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_batch_threshold_triggers_flush() {
        let mut store = DedupStore::open_in_memory(3).unwrap();
        store.record("one").unwrap();
        store.record("two").unwrap();
        assert_eq!(store.buffer.len(), 2);
        store.record("three").unwrap();
        assert_eq!(store.buffer.len(), 0);
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = temp_dir();
        let db = dir.join("phrases.db");
        {
            let mut store = DedupStore::open(&db, DEFAULT_BATCH_SIZE).unwrap();
            store.record("durable phrase").unwrap();
            // Drop flushes
        }
        let store = DedupStore::open(&db, DEFAULT_BATCH_SIZE).unwrap();
        assert!(store.seen("durable phrase").unwrap());
        assert!(!store.seen("other phrase").unwrap());
    }
}
