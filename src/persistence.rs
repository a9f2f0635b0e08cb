// File: src/persistence.rs
//! SQLite-backed store for normalized chains.
//!
//! Every chain lives in the one `markov_chain` table, one row per edge,
//! grouped by a `context` column (one context per speaker plus the
//! speaker-selection chain). The store is only ever rebuilt from scratch.

use crate::core::types::{NormalizedChain, Token};
use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const CREATE_SQL: &str = "CREATE TABLE IF NOT EXISTS markov_chain (
    context VARCHAR,
    word VARCHAR,
    next_word VARCHAR,
    weight REAL
)";
const DROP_SQL: &str = "DROP TABLE IF EXISTS markov_chain";
const INDEX_SQL: &str = "
    CREATE INDEX IF NOT EXISTS markov_chain_context_idx ON markov_chain(context);
    CREATE INDEX IF NOT EXISTS markov_chain_context_word_idx ON markov_chain(context, word);
";
const INSERT_SQL: &str =
    "INSERT INTO markov_chain (context, word, next_word, weight) VALUES (?1, ?2, ?3, ?4)";

/// Durable, queryable home for normalized chains.
///
/// Holds one exclusive connection for its lifetime; dropping the store
/// closes it.
pub struct ChainStore {
    conn: Connection,
}

impl ChainStore {
    /// Opens (or creates) the store file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        debug!("opening chain store at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    /// A store that lives only as long as this value.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(CREATE_SQL)?;
        Ok(Self { conn })
    }

    /// Closes the connection, reporting any error from doing so.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }

    /// Drops and recreates the chain table, leaving it empty and unindexed.
    pub fn reinitialize(&self) -> Result<()> {
        reinitialize(&self.conn)
    }

    pub fn insert(&self, context: &str, word: &str, next_word: &str, weight: f64) -> Result<()> {
        self.conn
            .execute(INSERT_SQL, params![context, word, next_word, weight])?;
        Ok(())
    }

    /// Writes every edge of `chain` under `context`, in one transaction.
    pub fn store_chain(&mut self, context: &str, chain: &NormalizedChain) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let rows = store_chain(&tx, context, chain)?;
        tx.commit()?;
        Ok(rows)
    }

    /// Builds the lookup indexes. Run after bulk inserts.
    pub fn index(&self) -> Result<()> {
        self.conn.execute_batch(INDEX_SQL)?;
        Ok(())
    }

    /// Replaces the whole store with `chains`, indexing at the end.
    ///
    /// Runs as a single transaction, so readers see either the old store or
    /// the complete new one.
    pub fn rebuild<'a, I>(&mut self, chains: I) -> Result<usize>
    where
        I: IntoIterator<Item = (&'a str, &'a NormalizedChain)>,
    {
        let tx = self.conn.transaction()?;
        reinitialize(&tx)?;
        let mut contexts = 0;
        let mut rows = 0;
        for (context, chain) in chains {
            rows += store_chain(&tx, context, chain)?;
            contexts += 1;
        }
        tx.execute_batch(INDEX_SQL)?;
        tx.commit()?;
        info!("rebuilt chain store: {} contexts, {} rows", contexts, rows);
        Ok(rows)
    }

    /// All distinct contexts, ascending.
    pub fn get_contexts(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT DISTINCT context FROM markov_chain ORDER BY context")?;
        let contexts = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(contexts)
    }

    /// Whether `word` leads any edge under `context`.
    pub fn word_exists(&self, context: &str, word: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM markov_chain WHERE context = ?1 AND word = ?2 LIMIT 1",
                params![context, word],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// All distinct leaders under `context`, ascending.
    pub fn get_vocabulary(&self, context: &str) -> Result<Vec<Token>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT DISTINCT word FROM markov_chain WHERE context = ?1 ORDER BY word",
        )?;
        let words = stmt
            .query_map(params![context], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(words)
    }

    /// Followers of `word` under `context`, heaviest first, ties by name.
    pub fn get_next_word_candidates(&self, context: &str, word: &str) -> Result<Vec<(Token, f64)>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT next_word, weight FROM markov_chain
             WHERE context = ?1 AND word = ?2
             ORDER BY weight DESC, next_word ASC",
        )?;
        let candidates = stmt
            .query_map(params![context, word], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, f64)>>>()?;
        Ok(candidates)
    }

    /// Reconstructs the chain stored under `context`, in insertion order.
    pub fn to_chain(&self, context: &str) -> Result<NormalizedChain> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT word, next_word, weight FROM markov_chain
             WHERE context = ?1 ORDER BY rowid",
        )?;
        let edges = stmt
            .query_map(params![context], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<rusqlite::Result<Vec<(String, String, f64)>>>()?;
        debug!("loaded {} edges for context {:?}", edges.len(), context);
        Ok(NormalizedChain::from_edges(edges))
    }
}

fn reinitialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(DROP_SQL)?;
    conn.execute_batch(CREATE_SQL)?;
    Ok(())
}

fn store_chain(tx: &Transaction<'_>, context: &str, chain: &NormalizedChain) -> Result<usize> {
    let mut stmt = tx.prepare_cached(INSERT_SQL)?;
    let mut rows = 0;
    for (word, next_word, weight) in chain.edges() {
        stmt.execute(params![context, word, next_word, weight])?;
        rows += 1;
    }
    debug!("stored {} edges for context {:?}", rows, context);
    Ok(rows)
}
