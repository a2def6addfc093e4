//! Database connection management
//!
//! This module provides the SQLite connection wrapper used by the inventory store.

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::time::Duration;

/// Core database connection wrapper
///
/// `DatabaseConn` wraps a SQLite connection, handling both file-based and
/// in-memory databases with the same configuration.
pub struct DatabaseConn {
    pub conn: Connection,
}

impl DatabaseConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| anyhow!("Failed to open database at '{}': {}", p, e))?,
            None => Connection::open_in_memory()
                .map_err(|e| anyhow!("Failed to create in-memory database: {}", e))?,
        };

        let db = DatabaseConn { conn };
        db.configure(path.is_some())?;
        Ok(db)
    }

    pub fn open_path(path: &str) -> Result<Self> {
        Self::open(Some(path))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(None)
    }

    fn configure(&self, on_disk: bool) -> Result<()> {
        if on_disk {
            // WAL lets readers proceed while a handler is writing
            let _: String = self
                .conn
                .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
                .map_err(|e| anyhow!("Failed to set journal mode: {}", e))?;

            self.conn
                .execute("PRAGMA synchronous=NORMAL", [])
                .map_err(|e| anyhow!("Failed to set synchronous mode: {}", e))?;
        }

        self.conn
            .busy_timeout(Duration::from_secs(5))
            .map_err(|e| anyhow!("Failed to set busy timeout: {}", e))?;

        // Interfaces and device credentials cascade with their device
        self.conn
            .execute("PRAGMA foreign_keys=ON", [])
            .map_err(|e| anyhow!("Failed to enable foreign keys: {}", e))?;

        Ok(())
    }

    /// Execute a SQL statement
    pub fn execute(&self, sql: &str) -> Result<usize> {
        self.conn
            .execute(sql, [])
            .map_err(|e| anyhow!("Failed to execute SQL: {}", e))
    }

    /// Check if a table exists in the database
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let count: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table_name],
                |row| row.get(0),
            )
            .map_err(|e| anyhow!("Failed to check table existence: {}", e))?;
        Ok(count > 0)
    }

    /// Get the row count for a table
    pub fn table_count(&self, table_name: &str) -> Result<u64> {
        let query = format!("SELECT COUNT(*) FROM {}", table_name);
        let count: u64 = self
            .conn
            .query_row(&query, [], |row| row.get(0))
            .map_err(|e| anyhow!("Failed to get table count: {}", e))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = DatabaseConn::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.sqlite3");
        let db = DatabaseConn::open_path(path.to_str().unwrap()).unwrap();
        db.execute("CREATE TABLE probe (id INTEGER PRIMARY KEY)")
            .unwrap();
        assert!(db.table_exists("probe").unwrap());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let enabled: i64 = db
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_table_count() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE TABLE test_table (id INTEGER PRIMARY KEY)")
            .unwrap();
        db.execute("INSERT INTO test_table (id) VALUES (1), (2), (3)")
            .unwrap();

        assert_eq!(db.table_count("test_table").unwrap(), 3);
        assert!(!db.table_exists("nonexistent_table").unwrap());
    }
}
