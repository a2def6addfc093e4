//! Database schema management
//!
//! All inventory tables are defined here so foreign keys and cross-table queries
//! stay consistent.
//!
//! Timestamps are INTEGER milliseconds since the Unix epoch. Address columns hold
//! CIDR text plus `<column>_start`/`<column>_end` BLOBs (a family tag followed by
//! the address octets) so network containment is a range comparison within one
//! address family.

use crate::filters::bridge::{network_range, parse_inet};
use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;

/// Current schema version
/// Increment this when making breaking schema changes, and teach
/// [`SchemaManager::migrate`] how to bring the previous version forward.
///
/// - v1: address ranges stored as 16-byte values, IPv4 mapped into IPv6
/// - v2: address ranges tagged with their family
pub const SCHEMA_VERSION: u32 = 2;

/// Schema definitions for all tables in the inventory database
pub struct SchemaDefinitions;

impl SchemaDefinitions {
    /// SQL for creating the meta table (tracks schema version)
    pub const META_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS netinv_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
    "#;

    pub const SITES_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS sites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            descr TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
    "#;

    pub const CREDENTIALS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS credentials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            secret TEXT NOT NULL DEFAULT '',
            descr TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
    "#;

    pub const SNMP_CREDENTIALS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS snmp_credentials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            version TEXT NOT NULL,
            security_name TEXT,
            auth_protocol TEXT,
            auth_passphrase TEXT NOT NULL DEFAULT '',
            priv_protocol TEXT,
            priv_passphrase TEXT NOT NULL DEFAULT '',
            descr TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
    "#;

    pub const DEVICES_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS devices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            site_id INTEGER REFERENCES sites(id) ON DELETE SET NULL,
            host_ip4 TEXT,
            host_ip4_start BLOB,
            host_ip4_end BLOB,
            host_ip6 TEXT,
            host_ip6_start BLOB,
            host_ip6_end BLOB,
            mac TEXT,
            sys_name TEXT,
            descr TEXT,
            credential_id INTEGER REFERENCES credentials(id) ON DELETE SET NULL,
            snmp_credential_id INTEGER REFERENCES snmp_credentials(id) ON DELETE SET NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
    "#;

    pub const INTERFACES_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS interfaces (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            device_id INTEGER NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
            ifindex INTEGER,
            name TEXT NOT NULL,
            descr TEXT,
            alias TEXT,
            mac TEXT,
            ip4 TEXT,
            ip4_start BLOB,
            ip4_end BLOB,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
    "#;

    pub const DEVICE_CREDENTIALS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS device_credentials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            device_id INTEGER NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
            username TEXT NOT NULL,
            secret TEXT NOT NULL DEFAULT '',
            descr TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
    "#;

    /// Tables in creation order (referenced tables first)
    pub const TABLES: &'static [(&'static str, &'static str)] = &[
        ("sites", Self::SITES_TABLE),
        ("credentials", Self::CREDENTIALS_TABLE),
        ("snmp_credentials", Self::SNMP_CREDENTIALS_TABLE),
        ("devices", Self::DEVICES_TABLE),
        ("interfaces", Self::INTERFACES_TABLE),
        ("device_credentials", Self::DEVICE_CREDENTIALS_TABLE),
    ];

    /// Address columns carrying `_start`/`_end` range values
    pub const ADDRESS_COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("devices", "host_ip4"),
        ("devices", "host_ip6"),
        ("interfaces", "ip4"),
    ];

    pub const INDEXES: &'static [&'static str] = &[
        "CREATE INDEX IF NOT EXISTS idx_devices_site_id ON devices(site_id)",
        "CREATE INDEX IF NOT EXISTS idx_devices_host_ip4 ON devices(host_ip4_start, host_ip4_end)",
        "CREATE INDEX IF NOT EXISTS idx_devices_host_ip6 ON devices(host_ip6_start, host_ip6_end)",
        "CREATE INDEX IF NOT EXISTS idx_devices_mac ON devices(mac)",
        "CREATE INDEX IF NOT EXISTS idx_interfaces_device_id ON interfaces(device_id)",
        "CREATE INDEX IF NOT EXISTS idx_interfaces_mac ON interfaces(mac)",
        "CREATE INDEX IF NOT EXISTS idx_device_credentials_device_id ON device_credentials(device_id)",
    ];
}

/// Schema manager for the inventory database
///
/// Handles schema initialization, version checking, and resets.
pub struct SchemaManager<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Initialize the database schema
    ///
    /// Creates all tables and indexes if they don't exist and records the
    /// schema version in the meta table.
    pub fn initialize(&self) -> Result<()> {
        self.conn
            .execute(SchemaDefinitions::META_TABLE, [])
            .map_err(|e| anyhow!("Failed to create meta table: {}", e))?;

        self.set_meta("schema_version", &SCHEMA_VERSION.to_string())?;

        for (name, sql) in SchemaDefinitions::TABLES {
            self.conn
                .execute(sql, [])
                .map_err(|e| anyhow!("Failed to create {} table: {}", name, e))?;
        }

        for index_sql in SchemaDefinitions::INDEXES {
            self.conn
                .execute(index_sql, [])
                .map_err(|e| anyhow!("Failed to create index: {}", e))?;
        }

        Ok(())
    }

    /// Check the current schema status
    pub fn check_status(&self) -> Result<SchemaStatus> {
        if !self.table_exists("netinv_meta") {
            return Ok(SchemaStatus::NotInitialized);
        }

        let current_version = self.get_schema_version()?;

        if current_version == SCHEMA_VERSION {
            if self.verify_integrity() {
                Ok(SchemaStatus::Current)
            } else {
                Ok(SchemaStatus::Corrupted)
            }
        } else if current_version < SCHEMA_VERSION {
            Ok(SchemaStatus::NeedsMigration {
                from: current_version,
                to: SCHEMA_VERSION,
            })
        } else {
            Ok(SchemaStatus::Incompatible {
                database_version: current_version,
                required_version: SCHEMA_VERSION,
            })
        }
    }

    /// Bring a schema at version `from` up to [`SCHEMA_VERSION`] in place.
    ///
    /// Stored rows are kept. Versions with no known upgrade path are an error.
    pub fn migrate(&self, from: u32) -> Result<()> {
        if from != 1 {
            return Err(anyhow!(
                "no migration path from schema v{} to v{}",
                from,
                SCHEMA_VERSION
            ));
        }

        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to start schema migration")?;
        for (table, column) in SchemaDefinitions::ADDRESS_COLUMNS {
            self.reencode_ranges(table, column)?;
        }
        self.set_meta("schema_version", &SCHEMA_VERSION.to_string())?;
        tx.commit().context("Failed to commit schema migration")?;
        Ok(())
    }

    /// Recompute `<column>_start`/`<column>_end` from the stored CIDR text.
    fn reencode_ranges(&self, table: &str, column: &str) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT id, {0} FROM {1} WHERE {0} IS NOT NULL",
                column, table
            ))
            .with_context(|| format!("Failed to read {}.{}", table, column))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })
            .and_then(|mapped| mapped.collect::<rusqlite::Result<Vec<_>>>())
            .with_context(|| format!("Failed to read {}.{}", table, column))?;

        let sql = format!(
            "UPDATE {1} SET {0}_start = ?1, {0}_end = ?2 WHERE id = ?3",
            column, table
        );
        for (id, text) in rows {
            let (start, end) = match parse_inet(&text) {
                Some(net) => {
                    let (start, end) = network_range(&net);
                    (Some(start), Some(end))
                }
                None => (None, None),
            };
            self.conn
                .execute(&sql, rusqlite::params![start, end, id])
                .with_context(|| format!("Failed to update {}.{} row {}", table, column, id))?;
        }
        Ok(())
    }

    fn get_schema_version(&self) -> Result<u32> {
        let version = self
            .get_meta("schema_version")?
            .unwrap_or_else(|| "0".to_string());

        version
            .parse()
            .map_err(|e| anyhow!("Invalid schema version: {}", e))
    }

    fn table_exists(&self, table: &str) -> bool {
        let exists: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
                |row| row.get(0),
            )
            .unwrap_or(0);
        exists > 0
    }

    fn verify_integrity(&self) -> bool {
        SchemaDefinitions::TABLES
            .iter()
            .all(|(name, _)| self.table_exists(name))
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO netinv_meta (key, value) VALUES (?1, ?2)",
                [key, value],
            )
            .map_err(|e| anyhow!("Failed to set meta value: {}", e))?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let result: Result<String, _> = self.conn.query_row(
            "SELECT value FROM netinv_meta WHERE key = ?1",
            [key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(anyhow!("Failed to get meta value: {}", e)),
        }
    }

    /// Reset the database by dropping all tables
    ///
    /// Stored inventory and ciphertexts are lost. Only ever run on an explicit
    /// operator request.
    pub fn reset(&self) -> Result<()> {
        for (name, _) in SchemaDefinitions::TABLES.iter().rev() {
            self.conn
                .execute(&format!("DROP TABLE IF EXISTS {}", name), [])
                .map_err(|e| anyhow!("Failed to drop {} table: {}", name, e))?;
        }
        self.conn
            .execute("DROP TABLE IF EXISTS netinv_meta", [])
            .map_err(|e| anyhow!("Failed to drop meta table: {}", e))?;
        Ok(())
    }
}

/// Status of the database schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// Database is not initialized (fresh database)
    NotInitialized,

    /// Schema is current and valid
    Current,

    /// Schema needs migration from an older version
    NeedsMigration { from: u32, to: u32 },

    /// Database is from a newer version (incompatible)
    Incompatible {
        database_version: u32,
        required_version: u32,
    },

    /// Schema is corrupted (missing tables)
    Corrupted,
}
