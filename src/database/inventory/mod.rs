//! Inventory database storage
//!
//! One repository per entity kind, all sharing a single SQLite connection:
//! - sites
//! - devices (management addresses, MAC, site and credential references)
//! - interfaces (per device)
//! - credentials, device credentials and SNMP credentials (secrets stored sealed)
//!
//! Repositories store secret columns exactly as given; sealing and opening them is
//! the job of [`crate::codec::EntityCodec`].

mod credentials;
mod device_credentials;
mod devices;
mod interfaces;
mod sites;
mod snmp_credentials;

pub use credentials::{CredentialRecord, CredentialRepository, NewCredential, CREDENTIAL_FILTERS};
pub use device_credentials::{
    DeviceCredentialRecord, DeviceCredentialRepository, NewDeviceCredential,
    DEVICE_CREDENTIAL_FILTERS,
};
pub use devices::{DeviceRecord, DeviceRepository, NewDevice, DEVICE_FILTERS};
pub use interfaces::{InterfaceRecord, InterfaceRepository, NewInterface, INTERFACE_FILTERS};
pub use sites::{NewSite, SiteRecord, SiteRepository, SITE_FILTERS};
pub use snmp_credentials::{
    NewSnmpCredential, SnmpCredentialRecord, SnmpCredentialRepository, SNMP_CREDENTIAL_FILTERS,
};

use crate::database::core::{DatabaseConn, SchemaManager, SchemaStatus};
use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, Row};
use tracing::{info, warn};

/// Main inventory database (SQLite backend)
///
/// Opening a database checks the schema: a missing schema is initialized and an
/// older one is migrated in place. A newer or corrupted schema is refused so the
/// stored inventory is never dropped behind the operator's back; only
/// [`InventoryDatabase::open_with_reset`] with `reset` set discards it.
pub struct InventoryDatabase {
    db: DatabaseConn,
}

impl InventoryDatabase {
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with_reset(path, false)
    }

    /// Open the database at `path`, dropping all stored rows first when `reset`
    /// is set.
    pub fn open_with_reset(path: &str, reset: bool) -> Result<Self> {
        let db = DatabaseConn::open_path(path)?;
        let schema = SchemaManager::new(&db.conn);

        if reset {
            warn!("resetting inventory database at {}", path);
            schema.reset()?;
            schema.initialize()?;
            return Ok(Self { db });
        }

        match schema.check_status()? {
            SchemaStatus::Current => {
                info!("inventory database schema is current");
            }
            SchemaStatus::NotInitialized => {
                info!("initializing inventory database schema");
                schema.initialize()?;
            }
            SchemaStatus::NeedsMigration { from, to } => {
                info!("migrating inventory database schema from v{} to v{}", from, to);
                schema
                    .migrate(from)
                    .with_context(|| format!("Failed to migrate inventory database {}", path))?;
            }
            SchemaStatus::Incompatible {
                database_version,
                required_version,
            } => {
                return Err(anyhow!(
                    "inventory database {} has schema v{}, newer than the supported v{}; \
                     refusing to open it (reset it explicitly to discard its contents)",
                    path,
                    database_version,
                    required_version
                ));
            }
            SchemaStatus::Corrupted => {
                return Err(anyhow!(
                    "inventory database {} is missing tables; refusing to open it \
                     (reset it explicitly to discard its contents)",
                    path
                ));
            }
        }

        Ok(Self { db })
    }

    /// Open the database file `{data_dir}/netinv.sqlite3`
    pub fn open_in_dir(data_dir: &str) -> Result<Self> {
        let path = format!("{}/netinv.sqlite3", data_dir);
        Self::open(&path)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = DatabaseConn::open_in_memory()?;
        SchemaManager::new(&db.conn).initialize()?;
        Ok(Self { db })
    }

    pub fn sites(&self) -> SiteRepository<'_> {
        SiteRepository::new(&self.db.conn)
    }

    pub fn devices(&self) -> DeviceRepository<'_> {
        DeviceRepository::new(&self.db.conn)
    }

    pub fn interfaces(&self) -> InterfaceRepository<'_> {
        InterfaceRepository::new(&self.db.conn)
    }

    pub fn credentials(&self) -> CredentialRepository<'_> {
        CredentialRepository::new(&self.db.conn)
    }

    pub fn device_credentials(&self) -> DeviceCredentialRepository<'_> {
        DeviceCredentialRepository::new(&self.db.conn)
    }

    pub fn snmp_credentials(&self) -> SnmpCredentialRepository<'_> {
        SnmpCredentialRepository::new(&self.db.conn)
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        SchemaManager::new(&self.db.conn).get_meta(key)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        SchemaManager::new(&self.db.conn).set_meta(key, value)
    }
}

// =============================================================================
// Shared row helpers
// =============================================================================

/// Fetch one row by primary key; `Ok(None)` when no row has that id.
pub(crate) fn get_by_id<T, F>(
    conn: &Connection,
    table: &str,
    columns: &str,
    id: i64,
    map: F,
) -> Result<Option<T>>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    let sql = format!("SELECT {} FROM {} WHERE id = ?1", columns, table);
    match conn.query_row(&sql, [id], map) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(anyhow!("Failed to get {} row {}: {}", table, id, e)),
    }
}

/// Delete one row by primary key; `Ok(false)` when no row has that id.
pub(crate) fn delete_by_id(conn: &Connection, table: &str, id: i64) -> Result<bool> {
    let deleted = conn
        .execute(&format!("DELETE FROM {} WHERE id = ?1", table), [id])
        .with_context(|| format!("Failed to delete {} row {}", table, id))?;
    Ok(deleted > 0)
}

/// Whether an error chain carries a SQLite constraint violation.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<rusqlite::Error>(),
            Some(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    })
}

/// Ensure the data directory exists
pub fn ensure_data_dir(data_dir: &str) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .map_err(|e| anyhow!("Failed to create data directory '{}': {}", data_dir, e))
}
