//! Device login credential repository
//!
//! Each row belongs to one device and is removed with it.

use crate::database::core::{datetime_from_millis, now_millis, ListQuery};
use crate::database::inventory::{delete_by_id, get_by_id};
use crate::filters::{FilterField, FilterKind, FilterSpec, ListArgs, DEFAULT_LIMIT};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

const TABLE: &str = "device_credentials";
const COLUMNS: &str = "id, device_id, username, secret, descr, created_at, updated_at";

pub const DEVICE_CREDENTIAL_FILTERS: FilterSpec = FilterSpec {
    fields: &[
        FilterField::new("device_id_f", "device_id", FilterKind::Int),
        FilterField::new("username_f", "username", FilterKind::IPattern),
        FilterField::new("descr_f", "descr", FilterKind::Pattern).with_sentinels(),
    ],
    default_limit: DEFAULT_LIMIT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCredentialRecord {
    pub id: i64,
    pub device_id: i64,
    pub username: String,
    pub secret: String,
    pub descr: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDeviceCredential {
    pub device_id: i64,
    pub username: String,
    pub secret: String,
    pub descr: Option<String>,
}

pub struct DeviceCredentialRepository<'a> {
    conn: &'a Connection,
}

impl<'a> DeviceCredentialRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn list(&self, args: &ListArgs) -> Result<Vec<DeviceCredentialRecord>> {
        ListQuery::new(TABLE, COLUMNS)
            .filtered(args)
            .paged(args)
            .fetch(self.conn, Self::from_row)
    }

    pub fn count(&self, args: &ListArgs) -> Result<u64> {
        ListQuery::new(TABLE, COLUMNS).filtered(args).count(self.conn)
    }

    pub fn get(&self, id: i64) -> Result<Option<DeviceCredentialRecord>> {
        get_by_id(self.conn, TABLE, COLUMNS, id, Self::from_row)
    }

    pub fn insert(&self, credential: &NewDeviceCredential) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO device_credentials
                    (device_id, username, secret, descr, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    credential.device_id,
                    credential.username,
                    credential.secret,
                    credential.descr,
                    now_millis()
                ],
            )
            .context("Failed to insert device credential")?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, credential: &NewDeviceCredential) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                "UPDATE device_credentials
                 SET device_id = ?1, username = ?2, secret = ?3, descr = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    credential.device_id,
                    credential.username,
                    credential.secret,
                    credential.descr,
                    now_millis(),
                    id
                ],
            )
            .with_context(|| format!("Failed to update device credential {}", id))?;
        Ok(updated > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(self.conn, TABLE, id)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<DeviceCredentialRecord> {
        Ok(DeviceCredentialRecord {
            id: row.get(0)?,
            device_id: row.get(1)?,
            username: row.get(2)?,
            secret: row.get(3)?,
            descr: row.get(4)?,
            created_at: datetime_from_millis(row.get(5)?),
            updated_at: datetime_from_millis(row.get(6)?),
        })
    }
}
