//! SNMP credential repository
//!
//! `auth_passphrase` and `priv_passphrase` hold sealed text or an empty string.
//! `version` is stored as its wire text (`1`, `2c` or `3`).

use crate::database::core::{datetime_from_millis, now_millis, ListQuery};
use crate::database::inventory::{delete_by_id, get_by_id};
use crate::filters::{FilterField, FilterKind, FilterSpec, ListArgs, DEFAULT_LIMIT};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

const TABLE: &str = "snmp_credentials";
const COLUMNS: &str = "id, name, version, security_name, auth_protocol, auth_passphrase, \
                       priv_protocol, priv_passphrase, descr, created_at, updated_at";

pub const SNMP_CREDENTIAL_FILTERS: FilterSpec = FilterSpec {
    fields: &[
        FilterField::new("name_f", "name", FilterKind::IPattern),
        FilterField::new("version_f", "version", FilterKind::Exact),
        FilterField::new("security_name_f", "security_name", FilterKind::Pattern)
            .with_sentinels(),
        FilterField::new("descr_f", "descr", FilterKind::Pattern).with_sentinels(),
    ],
    default_limit: DEFAULT_LIMIT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpCredentialRecord {
    pub id: i64,
    pub name: String,
    pub version: String,
    pub security_name: Option<String>,
    pub auth_protocol: Option<String>,
    pub auth_passphrase: String,
    pub priv_protocol: Option<String>,
    pub priv_passphrase: String,
    pub descr: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSnmpCredential {
    pub name: String,
    pub version: String,
    pub security_name: Option<String>,
    pub auth_protocol: Option<String>,
    pub auth_passphrase: String,
    pub priv_protocol: Option<String>,
    pub priv_passphrase: String,
    pub descr: Option<String>,
}

pub struct SnmpCredentialRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SnmpCredentialRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn list(&self, args: &ListArgs) -> Result<Vec<SnmpCredentialRecord>> {
        ListQuery::new(TABLE, COLUMNS)
            .filtered(args)
            .paged(args)
            .fetch(self.conn, Self::from_row)
    }

    pub fn count(&self, args: &ListArgs) -> Result<u64> {
        ListQuery::new(TABLE, COLUMNS).filtered(args).count(self.conn)
    }

    pub fn get(&self, id: i64) -> Result<Option<SnmpCredentialRecord>> {
        get_by_id(self.conn, TABLE, COLUMNS, id, Self::from_row)
    }

    pub fn insert(&self, credential: &NewSnmpCredential) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO snmp_credentials (
                    name, version, security_name, auth_protocol, auth_passphrase,
                    priv_protocol, priv_passphrase, descr, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    credential.name,
                    credential.version,
                    credential.security_name,
                    credential.auth_protocol,
                    credential.auth_passphrase,
                    credential.priv_protocol,
                    credential.priv_passphrase,
                    credential.descr,
                    now_millis(),
                ],
            )
            .context("Failed to insert SNMP credential")?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, credential: &NewSnmpCredential) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                "UPDATE snmp_credentials SET
                    name = ?1, version = ?2, security_name = ?3, auth_protocol = ?4,
                    auth_passphrase = ?5, priv_protocol = ?6, priv_passphrase = ?7,
                    descr = ?8, updated_at = ?9
                 WHERE id = ?10",
                params![
                    credential.name,
                    credential.version,
                    credential.security_name,
                    credential.auth_protocol,
                    credential.auth_passphrase,
                    credential.priv_protocol,
                    credential.priv_passphrase,
                    credential.descr,
                    now_millis(),
                    id,
                ],
            )
            .with_context(|| format!("Failed to update SNMP credential {}", id))?;
        Ok(updated > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(self.conn, TABLE, id)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<SnmpCredentialRecord> {
        Ok(SnmpCredentialRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            version: row.get(2)?,
            security_name: row.get(3)?,
            auth_protocol: row.get(4)?,
            auth_passphrase: row.get(5)?,
            priv_protocol: row.get(6)?,
            priv_passphrase: row.get(7)?,
            descr: row.get(8)?,
            created_at: datetime_from_millis(row.get(9)?),
            updated_at: datetime_from_millis(row.get(10)?),
        })
    }
}
