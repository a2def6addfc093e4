//! Generic credential repository
//!
//! `secret` holds sealed text, or an empty string when no secret is set.

use crate::database::core::{datetime_from_millis, now_millis, ListQuery};
use crate::database::inventory::{delete_by_id, get_by_id};
use crate::filters::{FilterField, FilterKind, FilterSpec, ListArgs, DEFAULT_LIMIT};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

const TABLE: &str = "credentials";
const COLUMNS: &str = "id, username, secret, descr, created_at, updated_at";

pub const CREDENTIAL_FILTERS: FilterSpec = FilterSpec {
    fields: &[
        FilterField::new("username_f", "username", FilterKind::IPattern),
        FilterField::new("descr_f", "descr", FilterKind::Pattern).with_sentinels(),
    ],
    default_limit: DEFAULT_LIMIT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub id: i64,
    pub username: String,
    pub secret: String,
    pub descr: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCredential {
    pub username: String,
    pub secret: String,
    pub descr: Option<String>,
}

pub struct CredentialRepository<'a> {
    conn: &'a Connection,
}

impl<'a> CredentialRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn list(&self, args: &ListArgs) -> Result<Vec<CredentialRecord>> {
        ListQuery::new(TABLE, COLUMNS)
            .filtered(args)
            .paged(args)
            .fetch(self.conn, Self::from_row)
    }

    pub fn count(&self, args: &ListArgs) -> Result<u64> {
        ListQuery::new(TABLE, COLUMNS).filtered(args).count(self.conn)
    }

    pub fn get(&self, id: i64) -> Result<Option<CredentialRecord>> {
        get_by_id(self.conn, TABLE, COLUMNS, id, Self::from_row)
    }

    pub fn insert(&self, credential: &NewCredential) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO credentials (username, secret, descr, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![
                    credential.username,
                    credential.secret,
                    credential.descr,
                    now_millis()
                ],
            )
            .context("Failed to insert credential")?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, credential: &NewCredential) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                "UPDATE credentials SET username = ?1, secret = ?2, descr = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    credential.username,
                    credential.secret,
                    credential.descr,
                    now_millis(),
                    id
                ],
            )
            .with_context(|| format!("Failed to update credential {}", id))?;
        Ok(updated > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(self.conn, TABLE, id)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<CredentialRecord> {
        Ok(CredentialRecord {
            id: row.get(0)?,
            username: row.get(1)?,
            secret: row.get(2)?,
            descr: row.get(3)?,
            created_at: datetime_from_millis(row.get(4)?),
            updated_at: datetime_from_millis(row.get(5)?),
        })
    }
}
