//! Interface repository
//!
//! Interfaces belong to a device and are removed with it.

use crate::database::core::{
    datetime_from_millis, inet_from_column, inet_values, mac_from_column, now_millis, ListQuery,
};
use crate::database::inventory::{delete_by_id, get_by_id};
use crate::filters::bridge::mac_to_string;
use crate::filters::{FilterField, FilterKind, FilterSpec, ListArgs, MacAddr, LARGE_DEFAULT_LIMIT};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ipnet::IpNet;
use rusqlite::{params, Connection, Row};

const TABLE: &str = "interfaces";
const COLUMNS: &str =
    "id, device_id, ifindex, name, descr, alias, mac, ip4, created_at, updated_at";

/// Interface tables are large, so a listing returns up to 1000 rows by default.
pub const INTERFACE_FILTERS: FilterSpec = FilterSpec {
    fields: &[
        FilterField::new("device_id_f", "device_id", FilterKind::Int),
        FilterField::new("name_f", "name", FilterKind::IPattern),
        FilterField::new("descr_f", "descr", FilterKind::Pattern).with_sentinels(),
        FilterField::new("alias_f", "alias", FilterKind::Pattern).with_sentinels(),
        FilterField::new("mac_f", "mac", FilterKind::Mac).with_sentinels(),
        FilterField::new("ip4_f", "ip4", FilterKind::Network).with_sentinels(),
        FilterField::new("ifindex", "ifindex", FilterKind::IntRange),
    ],
    default_limit: LARGE_DEFAULT_LIMIT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRecord {
    pub id: i64,
    pub device_id: i64,
    pub ifindex: Option<i64>,
    pub name: String,
    pub descr: Option<String>,
    pub alias: Option<String>,
    pub mac: Option<MacAddr>,
    pub ip4: Option<IpNet>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewInterface {
    pub device_id: i64,
    pub ifindex: Option<i64>,
    pub name: String,
    pub descr: Option<String>,
    pub alias: Option<String>,
    pub mac: Option<MacAddr>,
    pub ip4: Option<IpNet>,
}

pub struct InterfaceRepository<'a> {
    conn: &'a Connection,
}

impl<'a> InterfaceRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn list(&self, args: &ListArgs) -> Result<Vec<InterfaceRecord>> {
        ListQuery::new(TABLE, COLUMNS)
            .filtered(args)
            .paged(args)
            .fetch(self.conn, Self::from_row)
    }

    pub fn count(&self, args: &ListArgs) -> Result<u64> {
        ListQuery::new(TABLE, COLUMNS).filtered(args).count(self.conn)
    }

    pub fn get(&self, id: i64) -> Result<Option<InterfaceRecord>> {
        get_by_id(self.conn, TABLE, COLUMNS, id, Self::from_row)
    }

    pub fn insert(&self, iface: &NewInterface) -> Result<i64> {
        let (ip4, ip4_start, ip4_end) = inet_values(iface.ip4.as_ref());
        self.conn
            .execute(
                "INSERT INTO interfaces (
                    device_id, ifindex, name, descr, alias, mac,
                    ip4, ip4_start, ip4_end, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    iface.device_id,
                    iface.ifindex,
                    iface.name,
                    iface.descr,
                    iface.alias,
                    mac_to_string(iface.mac.as_ref()),
                    ip4,
                    ip4_start,
                    ip4_end,
                    now_millis(),
                ],
            )
            .context("Failed to insert interface")?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, iface: &NewInterface) -> Result<bool> {
        let (ip4, ip4_start, ip4_end) = inet_values(iface.ip4.as_ref());
        let updated = self
            .conn
            .execute(
                "UPDATE interfaces SET
                    device_id = ?1, ifindex = ?2, name = ?3, descr = ?4, alias = ?5,
                    mac = ?6, ip4 = ?7, ip4_start = ?8, ip4_end = ?9, updated_at = ?10
                 WHERE id = ?11",
                params![
                    iface.device_id,
                    iface.ifindex,
                    iface.name,
                    iface.descr,
                    iface.alias,
                    mac_to_string(iface.mac.as_ref()),
                    ip4,
                    ip4_start,
                    ip4_end,
                    now_millis(),
                    id,
                ],
            )
            .with_context(|| format!("Failed to update interface {}", id))?;
        Ok(updated > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(self.conn, TABLE, id)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<InterfaceRecord> {
        Ok(InterfaceRecord {
            id: row.get(0)?,
            device_id: row.get(1)?,
            ifindex: row.get(2)?,
            name: row.get(3)?,
            descr: row.get(4)?,
            alias: row.get(5)?,
            mac: mac_from_column(row.get(6)?),
            ip4: inet_from_column(row.get(7)?),
            created_at: datetime_from_millis(row.get(8)?),
            updated_at: datetime_from_millis(row.get(9)?),
        })
    }
}
