//! Device repository
//!
//! Management addresses are stored as CIDR text plus a 16-byte range so that
//! `host_ip4_f=10.0.0.0/24` is a containment test.

use crate::database::core::{
    datetime_from_millis, inet_from_column, inet_values, mac_from_column, now_millis, ListQuery,
};
use crate::database::inventory::{delete_by_id, get_by_id};
use crate::filters::bridge::mac_to_string;
use crate::filters::{FilterField, FilterKind, FilterSpec, ListArgs, MacAddr, DEFAULT_LIMIT};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ipnet::IpNet;
use rusqlite::{params, Connection, Row};

const TABLE: &str = "devices";
const COLUMNS: &str = "id, name, site_id, host_ip4, host_ip6, mac, sys_name, descr, \
                       credential_id, snmp_credential_id, created_at, updated_at";

pub const DEVICE_FILTERS: FilterSpec = FilterSpec {
    fields: &[
        FilterField::new("name_f", "name", FilterKind::IPattern),
        FilterField::new("sys_name_f", "sys_name", FilterKind::Pattern).with_sentinels(),
        FilterField::new("descr_f", "descr", FilterKind::Pattern).with_sentinels(),
        FilterField::new("host_ip4_f", "host_ip4", FilterKind::Network).with_sentinels(),
        FilterField::new("host_ip6_f", "host_ip6", FilterKind::Network).with_sentinels(),
        FilterField::new("mac_f", "mac", FilterKind::Mac).with_sentinels(),
        FilterField::new("site_id_f", "site_id", FilterKind::Int),
    ],
    default_limit: DEFAULT_LIMIT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub id: i64,
    pub name: String,
    pub site_id: Option<i64>,
    pub host_ip4: Option<IpNet>,
    pub host_ip6: Option<IpNet>,
    pub mac: Option<MacAddr>,
    pub sys_name: Option<String>,
    pub descr: Option<String>,
    pub credential_id: Option<i64>,
    pub snmp_credential_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDevice {
    pub name: String,
    pub site_id: Option<i64>,
    pub host_ip4: Option<IpNet>,
    pub host_ip6: Option<IpNet>,
    pub mac: Option<MacAddr>,
    pub sys_name: Option<String>,
    pub descr: Option<String>,
    pub credential_id: Option<i64>,
    pub snmp_credential_id: Option<i64>,
}

pub struct DeviceRepository<'a> {
    conn: &'a Connection,
}

impl<'a> DeviceRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn list(&self, args: &ListArgs) -> Result<Vec<DeviceRecord>> {
        ListQuery::new(TABLE, COLUMNS)
            .filtered(args)
            .paged(args)
            .fetch(self.conn, Self::from_row)
    }

    pub fn count(&self, args: &ListArgs) -> Result<u64> {
        ListQuery::new(TABLE, COLUMNS).filtered(args).count(self.conn)
    }

    pub fn get(&self, id: i64) -> Result<Option<DeviceRecord>> {
        get_by_id(self.conn, TABLE, COLUMNS, id, Self::from_row)
    }

    pub fn insert(&self, device: &NewDevice) -> Result<i64> {
        let (ip4, ip4_start, ip4_end) = inet_values(device.host_ip4.as_ref());
        let (ip6, ip6_start, ip6_end) = inet_values(device.host_ip6.as_ref());
        self.conn
            .execute(
                "INSERT INTO devices (
                    name, site_id,
                    host_ip4, host_ip4_start, host_ip4_end,
                    host_ip6, host_ip6_start, host_ip6_end,
                    mac, sys_name, descr, credential_id, snmp_credential_id,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
                params![
                    device.name,
                    device.site_id,
                    ip4,
                    ip4_start,
                    ip4_end,
                    ip6,
                    ip6_start,
                    ip6_end,
                    mac_to_string(device.mac.as_ref()),
                    device.sys_name,
                    device.descr,
                    device.credential_id,
                    device.snmp_credential_id,
                    now_millis(),
                ],
            )
            .context("Failed to insert device")?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, device: &NewDevice) -> Result<bool> {
        let (ip4, ip4_start, ip4_end) = inet_values(device.host_ip4.as_ref());
        let (ip6, ip6_start, ip6_end) = inet_values(device.host_ip6.as_ref());
        let updated = self
            .conn
            .execute(
                "UPDATE devices SET
                    name = ?1, site_id = ?2,
                    host_ip4 = ?3, host_ip4_start = ?4, host_ip4_end = ?5,
                    host_ip6 = ?6, host_ip6_start = ?7, host_ip6_end = ?8,
                    mac = ?9, sys_name = ?10, descr = ?11,
                    credential_id = ?12, snmp_credential_id = ?13,
                    updated_at = ?14
                 WHERE id = ?15",
                params![
                    device.name,
                    device.site_id,
                    ip4,
                    ip4_start,
                    ip4_end,
                    ip6,
                    ip6_start,
                    ip6_end,
                    mac_to_string(device.mac.as_ref()),
                    device.sys_name,
                    device.descr,
                    device.credential_id,
                    device.snmp_credential_id,
                    now_millis(),
                    id,
                ],
            )
            .with_context(|| format!("Failed to update device {}", id))?;
        Ok(updated > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(self.conn, TABLE, id)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<DeviceRecord> {
        Ok(DeviceRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            site_id: row.get(2)?,
            host_ip4: inet_from_column(row.get(3)?),
            host_ip6: inet_from_column(row.get(4)?),
            mac: mac_from_column(row.get(5)?),
            sys_name: row.get(6)?,
            descr: row.get(7)?,
            credential_id: row.get(8)?,
            snmp_credential_id: row.get(9)?,
            created_at: datetime_from_millis(row.get(10)?),
            updated_at: datetime_from_millis(row.get(11)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::inventory::{is_constraint_violation, InventoryDatabase, NewSite};
    use crate::filters::{parse_inet, parse_mac};
    use std::collections::HashMap;

    fn args(pairs: &[(&str, &str)]) -> ListArgs {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ListArgs::from_params(&params, &DEVICE_FILTERS)
    }

    fn device(name: &str, ip4: Option<&str>, mac: Option<&str>) -> NewDevice {
        NewDevice {
            name: name.to_string(),
            host_ip4: ip4.and_then(parse_inet),
            mac: mac.and_then(parse_mac),
            ..Default::default()
        }
    }

    fn names(repo: &DeviceRepository<'_>, a: &ListArgs) -> Vec<String> {
        repo.list(a).unwrap().into_iter().map(|d| d.name).collect()
    }

    #[test]
    fn test_roundtrip_all_fields() {
        let db = InventoryDatabase::open_in_memory().unwrap();
        let site_id = db
            .sites()
            .insert(&NewSite {
                name: "lab".to_string(),
                descr: None,
            })
            .unwrap();

        let new = NewDevice {
            name: "core-1".to_string(),
            site_id: Some(site_id),
            host_ip4: parse_inet("192.0.2.10"),
            host_ip6: parse_inet("2001:db8::10"),
            mac: parse_mac("00:00:5e:00:53:01"),
            sys_name: Some(String::new()),
            descr: Some("core router".to_string()),
            credential_id: None,
            snmp_credential_id: None,
        };
        let id = db.devices().insert(&new).unwrap();
        let record = db.devices().get(id).unwrap().unwrap();

        assert_eq!(record.name, new.name);
        assert_eq!(record.site_id, new.site_id);
        assert_eq!(record.host_ip4, new.host_ip4);
        assert_eq!(record.host_ip6, new.host_ip6);
        assert_eq!(record.mac, new.mac);
        assert_eq!(record.sys_name, Some(String::new()));
        assert_eq!(record.descr, new.descr);
        assert_eq!(record.credential_id, None);
    }

    #[test]
    fn test_network_containment_filter() {
        let db = InventoryDatabase::open_in_memory().unwrap();
        let repo = db.devices();
        repo.insert(&device("a", Some("10.0.0.1"), None)).unwrap();
        repo.insert(&device("b", Some("10.0.0.200"), None)).unwrap();
        repo.insert(&device("c", Some("10.0.1.1"), None)).unwrap();
        repo.insert(&device("d", None, None)).unwrap();

        assert_eq!(names(&repo, &args(&[("host_ip4_f", "10.0.0.0/24")])), vec!["a", "b"]);
        assert_eq!(names(&repo, &args(&[("host_ip4_f", "10.0.1.1")])), vec!["c"]);
        assert_eq!(names(&repo, &args(&[("host_ip4_f", "isnull")])), vec!["d"]);
        assert_eq!(names(&repo, &args(&[("host_ip4_f", "bogus")])).len(), 4);
    }

    #[test]
    fn test_ipv6_network_excludes_ipv4_hosts() {
        let db = InventoryDatabase::open_in_memory().unwrap();
        let repo = db.devices();
        repo.insert(&device("v4host", Some("10.0.0.1"), None)).unwrap();
        repo.insert(&NewDevice {
            name: "v6host".to_string(),
            host_ip6: parse_inet("2001:db8::1"),
            ..Default::default()
        })
        .unwrap();

        assert!(names(&repo, &args(&[("host_ip4_f", "::/0")])).is_empty());
        assert!(names(&repo, &args(&[("host_ip4_f", "::ffff:10.0.0.0/120")])).is_empty());
        assert_eq!(names(&repo, &args(&[("host_ip4_f", "0.0.0.0/0")])), vec!["v4host"]);
        assert_eq!(names(&repo, &args(&[("host_ip6_f", "::/0")])), vec!["v6host"]);
        assert!(names(&repo, &args(&[("host_ip6_f", "0.0.0.0/0")])).is_empty());
    }

    #[test]
    fn test_mac_filter() {
        let db = InventoryDatabase::open_in_memory().unwrap();
        let repo = db.devices();
        repo.insert(&device("a", None, Some("00:00:5e:00:53:01"))).unwrap();
        repo.insert(&device("b", None, Some("00:00:5e:00:53:02"))).unwrap();
        repo.insert(&device("c", None, None)).unwrap();

        assert_eq!(names(&repo, &args(&[("mac_f", "00-00-5E-00-53-01")])), vec!["a"]);
        assert_eq!(names(&repo, &args(&[("mac_f", "isnull")])), vec!["c"]);
    }

    #[test]
    fn test_site_filter_and_fk() {
        let db = InventoryDatabase::open_in_memory().unwrap();
        let site_id = db
            .sites()
            .insert(&NewSite {
                name: "lab".to_string(),
                descr: None,
            })
            .unwrap();

        let mut d = device("a", None, None);
        d.site_id = Some(site_id);
        db.devices().insert(&d).unwrap();
        db.devices().insert(&device("b", None, None)).unwrap();

        let filter = format!("{}", site_id);
        assert_eq!(
            names(&db.devices(), &args(&[("site_id_f", filter.as_str())])),
            vec!["a"]
        );

        d.site_id = Some(site_id + 100);
        let err = db.devices().insert(&d).unwrap_err();
        assert!(is_constraint_violation(&err));

        // deleting the site detaches its devices
        db.sites().delete(site_id).unwrap();
        let all = db.devices().list(&args(&[])).unwrap();
        assert!(all.iter().all(|d| d.site_id.is_none()));
    }

    #[test]
    fn test_pagination() {
        let db = InventoryDatabase::open_in_memory().unwrap();
        let repo = db.devices();
        for i in 0..5 {
            repo.insert(&device(&format!("dev-{}", i), None, None)).unwrap();
        }

        assert_eq!(
            names(&repo, &args(&[("limit", "2"), ("offset", "2")])),
            vec!["dev-2", "dev-3"]
        );
        assert_eq!(names(&repo, &args(&[("limit", "0")])).len(), 5);
        assert_eq!(repo.count(&args(&[("limit", "2")]).count_args()).unwrap(), 5);
    }
}
