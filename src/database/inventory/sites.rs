//! Site repository

use crate::database::core::{datetime_from_millis, now_millis, ListQuery};
use crate::database::inventory::{delete_by_id, get_by_id};
use crate::filters::{FilterField, FilterKind, FilterSpec, ListArgs, DEFAULT_LIMIT};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

const TABLE: &str = "sites";
const COLUMNS: &str = "id, name, descr, created_at, updated_at";

/// Filters recognized by the site listing
pub const SITE_FILTERS: FilterSpec = FilterSpec {
    fields: &[
        FilterField::new("name_f", "name", FilterKind::IPattern),
        FilterField::new("descr_f", "descr", FilterKind::Pattern).with_sentinels(),
    ],
    default_limit: DEFAULT_LIMIT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecord {
    pub id: i64,
    pub name: String,
    pub descr: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create or full-replace argument for a site
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSite {
    pub name: String,
    pub descr: Option<String>,
}

pub struct SiteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SiteRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn list(&self, args: &ListArgs) -> Result<Vec<SiteRecord>> {
        ListQuery::new(TABLE, COLUMNS)
            .filtered(args)
            .paged(args)
            .fetch(self.conn, Self::from_row)
    }

    pub fn count(&self, args: &ListArgs) -> Result<u64> {
        ListQuery::new(TABLE, COLUMNS).filtered(args).count(self.conn)
    }

    pub fn get(&self, id: i64) -> Result<Option<SiteRecord>> {
        get_by_id(self.conn, TABLE, COLUMNS, id, Self::from_row)
    }

    pub fn insert(&self, site: &NewSite) -> Result<i64> {
        let now = now_millis();
        self.conn
            .execute(
                "INSERT INTO sites (name, descr, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
                params![site.name, site.descr, now],
            )
            .context("Failed to insert site")?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Replace every field of a site. Returns `false` when the id is unknown.
    pub fn update(&self, id: i64, site: &NewSite) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                "UPDATE sites SET name = ?1, descr = ?2, updated_at = ?3 WHERE id = ?4",
                params![site.name, site.descr, now_millis(), id],
            )
            .with_context(|| format!("Failed to update site {}", id))?;
        Ok(updated > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(self.conn, TABLE, id)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
        Ok(SiteRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            descr: row.get(2)?,
            created_at: datetime_from_millis(row.get(3)?),
            updated_at: datetime_from_millis(row.get(4)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::inventory::InventoryDatabase;
    use std::collections::HashMap;

    fn site(name: &str, descr: Option<&str>) -> NewSite {
        NewSite {
            name: name.to_string(),
            descr: descr.map(|s| s.to_string()),
        }
    }

    fn args(pairs: &[(&str, &str)]) -> ListArgs {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ListArgs::from_params(&params, &SITE_FILTERS)
    }

    #[test]
    fn test_crud() {
        let db = InventoryDatabase::open_in_memory().unwrap();
        let repo = db.sites();

        let id = repo.insert(&site("ams1", Some("Amsterdam"))).unwrap();
        let record = repo.get(id).unwrap().unwrap();
        assert_eq!(record.name, "ams1");
        assert_eq!(record.descr.as_deref(), Some("Amsterdam"));
        assert_eq!(record.created_at, record.updated_at);

        assert!(repo.update(id, &site("ams2", None)).unwrap());
        let record = repo.get(id).unwrap().unwrap();
        assert_eq!(record.name, "ams2");
        assert_eq!(record.descr, None);

        assert!(repo.delete(id).unwrap());
        assert_eq!(repo.get(id).unwrap(), None);
        assert!(!repo.delete(id).unwrap());
        assert!(!repo.update(id, &site("x", None)).unwrap());
    }

    #[test]
    fn test_empty_and_null_are_distinct() {
        let db = InventoryDatabase::open_in_memory().unwrap();
        let repo = db.sites();
        repo.insert(&site("a", None)).unwrap();
        repo.insert(&site("b", Some(""))).unwrap();
        repo.insert(&site("c", Some("core"))).unwrap();

        let names = |a: &ListArgs| -> Vec<String> {
            repo.list(a).unwrap().into_iter().map(|s| s.name).collect()
        };

        assert_eq!(names(&args(&[])), vec!["a", "b", "c"]);
        assert_eq!(names(&args(&[("descr_f", "isnull")])), vec!["a"]);
        assert_eq!(names(&args(&[("descr_f", "isempty")])), vec!["b"]);
        assert_eq!(repo.count(&args(&[("descr_f", "isnull")])).unwrap(), 1);
        assert_eq!(repo.count(&args(&[])).unwrap(), 3);
    }

    #[test]
    fn test_name_filter_is_case_insensitive() {
        let db = InventoryDatabase::open_in_memory().unwrap();
        let repo = db.sites();
        repo.insert(&site("AMS-1", None)).unwrap();
        repo.insert(&site("fra-1", None)).unwrap();

        let found = repo.list(&args(&[("name_f", "ams%")])).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "AMS-1");
    }
}
