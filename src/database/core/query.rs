//! SQL construction for filtered listing queries
//!
//! Translates [`ListArgs`] into a parameterized `WHERE` clause. Predicates are
//! joined with `AND`; rows are ordered by primary key.
//!
//! # Predicate translation
//!
//! | Predicate        | SQL                                          |
//! |------------------|----------------------------------------------|
//! | `Equals`         | `col = ?`                                    |
//! | `Like`           | `col GLOB ?` (pattern translated, case-sensitive) |
//! | `ILike`          | `LOWER(col) LIKE LOWER(?)`                   |
//! | `WithinNetwork`  | `col_start >= ? AND col_end <= ?`            |
//! | `IsNull`         | `col IS NULL`                                |
//! | `IsEmpty`        | `col = ''`                                   |

use crate::filters::bridge::{network_range, parse_inet, MacAddr};
use crate::filters::{ListArgs, Predicate};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use ipnet::IpNet;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::str::FromStr;

/// Query builder for one table's listing and count queries
#[derive(Debug, Clone)]
pub struct ListQuery {
    table: &'static str,
    columns: &'static str,
    conditions: Vec<String>,
    values: Vec<Value>,
    limit: Option<u32>,
    offset: u64,
}

impl ListQuery {
    pub fn new(table: &'static str, columns: &'static str) -> Self {
        Self {
            table,
            columns,
            conditions: Vec::new(),
            values: Vec::new(),
            limit: None,
            offset: 0,
        }
    }

    /// Apply the predicates and time bounds of `args`, without paging.
    pub fn filtered(mut self, args: &ListArgs) -> Self {
        for p in &args.predicates {
            self.push_predicate(p.column, &p.predicate);
        }

        let bounds = [
            ("updated_at", ">=", args.time.updated_ge),
            ("updated_at", "<=", args.time.updated_le),
            ("created_at", ">=", args.time.created_ge),
            ("created_at", "<=", args.time.created_le),
        ];
        for (column, op, bound) in bounds {
            if let Some(ts) = bound {
                self.conditions.push(format!("{} {} ?", column, op));
                self.values.push(Value::Integer(ts.timestamp_millis()));
            }
        }

        self
    }

    /// Apply the page bounds of `args`.
    pub fn paged(mut self, args: &ListArgs) -> Self {
        self.limit = Some(args.page.limit);
        self.offset = args.page.offset;
        self
    }

    fn push_predicate(&mut self, column: &str, predicate: &Predicate) {
        match predicate {
            Predicate::Equals(v) => {
                self.conditions.push(format!("{} = ?", column));
                self.values.push(Value::Text(v.clone()));
            }
            Predicate::Like(pattern) => {
                self.conditions.push(format!("{} GLOB ?", column));
                self.values.push(Value::Text(like_to_glob(pattern)));
            }
            Predicate::ILike(pattern) => {
                self.conditions.push(format!("LOWER({}) LIKE LOWER(?)", column));
                self.values.push(Value::Text(pattern.clone()));
            }
            Predicate::IntEquals(v) => {
                self.conditions.push(format!("{} = ?", column));
                self.values.push(Value::Integer(*v));
            }
            Predicate::IntAtLeast(v) => {
                self.conditions.push(format!("{} >= ?", column));
                self.values.push(Value::Integer(*v));
            }
            Predicate::IntAtMost(v) => {
                self.conditions.push(format!("{} <= ?", column));
                self.values.push(Value::Integer(*v));
            }
            Predicate::WithinNetwork(net) => {
                let (start, end) = network_range(net);
                self.conditions
                    .push(format!("({0}_start >= ? AND {0}_end <= ?)", column));
                self.values.push(Value::Blob(start));
                self.values.push(Value::Blob(end));
            }
            Predicate::MacEquals(mac) => {
                self.conditions.push(format!("{} = ?", column));
                self.values.push(Value::Text(mac.to_string()));
            }
            Predicate::IsNull => {
                self.conditions.push(format!("{} IS NULL", column));
            }
            Predicate::IsEmpty => {
                self.conditions.push(format!("{} = ''", column));
            }
        }
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn select_sql(&self) -> String {
        let mut sql = format!(
            "SELECT {} FROM {}{} ORDER BY id ASC",
            self.columns,
            self.table,
            self.where_clause()
        );
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, self.offset));
        }
        sql
    }

    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}{}", self.table, self.where_clause())
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Run the listing query, mapping each row with `map`.
    pub fn fetch<T, F>(&self, conn: &Connection, map: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = conn
            .prepare(&self.select_sql())
            .map_err(|e| anyhow!("Failed to prepare {} query: {}", self.table, e))?;
        let rows = stmt
            .query_map(params_from_iter(self.values.iter()), map)
            .map_err(|e| anyhow!("Failed to query {}: {}", self.table, e))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| anyhow!("Failed to read {} row: {}", self.table, e))?);
        }
        Ok(results)
    }

    pub fn count(&self, conn: &Connection) -> Result<u64> {
        conn.query_row(
            &self.count_sql(),
            params_from_iter(self.values.iter()),
            |row| row.get(0),
        )
        .map_err(|e| anyhow!("Failed to count {}: {}", self.table, e))
    }
}

/// Translate a LIKE pattern into an equivalent GLOB pattern.
///
/// GLOB is case-sensitive regardless of connection settings, LIKE is not.
pub fn like_to_glob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '%' => out.push('*'),
            '_' => out.push('?'),
            '*' => out.push_str("[*]"),
            '?' => out.push_str("[?]"),
            '[' => out.push_str("[[]"),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// Column value helpers
// =============================================================================

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Stored milliseconds to an instant; out-of-range values clamp to the epoch.
pub fn datetime_from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// CIDR text plus range bounds for an address column.
pub fn inet_values(net: Option<&IpNet>) -> (Option<String>, Option<Vec<u8>>, Option<Vec<u8>>) {
    match net {
        Some(n) => {
            let (start, end) = network_range(n);
            (Some(n.to_string()), Some(start), Some(end))
        }
        None => (None, None, None),
    }
}

/// Read an address column; unreadable text is treated as not set.
pub fn inet_from_column(text: Option<String>) -> Option<IpNet> {
    text.and_then(|t| parse_inet(&t))
}

/// Read a MAC column; unreadable text is treated as not set.
pub fn mac_from_column(text: Option<String>) -> Option<MacAddr> {
    text.and_then(|t| MacAddr::from_str(&t).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::spec::{FilterField, FilterKind, FilterSpec, DEFAULT_LIMIT};
    use std::collections::HashMap;

    const FIELDS: &[FilterField] = &[
        FilterField::new("name_f", "name", FilterKind::IPattern),
        FilterField::new("descr_f", "descr", FilterKind::Pattern).with_sentinels(),
        FilterField::new("ip_f", "ip", FilterKind::Network).with_sentinels(),
    ];
    const SPEC: FilterSpec = FilterSpec {
        fields: FIELDS,
        default_limit: DEFAULT_LIMIT,
    };

    fn args(pairs: &[(&str, &str)]) -> ListArgs {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ListArgs::from_params(&params, &SPEC)
    }

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE items (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                descr TEXT,
                ip TEXT, ip_start BLOB, ip_end BLOB,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );",
        )
        .unwrap();

        let rows: &[(&str, Option<&str>, Option<&str>, i64)] = &[
            ("core-1", Some("Core Router"), Some("10.0.0.1"), 1000),
            ("CORE-2", Some(""), Some("10.0.0.2"), 2000),
            ("edge-1", None, Some("10.0.1.1"), 3000),
            ("edge-2", Some("core uplink"), None, 4000),
        ];
        for (name, descr, ip, ts) in rows {
            let (ip_text, start, end) = inet_values(ip.and_then(parse_inet).as_ref());
            conn.execute(
                "INSERT INTO items (name, descr, ip, ip_start, ip_end, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                rusqlite::params![name, descr, ip_text, start, end, ts],
            )
            .unwrap();
        }
        conn
    }

    fn names(conn: &Connection, args: &ListArgs) -> Vec<String> {
        ListQuery::new("items", "name")
            .filtered(args)
            .paged(args)
            .fetch(conn, |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_like_to_glob() {
        assert_eq!(like_to_glob("%core_1%"), "*core?1*");
        assert_eq!(like_to_glob("a*b?[c"), "a[*]b[?][[]c");
    }

    #[test]
    fn test_unfiltered_sql() {
        let q = ListQuery::new("items", "id, name").paged(&ListArgs::unfiltered(100));
        assert_eq!(
            q.select_sql(),
            "SELECT id, name FROM items ORDER BY id ASC LIMIT 100 OFFSET 0"
        );
        assert_eq!(q.count_sql(), "SELECT COUNT(*) FROM items");
        assert!(q.values().is_empty());
    }

    #[test]
    fn test_no_filter_matches_everything() {
        let conn = test_db();
        assert_eq!(names(&conn, &args(&[])).len(), 4);
    }

    #[test]
    fn test_case_sensitivity() {
        let conn = test_db();
        assert_eq!(names(&conn, &args(&[("name_f", "core%")])), vec!["core-1", "CORE-2"]);
        assert_eq!(names(&conn, &args(&[("descr_f", "core%")])), vec!["edge-2"]);
        assert_eq!(names(&conn, &args(&[("descr_f", "%Core%")])), vec!["core-1"]);
    }

    #[test]
    fn test_null_and_empty_sentinels() {
        let conn = test_db();
        assert_eq!(names(&conn, &args(&[("descr_f", "isnull")])), vec!["edge-1"]);
        assert_eq!(names(&conn, &args(&[("descr_f", "isempty")])), vec!["CORE-2"]);
        assert_eq!(names(&conn, &args(&[("ip_f", "isnull")])), vec!["edge-2"]);
        // absent filter: no constraint at all
        assert_eq!(names(&conn, &args(&[("descr_f", "")])).len(), 4);
    }

    #[test]
    fn test_network_containment() {
        let conn = test_db();
        assert_eq!(
            names(&conn, &args(&[("ip_f", "10.0.0.0/24")])),
            vec!["core-1", "CORE-2"]
        );
        assert_eq!(names(&conn, &args(&[("ip_f", "10.0.1.1")])), vec!["edge-1"]);
        assert_eq!(names(&conn, &args(&[("ip_f", "10.0.0.0/8")])).len(), 3);
        assert!(names(&conn, &args(&[("ip_f", "2001:db8::/32")])).is_empty());
        // an IPv6 network never contains IPv4 rows, mapped range included
        assert!(names(&conn, &args(&[("ip_f", "::/0")])).is_empty());
        assert!(names(&conn, &args(&[("ip_f", "::ffff:10.0.0.0/120")])).is_empty());
        assert_eq!(names(&conn, &args(&[("ip_f", "0.0.0.0/0")])).len(), 3);
        // malformed network: filter not applied
        assert_eq!(names(&conn, &args(&[("ip_f", "not-an-ip")])).len(), 4);
    }

    #[test]
    fn test_time_bounds_and_paging() {
        let conn = test_db();
        assert_eq!(
            names(&conn, &args(&[("updated_ge", "2000"), ("updated_le", "3000")])),
            vec!["CORE-2", "edge-1"]
        );
        assert_eq!(
            names(&conn, &args(&[("limit", "2"), ("offset", "1")])),
            vec!["CORE-2", "edge-1"]
        );

        let a = args(&[("created_ge", "2500")]);
        let count = ListQuery::new("items", "name").filtered(&a).count(&conn).unwrap();
        assert_eq!(count, 2);
    }
}
