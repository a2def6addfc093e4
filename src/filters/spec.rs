//! Per-endpoint filter declarations and the predicates they produce

use crate::filters::bridge::MacAddr;
use ipnet::IpNet;

/// Literal filter value selecting rows where the column is NULL.
pub const SENTINEL_NULL: &str = "isnull";

/// Literal filter value selecting rows where the column is an empty string.
pub const SENTINEL_EMPTY: &str = "isempty";

/// How a filter value is matched against its column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Exact string equality
    Exact,
    /// Case-sensitive pattern (`%` and `_` wildcards)
    Pattern,
    /// Case-insensitive pattern (`%` and `_` wildcards)
    IPattern,
    /// Exact integer equality
    Int,
    /// Integer bounds read from `<key>_ge` and `<key>_le`
    IntRange,
    /// Column address lies within the given network
    Network,
    /// Exact hardware address equality
    Mac,
}

/// A recognized query parameter and the column it constrains
#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub key: &'static str,
    pub column: &'static str,
    pub kind: FilterKind,
    /// Whether `isnull`/`isempty` are treated as predicates on this field
    pub sentinels: bool,
}

impl FilterField {
    pub const fn new(key: &'static str, column: &'static str, kind: FilterKind) -> Self {
        Self {
            key,
            column,
            kind,
            sentinels: false,
        }
    }

    pub const fn with_sentinels(mut self) -> Self {
        self.sentinels = true;
        self
    }
}

/// The filters an endpoint recognizes, plus its default page size
#[derive(Debug, Clone, Copy)]
pub struct FilterSpec {
    pub fields: &'static [FilterField],
    pub default_limit: u32,
}

/// Default page size for endpoints over small tables.
pub const DEFAULT_LIMIT: u32 = 100;

/// Default page size for endpoints over large tables.
pub const LARGE_DEFAULT_LIMIT: u32 = 1000;

/// Upper bound accepted for `limit`.
pub const MAX_LIMIT: u32 = 1000;

/// A single constraint on a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Equals(String),
    Like(String),
    ILike(String),
    IntEquals(i64),
    IntAtLeast(i64),
    IntAtMost(i64),
    WithinNetwork(IpNet),
    MacEquals(MacAddr),
    IsNull,
    IsEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPredicate {
    pub column: &'static str,
    pub predicate: Predicate,
}
