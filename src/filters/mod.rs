//! Request filter translation
//!
//! - `bridge`: lenient conversions between wire scalars and storage nullable types
//! - `spec`: per-endpoint filter declarations and the predicates they produce
//! - `params`: query-string parsing into [`ListArgs`]

pub mod bridge;
pub mod params;
pub mod spec;

pub use bridge::{parse_inet, parse_mac, parse_millis, MacAddr};
pub use params::{ListArgs, PageSpec, TimeRange};
pub use spec::{
    ColumnPredicate, FilterField, FilterKind, FilterSpec, Predicate, DEFAULT_LIMIT,
    LARGE_DEFAULT_LIMIT, MAX_LIMIT, SENTINEL_EMPTY, SENTINEL_NULL,
};
