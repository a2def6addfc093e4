//! Core database infrastructure
//!
//! - `DatabaseConn`: SQLite connection wrapper with configuration
//! - `SchemaManager`: schema initialization and management
//! - `SchemaStatus`: schema state enumeration
//! - `ListQuery`: filtered listing and count queries

mod connection;
mod query;
mod schema;

pub use connection::DatabaseConn;
pub use query::{
    datetime_from_millis, inet_from_column, inet_values, like_to_glob, mac_from_column,
    now_millis, ListQuery,
};
pub use schema::{SchemaDefinitions, SchemaManager, SchemaStatus, SCHEMA_VERSION};
