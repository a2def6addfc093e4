#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! netinv - a network inventory service
//!
//! netinv keeps an inventory of sites, devices, interfaces and the credentials
//! used to reach them in a local SQLite database, and serves it over a JSON REST
//! API. Credential secrets are encrypted at rest.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Filters, cipher, codec and database layers | `rusqlite`, `aes-gcm` |
//! | `server` | REST server | `axum`, `tokio`, `tower-http` |
//! | `cli` | `netinv` binary with server support | All above + `clap` |
//!
//! ```toml
//! # Library only: database and codec, no HTTP stack
//! netinv = { version = "0.3", default-features = false }
//!
//! # Default (CLI binary)
//! netinv = "0.3"
//! ```
//!
//! # Architecture
//!
//! - **[`filters`]**: nullable-type bridge and query-string filter parsing
//! - **[`crypto`]**: secret cipher for credential fields
//! - **[`codec`]**: payload/record/view conversion, including secret sealing
//! - **[`database`]**: SQLite connection, schema and per-entity repositories
//! - **[`config`]**: configuration file and environment handling
//! - **`server`**: REST handlers and router (feature `server`)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use netinv::codec::{DevicePayload, DeviceView, EntityCodec};
//! use netinv::database::InventoryDatabase;
//! use netinv::filters::ListArgs;
//! use netinv::NetinvConfig;
//! use std::sync::Arc;
//!
//! let config = NetinvConfig::new(&None)?;
//! let db = InventoryDatabase::open_in_dir(&config.data_dir)?;
//! let codec = EntityCodec::new(Arc::new(config.secret_cipher()?));
//!
//! let payload: DevicePayload = serde_json::from_str(r#"{"name": "core-1", "host_ip4": "192.0.2.1"}"#)?;
//! let id = db.devices().insert(&codec.to_storage(payload)?)?;
//!
//! let args = ListArgs::from_params(&params, &netinv::database::DEVICE_FILTERS);
//! for record in db.devices().list(&args)? {
//!     let view: DeviceView = codec.to_view(record)?;
//!     println!("{}", serde_json::to_string(&view)?);
//! }
//! ```

pub mod codec;
pub mod config;
pub mod crypto;
pub mod database;
pub mod filters;

#[cfg(feature = "server")]
pub mod server;

// =============================================================================
// Configuration
// =============================================================================

pub use config::{get_sqlite_info, NetinvConfig, SqliteDatabaseInfo, TableInfo};

// =============================================================================
// Filters, cipher and codec
// =============================================================================

pub use filters::{FilterSpec, ListArgs, MacAddr};

pub use crypto::{CipherError, SecretCipher};

pub use codec::{CodecError, EntityCodec, FieldError, FromRecord, IntoStorage, SecretFields};

// =============================================================================
// Database
// =============================================================================

pub use database::{DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus, SCHEMA_VERSION};

pub use database::InventoryDatabase;

// =============================================================================
// Server Module (REST API) - requires "server" feature
// =============================================================================

#[cfg(feature = "server")]
pub use server::{create_axum_router, create_router, start_server, ApiState, ServerConfig};
