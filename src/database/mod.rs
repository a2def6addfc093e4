//! Database module
//!
//! All persistent storage for netinv, organized into:
//!
//! - **core**: SQLite connections, schema management, filtered queries
//! - **inventory**: the inventory database and its per-entity repositories
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/              # Foundation
//! │   ├── connection     # SQLite DatabaseConn wrapper
//! │   ├── schema         # Table definitions and SchemaManager
//! │   └── query          # ListQuery: ListArgs -> parameterized SQL
//! │
//! └── inventory/         # Persistent storage
//!     ├── sites
//!     ├── devices
//!     ├── interfaces
//!     ├── credentials
//!     ├── device_credentials
//!     └── snmp_credentials
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use netinv::database::InventoryDatabase;
//! use netinv::filters::ListArgs;
//!
//! let db = InventoryDatabase::open_in_dir("~/.netinv")?;
//! let args = ListArgs::from_params(&params, &netinv::database::DEVICE_FILTERS);
//! let devices = db.devices().list(&args)?;
//! ```

pub mod core;
pub mod inventory;

pub use core::{DatabaseConn, ListQuery, SchemaDefinitions, SchemaManager, SchemaStatus, SCHEMA_VERSION};

pub use inventory::{ensure_data_dir, is_constraint_violation, InventoryDatabase};

pub use inventory::{
    CredentialRecord, CredentialRepository, NewCredential, CREDENTIAL_FILTERS,
};
pub use inventory::{
    DeviceCredentialRecord, DeviceCredentialRepository, NewDeviceCredential,
    DEVICE_CREDENTIAL_FILTERS,
};
pub use inventory::{DeviceRecord, DeviceRepository, NewDevice, DEVICE_FILTERS};
pub use inventory::{InterfaceRecord, InterfaceRepository, NewInterface, INTERFACE_FILTERS};
pub use inventory::{NewSite, SiteRecord, SiteRepository, SITE_FILTERS};
pub use inventory::{
    NewSnmpCredential, SnmpCredentialRecord, SnmpCredentialRepository, SNMP_CREDENTIAL_FILTERS,
};
