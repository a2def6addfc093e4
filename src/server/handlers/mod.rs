//! REST resource definitions
//!
//! Each resource implements [`Resource`](crate::server::handler::Resource) and is
//! served by the generic handlers in [`crate::server::handler`].
//!
//! - `sites` - `/api/sites`
//! - `devices` - `/api/devices`, `/api/interfaces`
//! - `credentials` - `/api/credentials`, `/api/device-credentials`, `/api/snmp-credentials`

pub mod credentials;
pub mod devices;
pub mod sites;

pub use credentials::{CredentialResource, DeviceCredentialResource, SnmpCredentialResource};
pub use devices::{DeviceResource, InterfaceResource};
pub use sites::SiteResource;
