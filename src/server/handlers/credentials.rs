//! Credential endpoints
//!
//! - `/api/credentials`
//! - `/api/device-credentials`
//! - `/api/snmp-credentials`
//!
//! Secrets are returned in plaintext; they are sealed only at rest.

use crate::codec::{
    CredentialPayload, CredentialView, DeviceCredentialPayload, DeviceCredentialView,
    SnmpCredentialPayload, SnmpCredentialView,
};
use crate::database::{
    CredentialRecord, DeviceCredentialRecord, InventoryDatabase, NewCredential,
    NewDeviceCredential, NewSnmpCredential, SnmpCredentialRecord, CREDENTIAL_FILTERS,
    DEVICE_CREDENTIAL_FILTERS, SNMP_CREDENTIAL_FILTERS,
};
use crate::filters::{FilterSpec, ListArgs};
use crate::server::handler::Resource;
use anyhow::Result;

pub struct CredentialResource;

impl Resource for CredentialResource {
    const NAME: &'static str = "credential";
    const PLURAL: &'static str = "credentials";
    const FILTERS: FilterSpec = CREDENTIAL_FILTERS;

    type Payload = CredentialPayload;
    type New = NewCredential;
    type Record = CredentialRecord;
    type View = CredentialView;

    fn list(db: &InventoryDatabase, args: &ListArgs) -> Result<Vec<CredentialRecord>> {
        db.credentials().list(args)
    }

    fn count(db: &InventoryDatabase, args: &ListArgs) -> Result<u64> {
        db.credentials().count(args)
    }

    fn get(db: &InventoryDatabase, id: i64) -> Result<Option<CredentialRecord>> {
        db.credentials().get(id)
    }

    fn insert(db: &InventoryDatabase, new: &NewCredential) -> Result<i64> {
        db.credentials().insert(new)
    }

    fn update(db: &InventoryDatabase, id: i64, new: &NewCredential) -> Result<bool> {
        db.credentials().update(id, new)
    }

    fn delete(db: &InventoryDatabase, id: i64) -> Result<bool> {
        db.credentials().delete(id)
    }
}

pub struct DeviceCredentialResource;

impl Resource for DeviceCredentialResource {
    const NAME: &'static str = "device credential";
    const PLURAL: &'static str = "device-credentials";
    const FILTERS: FilterSpec = DEVICE_CREDENTIAL_FILTERS;

    type Payload = DeviceCredentialPayload;
    type New = NewDeviceCredential;
    type Record = DeviceCredentialRecord;
    type View = DeviceCredentialView;

    fn list(db: &InventoryDatabase, args: &ListArgs) -> Result<Vec<DeviceCredentialRecord>> {
        db.device_credentials().list(args)
    }

    fn count(db: &InventoryDatabase, args: &ListArgs) -> Result<u64> {
        db.device_credentials().count(args)
    }

    fn get(db: &InventoryDatabase, id: i64) -> Result<Option<DeviceCredentialRecord>> {
        db.device_credentials().get(id)
    }

    fn insert(db: &InventoryDatabase, new: &NewDeviceCredential) -> Result<i64> {
        db.device_credentials().insert(new)
    }

    fn update(db: &InventoryDatabase, id: i64, new: &NewDeviceCredential) -> Result<bool> {
        db.device_credentials().update(id, new)
    }

    fn delete(db: &InventoryDatabase, id: i64) -> Result<bool> {
        db.device_credentials().delete(id)
    }
}

pub struct SnmpCredentialResource;

impl Resource for SnmpCredentialResource {
    const NAME: &'static str = "SNMP credential";
    const PLURAL: &'static str = "snmp-credentials";
    const FILTERS: FilterSpec = SNMP_CREDENTIAL_FILTERS;

    type Payload = SnmpCredentialPayload;
    type New = NewSnmpCredential;
    type Record = SnmpCredentialRecord;
    type View = SnmpCredentialView;

    fn list(db: &InventoryDatabase, args: &ListArgs) -> Result<Vec<SnmpCredentialRecord>> {
        db.snmp_credentials().list(args)
    }

    fn count(db: &InventoryDatabase, args: &ListArgs) -> Result<u64> {
        db.snmp_credentials().count(args)
    }

    fn get(db: &InventoryDatabase, id: i64) -> Result<Option<SnmpCredentialRecord>> {
        db.snmp_credentials().get(id)
    }

    fn insert(db: &InventoryDatabase, new: &NewSnmpCredential) -> Result<i64> {
        db.snmp_credentials().insert(new)
    }

    fn update(db: &InventoryDatabase, id: i64, new: &NewSnmpCredential) -> Result<bool> {
        db.snmp_credentials().update(id, new)
    }

    fn delete(db: &InventoryDatabase, id: i64) -> Result<bool> {
        db.snmp_credentials().delete(id)
    }
}
