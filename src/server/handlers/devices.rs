//! Device and interface endpoints (`/api/devices`, `/api/interfaces`)

use crate::codec::{DevicePayload, DeviceView, InterfacePayload, InterfaceView};
use crate::database::{
    DeviceRecord, InterfaceRecord, InventoryDatabase, NewDevice, NewInterface, DEVICE_FILTERS,
    INTERFACE_FILTERS,
};
use crate::filters::{FilterSpec, ListArgs};
use crate::server::handler::Resource;
use anyhow::Result;

// =============================================================================
// devices
// =============================================================================

pub struct DeviceResource;

impl Resource for DeviceResource {
    const NAME: &'static str = "device";
    const PLURAL: &'static str = "devices";
    const FILTERS: FilterSpec = DEVICE_FILTERS;

    type Payload = DevicePayload;
    type New = NewDevice;
    type Record = DeviceRecord;
    type View = DeviceView;

    fn list(db: &InventoryDatabase, args: &ListArgs) -> Result<Vec<DeviceRecord>> {
        db.devices().list(args)
    }

    fn count(db: &InventoryDatabase, args: &ListArgs) -> Result<u64> {
        db.devices().count(args)
    }

    fn get(db: &InventoryDatabase, id: i64) -> Result<Option<DeviceRecord>> {
        db.devices().get(id)
    }

    fn insert(db: &InventoryDatabase, new: &NewDevice) -> Result<i64> {
        db.devices().insert(new)
    }

    fn update(db: &InventoryDatabase, id: i64, new: &NewDevice) -> Result<bool> {
        db.devices().update(id, new)
    }

    fn delete(db: &InventoryDatabase, id: i64) -> Result<bool> {
        db.devices().delete(id)
    }
}

// =============================================================================
// interfaces
// =============================================================================

pub struct InterfaceResource;

impl Resource for InterfaceResource {
    const NAME: &'static str = "interface";
    const PLURAL: &'static str = "interfaces";
    const FILTERS: FilterSpec = INTERFACE_FILTERS;

    type Payload = InterfacePayload;
    type New = NewInterface;
    type Record = InterfaceRecord;
    type View = InterfaceView;

    fn list(db: &InventoryDatabase, args: &ListArgs) -> Result<Vec<InterfaceRecord>> {
        db.interfaces().list(args)
    }

    fn count(db: &InventoryDatabase, args: &ListArgs) -> Result<u64> {
        db.interfaces().count(args)
    }

    fn get(db: &InventoryDatabase, id: i64) -> Result<Option<InterfaceRecord>> {
        db.interfaces().get(id)
    }

    fn insert(db: &InventoryDatabase, new: &NewInterface) -> Result<i64> {
        db.interfaces().insert(new)
    }

    fn update(db: &InventoryDatabase, id: i64, new: &NewInterface) -> Result<bool> {
        db.interfaces().update(id, new)
    }

    fn delete(db: &InventoryDatabase, id: i64) -> Result<bool> {
        db.interfaces().delete(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::handler::{create, list};
    use crate::server::tests::test_state;
    use axum::body::Bytes;
    use axum::extract::{Query, State};
    use axum::Json;
    use std::collections::HashMap;

    fn body(json: serde_json::Value) -> Bytes {
        Bytes::from(serde_json::to_vec(&json).unwrap())
    }

    #[tokio::test]
    async fn test_device_network_filter_over_api() {
        let state = test_state("k");
        for (name, ip) in [("a", "10.0.0.1"), ("b", "10.0.1.1"), ("c", "bogus")] {
            create::<DeviceResource>(
                State(state.clone()),
                body(serde_json::json!({"name": name, "host_ip4": ip})),
            )
            .await
            .unwrap();
        }

        let mut params = HashMap::new();
        params.insert("host_ip4_f".to_string(), "10.0.0.0/24".to_string());
        let Json(found) = list::<DeviceResource>(State(state.clone()), Query(params))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].host_ip4.as_deref(), Some("10.0.0.1/32"));

        // the unparsable address was stored as unset
        let mut params = HashMap::new();
        params.insert("host_ip4_f".to_string(), "isnull".to_string());
        let Json(found) = list::<DeviceResource>(State(state), Query(params))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "c");
    }

    #[tokio::test]
    async fn test_interface_mac_filter_over_api() {
        let state = test_state("k");
        let (_, Json(device)) = create::<DeviceResource>(
            State(state.clone()),
            body(serde_json::json!({"name": "core-1"})),
        )
        .await
        .unwrap();
        for (ifindex, mac) in [(1, "00:00:5e:00:53:01"), (2, "00:00:5e:00:53:02")] {
            create::<InterfaceResource>(
                State(state.clone()),
                body(serde_json::json!({
                    "device_id": device.id,
                    "ifindex": ifindex,
                    "name": format!("eth{}", ifindex),
                    "mac": mac,
                })),
            )
            .await
            .unwrap();
        }

        let mut params = HashMap::new();
        params.insert("mac_f".to_string(), "0000.5e00.5302".to_string());
        let Json(found) = list::<InterfaceResource>(State(state), Query(params))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "eth2");
        assert_eq!(found[0].mac.as_deref(), Some("00:00:5e:00:53:02"));
    }
}
