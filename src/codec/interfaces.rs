use crate::codec::{required_id, required_text, CodecError, EntityCodec, FromRecord, IntoStorage};
use crate::database::{InterfaceRecord, NewInterface};
use crate::filters::bridge::{
    inet_to_string, mac_to_string, nullable_int, nullable_string, parse_inet4, parse_mac,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InterfacePayload {
    pub device_id: i64,
    pub ifindex: Option<i64>,
    pub name: String,
    pub descr: Option<String>,
    pub alias: Option<String>,
    pub mac: Option<String>,
    pub ip4: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceView {
    pub id: i64,
    pub device_id: i64,
    pub ifindex: Option<i64>,
    pub name: String,
    pub descr: Option<String>,
    pub alias: Option<String>,
    pub mac: Option<String>,
    pub ip4: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl IntoStorage for InterfacePayload {
    type New = NewInterface;

    fn into_new(self, _codec: &EntityCodec) -> Result<NewInterface, CodecError> {
        Ok(NewInterface {
            device_id: required_id("device_id", self.device_id)?,
            ifindex: nullable_int(self.ifindex),
            name: required_text("name", self.name)?,
            descr: nullable_string(self.descr),
            alias: nullable_string(self.alias),
            mac: self.mac.as_deref().and_then(parse_mac),
            ip4: self.ip4.as_deref().and_then(parse_inet4),
        })
    }
}

impl FromRecord for InterfaceView {
    type Record = InterfaceRecord;

    fn from_record(record: InterfaceRecord, _codec: &EntityCodec) -> Result<Self, CodecError> {
        Ok(InterfaceView {
            id: record.id,
            device_id: record.device_id,
            ifindex: record.ifindex,
            name: record.name,
            descr: record.descr,
            alias: record.alias,
            mac: mac_to_string(record.mac.as_ref()),
            ip4: inet_to_string(record.ip4.as_ref()),
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::codec;
    use crate::codec::FieldError;

    #[test]
    fn test_missing_device_rejected() {
        let payload = InterfacePayload {
            name: "eth0".to_string(),
            ..Default::default()
        };
        assert_eq!(
            codec("k").to_storage(payload),
            Err(CodecError::Field(FieldError::new(
                "device_id",
                "must be a positive id"
            )))
        );
    }

    #[test]
    fn test_ifindex_zero_is_kept() {
        let payload: InterfacePayload =
            serde_json::from_str(r#"{"device_id": 1, "name": "eth0", "ifindex": 0, "ip4": "10.1.1.1/30"}"#)
                .unwrap();
        let new = codec("k").to_storage(payload).unwrap();
        assert_eq!(new.ifindex, Some(0));
        assert_eq!(new.ip4.map(|n| n.to_string()).as_deref(), Some("10.1.1.1/30"));
    }

    #[test]
    fn test_ipv6_in_ip4_is_unset() {
        let payload: InterfacePayload =
            serde_json::from_str(r#"{"device_id": 1, "name": "eth0", "ip4": "2001:db8::1"}"#)
                .unwrap();
        let new = codec("k").to_storage(payload).unwrap();
        assert_eq!(new.ip4, None);
    }
}
