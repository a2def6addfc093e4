use crate::codec::{required_text, CodecError, EntityCodec, FromRecord, IntoStorage};
use crate::database::{DeviceRecord, NewDevice};
use crate::filters::bridge::{
    inet_to_string, mac_to_string, non_zero, nullable_string, parse_inet4, parse_inet6, parse_mac,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Addresses and MACs are lenient: an unparsable value, or an address of the
/// wrong family for its field, leaves the field unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DevicePayload {
    pub name: String,
    pub site_id: Option<i64>,
    pub host_ip4: Option<String>,
    pub host_ip6: Option<String>,
    pub mac: Option<String>,
    pub sys_name: Option<String>,
    pub descr: Option<String>,
    pub credential_id: Option<i64>,
    pub snmp_credential_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceView {
    pub id: i64,
    pub name: String,
    pub site_id: Option<i64>,
    pub host_ip4: Option<String>,
    pub host_ip6: Option<String>,
    pub mac: Option<String>,
    pub sys_name: Option<String>,
    pub descr: Option<String>,
    pub credential_id: Option<i64>,
    pub snmp_credential_id: Option<i64>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl IntoStorage for DevicePayload {
    type New = NewDevice;

    fn into_new(self, _codec: &EntityCodec) -> Result<NewDevice, CodecError> {
        Ok(NewDevice {
            name: required_text("name", self.name)?,
            site_id: non_zero(self.site_id),
            host_ip4: self.host_ip4.as_deref().and_then(parse_inet4),
            host_ip6: self.host_ip6.as_deref().and_then(parse_inet6),
            mac: self.mac.as_deref().and_then(parse_mac),
            sys_name: nullable_string(self.sys_name),
            descr: nullable_string(self.descr),
            credential_id: non_zero(self.credential_id),
            snmp_credential_id: non_zero(self.snmp_credential_id),
        })
    }
}

impl FromRecord for DeviceView {
    type Record = DeviceRecord;

    fn from_record(record: DeviceRecord, _codec: &EntityCodec) -> Result<Self, CodecError> {
        Ok(DeviceView {
            id: record.id,
            name: record.name,
            site_id: record.site_id,
            host_ip4: inet_to_string(record.host_ip4.as_ref()),
            host_ip6: inet_to_string(record.host_ip6.as_ref()),
            mac: mac_to_string(record.mac.as_ref()),
            sys_name: record.sys_name,
            descr: record.descr,
            credential_id: record.credential_id,
            snmp_credential_id: record.snmp_credential_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}
