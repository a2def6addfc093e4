use crate::codec::{
    required_id, required_text, CodecError, EntityCodec, FromRecord, IntoStorage, SecretFields,
};
use crate::database::{DeviceCredentialRecord, NewDeviceCredential};
use crate::filters::bridge::nullable_string;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceCredentialPayload {
    pub device_id: i64,
    pub username: String,
    #[serde(default)]
    pub secret: String,
    pub descr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceCredentialView {
    pub id: i64,
    pub device_id: i64,
    pub username: String,
    pub secret: String,
    pub descr: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl SecretFields for NewDeviceCredential {
    fn secret_fields(&mut self) -> Vec<&mut String> {
        vec![&mut self.secret]
    }
}

impl SecretFields for DeviceCredentialView {
    fn secret_fields(&mut self) -> Vec<&mut String> {
        vec![&mut self.secret]
    }
}

impl IntoStorage for DeviceCredentialPayload {
    type New = NewDeviceCredential;

    fn into_new(self, codec: &EntityCodec) -> Result<NewDeviceCredential, CodecError> {
        let mut new = NewDeviceCredential {
            device_id: required_id("device_id", self.device_id)?,
            username: required_text("username", self.username)?,
            secret: self.secret,
            descr: nullable_string(self.descr),
        };
        codec.encrypt_fields(&mut new)?;
        Ok(new)
    }
}

impl FromRecord for DeviceCredentialView {
    type Record = DeviceCredentialRecord;

    fn from_record(
        record: DeviceCredentialRecord,
        codec: &EntityCodec,
    ) -> Result<Self, CodecError> {
        let mut view = DeviceCredentialView {
            id: record.id,
            device_id: record.device_id,
            username: record.username,
            secret: record.secret,
            descr: record.descr,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        codec.decrypt_fields(&mut view)?;
        Ok(view)
    }
}
