use crate::codec::{
    required_text, CodecError, EntityCodec, FieldError, FromRecord, IntoStorage, SecretFields,
};
use crate::database::{NewSnmpCredential, SnmpCredentialRecord};
use crate::filters::bridge::{non_empty, nullable_string};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// SNMP protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnmpVersion {
    #[serde(rename = "1")]
    V1,
    #[serde(rename = "2c")]
    V2c,
    #[serde(rename = "3")]
    V3,
}

impl SnmpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnmpVersion::V1 => "1",
            SnmpVersion::V2c => "2c",
            SnmpVersion::V3 => "3",
        }
    }
}

impl FromStr for SnmpVersion {
    type Err = FieldError;

    /// Accepts `1`, `2c` and `3`, optionally prefixed with `v`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.strip_prefix('v').unwrap_or(&lower) {
            "1" => Ok(SnmpVersion::V1),
            "2c" => Ok(SnmpVersion::V2c),
            "3" => Ok(SnmpVersion::V3),
            _ => Err(FieldError::new("version", "expected one of 1, 2c, 3")),
        }
    }
}

impl Display for SnmpVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SnmpCredentialPayload {
    pub name: String,
    pub version: String,
    pub security_name: Option<String>,
    pub auth_protocol: Option<String>,
    #[serde(default)]
    pub auth_passphrase: String,
    pub priv_protocol: Option<String>,
    #[serde(default)]
    pub priv_passphrase: String,
    pub descr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnmpCredentialView {
    pub id: i64,
    pub name: String,
    pub version: SnmpVersion,
    pub security_name: Option<String>,
    pub auth_protocol: Option<String>,
    pub auth_passphrase: String,
    pub priv_protocol: Option<String>,
    pub priv_passphrase: String,
    pub descr: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl SecretFields for NewSnmpCredential {
    fn secret_fields(&mut self) -> Vec<&mut String> {
        vec![&mut self.auth_passphrase, &mut self.priv_passphrase]
    }
}

impl SecretFields for SnmpCredentialView {
    fn secret_fields(&mut self) -> Vec<&mut String> {
        vec![&mut self.auth_passphrase, &mut self.priv_passphrase]
    }
}

impl IntoStorage for SnmpCredentialPayload {
    type New = NewSnmpCredential;

    fn into_new(self, codec: &EntityCodec) -> Result<NewSnmpCredential, CodecError> {
        let version: SnmpVersion = self.version.parse()?;
        let mut new = NewSnmpCredential {
            name: required_text("name", self.name)?,
            version: version.to_string(),
            security_name: nullable_string(self.security_name),
            // an empty protocol name means no protocol
            auth_protocol: non_empty(self.auth_protocol),
            auth_passphrase: self.auth_passphrase,
            priv_protocol: non_empty(self.priv_protocol),
            priv_passphrase: self.priv_passphrase,
            descr: nullable_string(self.descr),
        };
        codec.encrypt_fields(&mut new)?;
        Ok(new)
    }
}

impl FromRecord for SnmpCredentialView {
    type Record = SnmpCredentialRecord;

    fn from_record(record: SnmpCredentialRecord, codec: &EntityCodec) -> Result<Self, CodecError> {
        let mut view = SnmpCredentialView {
            id: record.id,
            name: record.name,
            version: record.version.parse().map_err(CodecError::Stored)?,
            security_name: record.security_name,
            auth_protocol: record.auth_protocol,
            auth_passphrase: record.auth_passphrase,
            priv_protocol: record.priv_protocol,
            priv_passphrase: record.priv_passphrase,
            descr: record.descr,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        codec.decrypt_fields(&mut view)?;
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::codec;
    use crate::database::InventoryDatabase;

    #[test]
    fn test_version_parsing() {
        assert_eq!("2c".parse::<SnmpVersion>().unwrap(), SnmpVersion::V2c);
        assert_eq!("v3".parse::<SnmpVersion>().unwrap(), SnmpVersion::V3);
        assert_eq!(" 1 ".parse::<SnmpVersion>().unwrap(), SnmpVersion::V1);
        assert!("2".parse::<SnmpVersion>().is_err());
        assert!("".parse::<SnmpVersion>().is_err());
    }

    #[test]
    fn test_invalid_version_is_field_error() {
        let payload = SnmpCredentialPayload {
            name: "ops".to_string(),
            version: "4".to_string(),
            ..Default::default()
        };
        let err = codec("k").to_storage(payload).unwrap_err();
        assert!(matches!(err, CodecError::Field(ref f) if f.field == "version"));
    }

    #[test]
    fn test_unreadable_stored_version() {
        let now = Utc::now();
        let record = SnmpCredentialRecord {
            id: 1,
            name: "ops".to_string(),
            version: "9".to_string(),
            security_name: None,
            auth_protocol: None,
            auth_passphrase: String::new(),
            priv_protocol: None,
            priv_passphrase: String::new(),
            descr: None,
            created_at: now,
            updated_at: now,
        };
        let err = codec("k").to_view::<SnmpCredentialView>(record).unwrap_err();
        assert!(matches!(err, CodecError::Stored(ref f) if f.field == "version"));
    }

    #[test]
    fn test_both_passphrases_roundtrip() {
        let c = codec("k");
        let db = InventoryDatabase::open_in_memory().unwrap();
        let payload: SnmpCredentialPayload = serde_json::from_str(
            r#"{
                "name": "v3-ops",
                "version": "3",
                "security_name": "ops",
                "auth_protocol": "SHA",
                "auth_passphrase": "auth-pass-123",
                "priv_protocol": "AES",
                "priv_passphrase": "priv-pass-456"
            }"#,
        )
        .unwrap();
        let new = c.to_storage(payload).unwrap();
        assert_ne!(new.auth_passphrase, "auth-pass-123");
        assert_ne!(new.priv_passphrase, "priv-pass-456");
        assert_eq!(new.version, "3");

        let id = db.snmp_credentials().insert(&new).unwrap();
        let view: SnmpCredentialView = c
            .to_view(db.snmp_credentials().get(id).unwrap().unwrap())
            .unwrap();
        assert_eq!(view.auth_passphrase, "auth-pass-123");
        assert_eq!(view.priv_passphrase, "priv-pass-456");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["version"], "3");
    }

    #[test]
    fn test_v2c_without_passphrases() {
        let c = codec("k");
        let new = c
            .to_storage(SnmpCredentialPayload {
                name: "public-ro".to_string(),
                version: "2C".to_string(),
                auth_protocol: Some(String::new()),
                security_name: Some(String::new()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(new.version, "2c");
        assert_eq!(new.auth_protocol, None);
        assert_eq!(new.security_name, Some(String::new()));
        assert_eq!(new.auth_passphrase, "");
        assert_eq!(new.priv_passphrase, "");
    }
}
