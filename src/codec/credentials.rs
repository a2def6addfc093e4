use crate::codec::{
    required_text, CodecError, EntityCodec, FromRecord, IntoStorage, SecretFields,
};
use crate::database::{CredentialRecord, NewCredential};
use crate::filters::bridge::nullable_string;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CredentialPayload {
    pub username: String,
    /// Plaintext; empty or absent means no secret.
    #[serde(default)]
    pub secret: String,
    pub descr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialView {
    pub id: i64,
    pub username: String,
    pub secret: String,
    pub descr: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl SecretFields for NewCredential {
    fn secret_fields(&mut self) -> Vec<&mut String> {
        vec![&mut self.secret]
    }
}

impl SecretFields for CredentialView {
    fn secret_fields(&mut self) -> Vec<&mut String> {
        vec![&mut self.secret]
    }
}

impl IntoStorage for CredentialPayload {
    type New = NewCredential;

    fn into_new(self, codec: &EntityCodec) -> Result<NewCredential, CodecError> {
        let mut new = NewCredential {
            username: required_text("username", self.username)?,
            secret: self.secret,
            descr: nullable_string(self.descr),
        };
        codec.encrypt_fields(&mut new)?;
        Ok(new)
    }
}

impl FromRecord for CredentialView {
    type Record = CredentialRecord;

    fn from_record(record: CredentialRecord, codec: &EntityCodec) -> Result<Self, CodecError> {
        let mut view = CredentialView {
            id: record.id,
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
