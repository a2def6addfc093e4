//! Conversion between wire payloads, storage rows and response views
//!
//! Each entity kind has a request payload (`<Entity>Payload`), a storage argument
//! (`New<Entity>`), a storage row (`<Entity>Record`) and a response view
//! (`<Entity>View`):
//!
//! ```text
//! Payload --IntoStorage--> New<Entity> --repository--> Record --FromRecord--> View
//! ```
//!
//! Entities carrying secrets implement [`SecretFields`] on both their storage
//! argument and their view, so sealing on write and opening on read happen in one
//! place ([`EntityCodec`]) for every entity kind.

mod credentials;
mod device_credentials;
mod devices;
mod interfaces;
mod sites;
mod snmp_credentials;

pub use credentials::{CredentialPayload, CredentialView};
pub use device_credentials::{DeviceCredentialPayload, DeviceCredentialView};
pub use devices::{DevicePayload, DeviceView};
pub use interfaces::{InterfacePayload, InterfaceView};
pub use sites::{SitePayload, SiteView};
pub use snmp_credentials::{SnmpCredentialPayload, SnmpCredentialView, SnmpVersion};

use crate::crypto::{CipherError, SecretCipher};
use std::sync::Arc;
use thiserror::Error;

/// A mandatory payload field that is missing or unparsable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for field '{field}': {reason}")]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// A value read back from storage that cannot be interpreted
    #[error("stored {0}")]
    Stored(FieldError),
}

/// An entity's secret-bearing string fields
pub trait SecretFields {
    fn secret_fields(&mut self) -> Vec<&mut String>;
}

/// Request payload to storage argument
pub trait IntoStorage {
    type New;

    fn into_new(self, codec: &EntityCodec) -> Result<Self::New, CodecError>;
}

/// Storage row to response view
pub trait FromRecord: Sized {
    type Record;

    fn from_record(record: Self::Record, codec: &EntityCodec) -> Result<Self, CodecError>;
}

/// Applies the process-wide [`SecretCipher`] to entity secret fields.
///
/// An empty secret means "no secret set": it is stored and returned as an empty
/// string and the cipher is never invoked for it.
#[derive(Debug, Clone)]
pub struct EntityCodec {
    cipher: Arc<SecretCipher>,
}

impl EntityCodec {
    pub fn new(cipher: Arc<SecretCipher>) -> Self {
        Self { cipher }
    }

    pub fn seal(&self, plaintext: &str) -> Result<String, CipherError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        self.cipher.encrypt(plaintext)
    }

    pub fn open(&self, stored: &str) -> Result<String, CipherError> {
        if stored.is_empty() {
            return Ok(String::new());
        }
        self.cipher.decrypt(stored)
    }

    /// Seal every secret field of `entity` in place.
    pub fn encrypt_fields<T: SecretFields>(&self, entity: &mut T) -> Result<(), CipherError> {
        for field in entity.secret_fields() {
            *field = self.seal(field)?;
        }
        Ok(())
    }

    /// Open every secret field of `entity` in place.
    ///
    /// Fails on the first field that cannot be opened; the entity must then be
    /// discarded.
    pub fn decrypt_fields<T: SecretFields>(&self, entity: &mut T) -> Result<(), CipherError> {
        for field in entity.secret_fields() {
            *field = self.open(field)?;
        }
        Ok(())
    }

    /// Convert a request payload into a storage argument.
    pub fn to_storage<P: IntoStorage>(&self, payload: P) -> Result<P::New, CodecError> {
        payload.into_new(self)
    }

    /// Convert a storage row into a response view.
    pub fn to_view<V: FromRecord>(&self, record: V::Record) -> Result<V, CodecError> {
        V::from_record(record, self)
    }
}

/// Reject a mandatory text field that is empty after trimming.
pub(crate) fn required_text(field: &'static str, value: String) -> Result<String, FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::new(field, "must not be empty"));
    }
    Ok(value)
}

/// Reject a mandatory reference that is not a positive id.
pub(crate) fn required_id(field: &'static str, value: i64) -> Result<i64, FieldError> {
    if value <= 0 {
        return Err(FieldError::new(field, "must be a positive id"));
    }
    Ok(value)
}
