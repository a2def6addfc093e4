use crate::codec::{required_text, CodecError, EntityCodec, FromRecord, IntoStorage};
use crate::database::{NewSite, SiteRecord};
use crate::filters::bridge::nullable_string;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SitePayload {
    pub name: String,
    pub descr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteView {
    pub id: i64,
    pub name: String,
    pub descr: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl IntoStorage for SitePayload {
    type New = NewSite;

    fn into_new(self, _codec: &EntityCodec) -> Result<NewSite, CodecError> {
        Ok(NewSite {
            name: required_text("name", self.name)?,
            descr: nullable_string(self.descr),
        })
    }
}

impl FromRecord for SiteView {
    type Record = SiteRecord;

    fn from_record(record: SiteRecord, _codec: &EntityCodec) -> Result<Self, CodecError> {
        Ok(SiteView {
            id: record.id,
            name: record.name,
            descr: record.descr,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}
