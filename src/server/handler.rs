//! Resource trait, error type and generic REST handlers
//!
//! Every entity kind implements [`Resource`]; the handlers in this module are
//! generic over it, so one set of handler bodies serves every endpoint.
//!
//! Handlers do their database work while holding the connection lock and never
//! await while holding it. Secrets are sealed before the lock is taken and opened
//! after it is released.

use crate::codec::{CodecError, FieldError, FromRecord, IntoStorage};
use crate::crypto::CipherError;
use crate::database::{is_constraint_violation, InventoryDatabase};
use crate::filters::{FilterSpec, ListArgs};
use crate::server::ApiState;
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::MutexGuard;
use tracing::{debug, error};

// =============================================================================
// Errors
// =============================================================================

/// Error codes carried in error response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Request body is not valid JSON for the entity
    EncodingError,
    /// A mandatory payload field is invalid
    ParseError,
    /// No entity with the requested id
    NotFound,
    /// Uniqueness or reference constraint rejected the write
    ConstraintViolation,
    /// Datastore or cipher failure
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::EncodingError | ErrorCode::ParseError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ConstraintViolation => StatusCode::CONFLICT,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

const INTERNAL_MESSAGE: &str = "internal server error";

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EncodingError, message)
    }

    pub fn not_found(kind: &str, id: i64) -> Self {
        Self::new(ErrorCode::NotFound, format!("{} {} not found", kind, id))
    }

    /// The message never carries the cause; log it before calling this.
    pub fn internal() -> Self {
        Self::new(ErrorCode::InternalError, INTERNAL_MESSAGE)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if is_constraint_violation(&err) {
            debug!("write rejected: {:#}", err);
            return Self::new(
                ErrorCode::ConstraintViolation,
                "write violates a uniqueness or reference constraint",
            );
        }
        error!("datastore failure: {:#}", err);
        Self::internal()
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        Self::new(ErrorCode::ParseError, err.to_string())
    }
}

impl From<CipherError> for ApiError {
    fn from(err: CipherError) -> Self {
        error!("secret field failure: {}", err);
        Self::internal()
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Field(e) => e.into(),
            CodecError::Cipher(e) => e.into(),
            CodecError::Stored(e) => {
                error!("unreadable stored value: {}", e);
                Self::internal()
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::encoding(format!("invalid request body: {}", err))
    }
}

// =============================================================================
// Resource trait
// =============================================================================

/// An entity kind exposed at `/api/<PLURAL>`
pub trait Resource: Send + Sync + 'static {
    /// Singular name used in messages, e.g. "device"
    const NAME: &'static str;

    /// Path segment, e.g. "devices"
    const PLURAL: &'static str;

    /// Filters recognized by the listing and count endpoints
    const FILTERS: FilterSpec;

    type Payload: DeserializeOwned + IntoStorage<New = Self::New> + Send;
    type New: Send;
    type Record: Send;
    type View: Serialize + FromRecord<Record = Self::Record> + Send;

    fn list(db: &InventoryDatabase, args: &ListArgs) -> Result<Vec<Self::Record>>;
    fn count(db: &InventoryDatabase, args: &ListArgs) -> Result<u64>;
    fn get(db: &InventoryDatabase, id: i64) -> Result<Option<Self::Record>>;
    fn insert(db: &InventoryDatabase, new: &Self::New) -> Result<i64>;
    fn update(db: &InventoryDatabase, id: i64, new: &Self::New) -> Result<bool>;
    fn delete(db: &InventoryDatabase, id: i64) -> Result<bool>;
}

// =============================================================================
// Generic handlers
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

fn lock(state: &ApiState) -> ApiResult<MutexGuard<'_, InventoryDatabase>> {
    state.db.lock().map_err(|_| {
        error!("inventory database lock poisoned");
        ApiError::internal()
    })
}

fn to_views<R: Resource>(state: &ApiState, records: Vec<R::Record>) -> ApiResult<Vec<R::View>> {
    records
        .into_iter()
        .map(|r| state.codec.to_view::<R::View>(r).map_err(ApiError::from))
        .collect()
}

/// `GET /api/<plural>`
pub async fn list<R: Resource>(
    State(state): State<ApiState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Vec<R::View>>> {
    let args = ListArgs::from_params(&params, &R::FILTERS);
    let records = {
        let db = lock(&state)?;
        R::list(&db, &args)?
    };
    Ok(Json(to_views::<R>(&state, records)?))
}

/// `GET /api/<plural>/count`
pub async fn count<R: Resource>(
    State(state): State<ApiState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<CountResponse>> {
    let args = ListArgs::from_params(&params, &R::FILTERS).count_args();
    let db = lock(&state)?;
    let count = R::count(&db, &args)?;
    Ok(Json(CountResponse { count }))
}

/// `GET /api/<plural>/:id`
pub async fn get_one<R: Resource>(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<R::View>> {
    let record = {
        let db = lock(&state)?;
        R::get(&db, id)?
    };
    let record = record.ok_or_else(|| ApiError::not_found(R::NAME, id))?;
    Ok(Json(state.codec.to_view::<R::View>(record)?))
}

/// `POST /api/<plural>`
pub async fn create<R: Resource>(
    State(state): State<ApiState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<R::View>)> {
    let payload: R::Payload = serde_json::from_slice(&body)?;
    let new = state.codec.to_storage(payload)?;

    let record = {
        let db = lock(&state)?;
        let id = R::insert(&db, &new)?;
        R::get(&db, id)?
    };
    let record = record.ok_or_else(ApiError::internal)?;
    Ok((
        StatusCode::CREATED,
        Json(state.codec.to_view::<R::View>(record)?),
    ))
}

/// `PUT /api/<plural>/:id`, replacing every field
pub async fn update<R: Resource>(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult<Json<R::View>> {
    let payload: R::Payload = serde_json::from_slice(&body)?;
    let new = state.codec.to_storage(payload)?;

    let record = {
        let db = lock(&state)?;
        if !R::update(&db, id, &new)? {
            return Err(ApiError::not_found(R::NAME, id));
        }
        R::get(&db, id)?
    };
    let record = record.ok_or_else(|| ApiError::not_found(R::NAME, id))?;
    Ok(Json(state.codec.to_view::<R::View>(record)?))
}

/// `DELETE /api/<plural>/:id`
pub async fn delete<R: Resource>(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let db = lock(&state)?;
    if R::delete(&db, id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(R::NAME, id))
    }
}
