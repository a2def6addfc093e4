//! REST API server for the inventory
//!
//! # Architecture
//!
//! - `handler` - `Resource` trait, error type and the generic handlers
//! - `handlers` - one `Resource` implementation per entity kind
//! - `router` - registry that mounts a resource's endpoints on the axum router
//!
//! All handlers share one [`ApiState`]: the inventory database behind a mutex,
//! and the entity codec holding the process-wide secret cipher.
//!
//! # Usage
//!
//! ```rust,ignore
//! use netinv::server::{start_server, ApiState, ServerConfig};
//!
//! let state = ApiState::new(db, codec);
//! start_server(state, ServerConfig::default()).await?;
//! ```

pub mod handler;
pub mod handlers;
pub mod router;

pub use handler::{ApiError, ApiResult, CountResponse, ErrorCode, Resource};
pub use router::ResourceRouter;

use crate::codec::EntityCodec;
use crate::config::NetinvConfig;
use crate::database::InventoryDatabase;
use axum::{routing::get, Router as AxumRouter};
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub address: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: crate::config::DEFAULT_ADDRESS.to_string(),
            port: crate::config::DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl From<&NetinvConfig> for ServerConfig {
    fn from(config: &NetinvConfig) -> Self {
        Self {
            address: config.address.clone(),
            port: config.port,
        }
    }
}

// =============================================================================
// Server State
// =============================================================================

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<Mutex<InventoryDatabase>>,
    pub codec: EntityCodec,
}

impl ApiState {
    pub fn new(db: InventoryDatabase, codec: EntityCodec) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            codec,
        }
    }
}

// =============================================================================
// Router Creation
// =============================================================================

/// Create a router with every inventory resource registered
pub fn create_router() -> ResourceRouter {
    use handlers::*;

    let mut router = ResourceRouter::new();
    router.register::<SiteResource>();
    router.register::<DeviceResource>();
    router.register::<InterfaceResource>();
    router.register::<CredentialResource>();
    router.register::<DeviceCredentialResource>();
    router.register::<SnmpCredentialResource>();
    router
}

/// Create the axum application: resource routes, health check, tracing and CORS
pub fn create_axum_router(state: ApiState) -> AxumRouter {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router()
        .into_routes()
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "OK"
}

// =============================================================================
// Server Startup
// =============================================================================

pub async fn start_server(state: ApiState, config: ServerConfig) -> anyhow::Result<()> {
    let app = create_axum_router(state);

    let bind_address = config.bind_address();
    tracing::info!("Starting REST server on {}", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::crypto::SecretCipher;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    pub(crate) fn test_state(passphrase: &str) -> ApiState {
        let db = InventoryDatabase::open_in_memory().unwrap();
        let cipher = SecretCipher::new(passphrase).unwrap();
        ApiState::new(db, EntityCodec::new(Arc::new(cipher)))
    }

    async fn send(
        app: AxumRouter,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_server_config_builder() {
        let config = ServerConfig::new().with_address("0.0.0.0").with_port(9000);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_create_router() {
        let router = create_router();
        assert_eq!(
            router.resource_names(),
            vec![
                "credentials",
                "device-credentials",
                "devices",
                "interfaces",
                "sites",
                "snmp-credentials",
            ]
        );
        assert!(!router.has_resource("unknown"));
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_axum_router(test_state("k"));
        let (status, body) = send(app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn test_http_round_trip() {
        let state = test_state("k");

        let (status, body) = send(
            create_axum_router(state.clone()),
            "POST",
            "/api/sites",
            Some(serde_json::json!({"name": "ams1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let id = created["id"].as_i64().unwrap();

        let (status, body) = send(
            create_axum_router(state.clone()),
            "GET",
            "/api/sites/count?name_f=AMS%25",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let counted: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(counted["count"], 1);

        let (status, body) = send(
            create_axum_router(state.clone()),
            "GET",
            &format!("/api/sites/{}", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let fetched: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(fetched["name"], "ams1");
        assert!(fetched["created_at"].is_i64());

        let (status, _) = send(
            create_axum_router(state.clone()),
            "DELETE",
            &format!("/api/sites/{}", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(
            create_axum_router(state),
            "GET",
            &format!("/api/sites/{}", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["code"], "not_found");
    }

    #[tokio::test]
    async fn test_http_bad_body() {
        let (status, body) = send(
            create_axum_router(test_state("k")),
            "POST",
            "/api/devices",
            Some(serde_json::json!({"name": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["code"], "encoding_error");
    }
}
