//! HTTP handlers.

use std::time::{Duration, Instant};

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;
use validator::Validate;

use common::errors::AppError;
use common::middleware::request_id::RequestId;
use common::models::capability::CapabilityOutput;
use common::models::connection::{ConnectionConfig, ConnectionItem};
use common::response::ApiResponse;

use crate::capability::{Capability, CapabilityDescriptor};
use crate::state::AppState;

const SERVICE_NAME: &str = "capability-service";

/// Invoke a capability by name
#[utoipa::path(
    post,
    path = "/api/capabilities/{name}",
    tag = "capabilities",
    params(
        ("name" = String, Path, description = "Capability wire name, e.g. get_stats")
    ),
    request_body(content = Object, description = "Capability parameters"),
    responses(
        (status = 200, description = "Capability report", body = ApiResponse<CapabilityOutput>),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "Unknown capability or connection"),
        (status = 422, description = "Capability not supported for the connection's dialect"),
        (status = 504, description = "Request timed out")
    )
)]
pub async fn invoke_capability(
    State(state): State<AppState>,
    Path(name): Path<String>,
    request_id: Option<Extension<RequestId>>,
    Json(params): Json<Value>,
) -> Result<Json<ApiResponse<CapabilityOutput>>, AppError> {
    let started = Instant::now();
    let cancel = CancellationToken::new();
    // fires when the client goes away and axum drops this future
    let _guard = cancel.clone().drop_guard();

    let secs = state.config.request_timeout_secs;
    let invocation = state.dispatcher.invoke(&name, params, &cancel);
    let text = match tokio::time::timeout(Duration::from_secs(secs), invocation).await {
        Ok(result) => result?,
        Err(_) => {
            cancel.cancel();
            tracing::warn!(capability = %name, timeout_secs = secs, "capability timed out");
            return Err(AppError::Timeout(secs));
        }
    };

    let mut response = ApiResponse::ok_with_service(
        CapabilityOutput {
            capability: name,
            text,
        },
        SERVICE_NAME,
    )
    .with_duration(started.elapsed().as_millis() as u64);
    if let Some(Extension(id)) = request_id {
        response = response.with_request_id(id.as_str());
    }
    Ok(Json(response))
}

/// List the capability catalog
#[utoipa::path(
    get,
    path = "/api/capabilities",
    tag = "capabilities",
    responses(
        (status = 200, description = "Capabilities and their parameters", body = ApiResponse<Vec<CapabilityDescriptor>>)
    )
)]
pub async fn list_capabilities() -> Json<ApiResponse<Vec<CapabilityDescriptor>>> {
    Json(ApiResponse::ok_with_service(Capability::catalog(), SERVICE_NAME))
}

/// List registered connections
#[utoipa::path(
    get,
    path = "/api/connections",
    tag = "connections",
    responses(
        (status = 200, description = "Registered connections", body = ApiResponse<Vec<ConnectionItem>>)
    )
)]
pub async fn list_connections(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<ConnectionItem>>> {
    let data = state
        .registry
        .list()
        .await
        .into_iter()
        .map(ConnectionItem::from)
        .collect();
    Json(ApiResponse::ok_with_service(data, SERVICE_NAME))
}

/// Register or replace a connection
#[utoipa::path(
    post,
    path = "/api/connections",
    tag = "connections",
    request_body = ConnectionConfig,
    responses(
        (status = 200, description = "Connection registered", body = ApiResponse<ConnectionItem>),
        (status = 400, description = "Validation error")
    )
)]
pub async fn register_connection(
    State(state): State<AppState>,
    Json(config): Json<ConnectionConfig>,
) -> Result<Json<ApiResponse<ConnectionItem>>, AppError> {
    config.validate()?;
    state.registry.register(config.clone()).await;

    Ok(Json(ApiResponse::ok_with_service(
        ConnectionItem::from(config),
        SERVICE_NAME,
    )))
}

/// Health check
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        connections: state.registry.len().await,
        timestamp: Utc::now(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub connections: usize,
    pub timestamp: DateTime<Utc>,
}
