//! Routes and OpenAPI document.

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use common::middleware::request_id::request_id_middleware;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::handlers;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Capability Service API",
        version = "0.1.0",
        description = "Dialect-aware database capabilities over registered connections"
    ),
    paths(
        handlers::invoke_capability,
        handlers::list_capabilities,
        handlers::list_connections,
        handlers::register_connection,
        handlers::health_check,
    ),
    components(schemas(
        common::models::CapabilityOutput,
        common::models::ConnectionConfig,
        common::models::ConnectionItem,
        crate::capability::CapabilityDescriptor,
        crate::capability::ParamSpec,
        crate::capability::ParamKind,
        handlers::HealthResponse,
    )),
    tags(
        (name = "capabilities", description = "Capability catalog and invocation"),
        (name = "connections", description = "Connection registry"),
        (name = "health", description = "Health check")
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/capabilities", get(handlers::list_capabilities))
        .route("/api/capabilities/{name}", post(handlers::invoke_capability))
        .route(
            "/api/connections",
            get(handlers::list_connections).post(handlers::register_connection),
        )
        .route("/api/health", get(handlers::health_check))
}

/// The full application: routes, OpenAPI document and middleware stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use common::config::AppConfig;
    use common::models::connection::ConnectionConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::registry::ConnectionRegistry;

    fn connection(id: &str, db_type: &str, host: &str) -> ConnectionConfig {
        ConnectionConfig {
            id: id.to_string(),
            db_type: db_type.to_string(),
            host: host.to_string(),
            port: None,
            user: String::new(),
            password: "secret".to_string(),
            name: String::new(),
            description: format!("{id} connection"),
        }
    }

    fn app() -> Router {
        let registry = Arc::new(ConnectionRegistry::with_configs(vec![
            connection("lite", "sqlite", ":memory:"),
            connection("ora", "oracle", "db9"),
        ]));
        create_router(AppState::with_registry(AppConfig::default(), registry))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["connections"], 2);
    }

    #[tokio::test]
    async fn test_catalog_lists_every_capability() {
        let (status, body) = call(&app(), "GET", "/api/capabilities", None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names.len(), 11);
        assert!(names.contains(&"get_unique_values"));
    }

    #[tokio::test]
    async fn test_execute_sql_against_sqlite() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/capabilities/execute_sql",
            Some(json!({"database": "lite", "sql": "CREATE TABLE orders (id INTEGER, status TEXT)"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["text"], "Statement executed successfully. Rows affected: 0");

        call(
            &app,
            "POST",
            "/api/capabilities/execute_sql",
            Some(json!({"database": "lite", "sql": "INSERT INTO orders VALUES (1, 'paid'), (2, 'open'), (3, 'paid')"})),
        )
        .await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/capabilities/get_unique_values",
            Some(json!({"database": "lite", "table": "orders", "column": "status"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["capability"], "get_unique_values");
        let text = body["data"]["text"].as_str().unwrap();
        assert!(text.starts_with("# Unique Values in Column status of Table orders in Database lite"));
        assert!(text.contains("| paid | 2 |"));
        assert!(text.ends_with("(2 rows)"));
    }

    #[tokio::test]
    async fn test_unsupported_pair_is_unprocessable() {
        let (status, body) = call(
            &app(),
            "POST",
            "/api/capabilities/get_constraints",
            Some(json!({"database": "lite"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_DIALECT");
    }

    #[tokio::test]
    async fn test_unknown_type_is_unsupported_on_use() {
        let (_, body) = call(
            &app(),
            "POST",
            "/api/capabilities/get_stats",
            Some(json!({"database": "ora"})),
        )
        .await;
        assert_eq!(body["error"]["code"], "UNSUPPORTED_DIALECT");
    }

    #[tokio::test]
    async fn test_not_found_and_validation() {
        let app = app();
        let (status, body) = call(&app, "POST", "/api/capabilities/drop_everything", Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = call(
            &app,
            "POST",
            "/api/capabilities/get_stats",
            Some(json!({"database": "missing"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, "POST", "/api/capabilities/get_table_stats", Some(json!({"database": "lite"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_select_without_space_is_a_query() {
        let app = app();
        for sql in [
            "CREATE TABLE t (id INTEGER)",
            "INSERT INTO t VALUES (1), (2)",
        ] {
            call(&app, "POST", "/api/capabilities/execute_sql", Some(json!({"database": "lite", "sql": sql}))).await;
        }

        let (status, body) = call(
            &app,
            "POST",
            "/api/capabilities/execute_sql",
            Some(json!({"database": "lite", "sql": "SELECT*FROM t"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = body["data"]["text"].as_str().unwrap();
        assert!(text.starts_with("| id |"));
        assert!(text.ends_with("(2 rows)"));
    }

    #[tokio::test]
    async fn test_excluded_nulls_stay_out_under_or_filter() {
        let app = app();
        for sql in [
            "CREATE TABLE o (id INTEGER, s TEXT)",
            "INSERT INTO o VALUES (1, 'a'), (2, NULL), (3, 'b')",
        ] {
            call(&app, "POST", "/api/capabilities/execute_sql", Some(json!({"database": "lite", "sql": sql}))).await;
        }

        let (status, body) = call(
            &app,
            "POST",
            "/api/capabilities/get_unique_values",
            Some(json!({"database": "lite", "table": "o", "column": "s", "where": "id = 2 OR id = 3",
                        "include_nulls": false, "include_counts": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = body["data"]["text"].as_str().unwrap();
        assert!(text.contains("| b |"));
        assert!(!text.contains("NULL"));
        assert!(text.ends_with("(1 rows)"));
    }

    #[tokio::test]
    async fn test_list_databases() {
        let (status, body) = call(&app(), "POST", "/api/capabilities/list_databases", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        let text = body["data"]["text"].as_str().unwrap();
        assert!(text.starts_with("Available databases:"));
        assert!(text.contains("| 1 | lite | sqlite | :memory: |"));
        assert!(text.contains("| 2 | ora | oracle | db9 |"));
    }

    #[tokio::test]
    async fn test_register_and_list_connections_hides_password() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/connections",
            Some(json!({"id": "pg1", "type": "postgres", "host": "db1", "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], "pg1");

        let (_, body) = call(&app, "GET", "/api/connections", None).await;
        let list = body["data"].as_array().unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.iter().all(|c| c.get("password").is_none()));

        let (status, body) = call(&app, "POST", "/api/connections", Some(json!({"id": "", "type": "mysql"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let (status, body) = call(&app(), "GET", "/api-docs/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"].get("/api/capabilities/{name}").is_some());
    }
}
