//! HTTP access to the same tools: `GET /tools`, `POST /tools/:name`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::error::ErrorKind;
use crate::tools::{RailMcp, ToolError};

/// HTTP Response wrapper
#[derive(Debug, Serialize)]
struct HttpResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<Value>,
}

impl<T> HttpResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(error: Value) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

pub fn router(server: RailMcp) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/:name", post(call_tool))
        .layer(CorsLayer::permissive())
        .with_state(server)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "Rail MCP Server",
        "protocols": ["http", "jsonrpc-stdio"],
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn list_tools(State(server): State<RailMcp>) -> Json<Value> {
    Json(server.list_tools())
}

async fn call_tool(
    State(server): State<RailMcp>,
    Path(name): Path<String>,
    Json(arguments): Json<Value>,
) -> impl IntoResponse {
    match server.call_tool(&name, arguments).await {
        Ok(result) => (StatusCode::OK, Json(HttpResponse::ok(result))).into_response(),
        Err(ToolError::Rail(e)) => {
            tracing::warn!("✗ {} failed: {}", name, e);
            let status = status_for(e.kind());
            let payload = serde_json::to_value(e.payload()).unwrap_or(json!({
                "message": e.to_string()
            }));
            (status, Json(HttpResponse::<()>::err(payload))).into_response()
        }
        Err(e @ ToolError::UnknownTool(_)) => (
            StatusCode::NOT_FOUND,
            Json(HttpResponse::<()>::err(json!({"message": e.to_string()}))),
        )
            .into_response(),
        Err(e @ ToolError::Encode(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HttpResponse::<()>::err(json!({"message": e.to_string()}))),
        )
            .into_response(),
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::TimeoutError => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::TransportError | ErrorKind::UpstreamGraphqlError => StatusCode::BAD_GATEWAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RailClient;
    use crate::config::Language;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        router(RailMcp::new(
            RailClient::new("http://127.0.0.1:9/graphql", Duration::from_millis(200)),
            Language::En,
        ))
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_tools() {
        let (status, body) = send(Request::get("/tools").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tools"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_book_ticket() {
        let (status, body) = send(post_json(
            "/tools/book_ticket",
            json!({"trip_id": "HC_1", "passenger_name": "Anna", "passenger_email": "anna@example.ch"}),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "reserved");
    }

    #[tokio::test]
    async fn test_validation_error_maps_to_bad_request() {
        let (status, body) = send(post_json(
            "/tools/get_trips",
            json!({"origin": "Zürich HB", "destination": "Bern",
                   "departure_date": "2025-05-01", "departure_time": "noon"}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["kind"], "validation_error");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let (status, body) = send(post_json("/tools/calculate_bmi", json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"]["message"].as_str().unwrap().contains("calculate_bmi"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::TimeoutError), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(ErrorKind::UpstreamGraphqlError), StatusCode::BAD_GATEWAY);
    }
}
