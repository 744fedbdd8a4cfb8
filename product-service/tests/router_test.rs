use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use product_service::services::{DisconnectedStore, InMemoryProductStore};
use product_service::startup::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

fn in_memory_router() -> Router {
    build_router(AppState::new(Arc::new(InMemoryProductStore::new())))
}

fn disconnected_router() -> Router {
    build_router(AppState::new(Arc::new(DisconnectedStore::new(
        "MONGODB_URI is not set",
    ))))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

#[tokio::test]
async fn root_is_plain_text() {
    let response = in_memory_router()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn unknown_id_returns_null_not_error() {
    let (status, body) = send(
        in_memory_router(),
        Method::GET,
        "/products/64b7f0c2a1b2c3d4e5f60718",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());
}

#[tokio::test]
async fn malformed_id_fails_for_update_and_delete() {
    let (status, body) = send(
        in_memory_router(),
        Method::PATCH,
        "/products/xyz",
        Some(r#"{"productName":"X"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error updating product");

    let (status, body) = send(in_memory_router(), Method::DELETE, "/products/xyz", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error deleting product");
}

#[tokio::test]
async fn malformed_json_body_uses_uniform_error_shape() {
    let (status, body) = send(
        in_memory_router(),
        Method::POST,
        "/products",
        Some(r#"{"productName": "#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Invalid request");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn non_object_body_is_rejected() {
    let (status, body) = send(
        in_memory_router(),
        Method::POST,
        "/products",
        Some(r#"["not", "an", "object"]"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Invalid request");
}

#[tokio::test]
async fn empty_patch_is_rejected() {
    let app = in_memory_router();
    let (_, created) = send(
        app.clone(),
        Method::POST,
        "/products",
        Some(r#"{"productName":"Tea"}"#),
    )
    .await;
    let id = created["insertedId"].as_str().unwrap();

    let (status, body) = send(app, Method::PATCH, &format!("/products/{id}"), Some("{}")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error updating product");
}

#[tokio::test]
async fn patch_changes_only_named_fields() {
    let app = in_memory_router();
    let (_, created) = send(
        app.clone(),
        Method::POST,
        "/products",
        Some(r#"{"productName":"Tea","userEmail":"a@x.com","price":3}"#),
    )
    .await;
    let id = created["insertedId"].as_str().unwrap().to_string();
    let (_, before) = send(app.clone(), Method::GET, &format!("/products/{id}"), None).await;

    send(
        app.clone(),
        Method::PATCH,
        &format!("/products/{id}"),
        Some(r#"{"productName":"X"}"#),
    )
    .await;
    let (_, after) = send(app, Method::GET, &format!("/products/{id}"), None).await;

    let mut expected = before.clone();
    expected["productName"] = json!("X");
    assert_eq!(after, expected);
}

#[tokio::test]
async fn dotted_field_names_are_rejected() {
    let app = in_memory_router();
    let (_, created) = send(
        app.clone(),
        Method::POST,
        "/products",
        Some(r#"{"productName":"Tea","origin":{"port":"Kolkata"}}"#),
    )
    .await;
    let id = created["insertedId"].as_str().unwrap().to_string();

    let (status, body) = send(
        app.clone(),
        Method::PATCH,
        &format!("/products/{id}"),
        Some(r#"{"origin.port":"Chittagong"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error updating product");
    assert!(body["error"].as_str().unwrap().contains("origin.port"));

    let (status, body) = send(
        app.clone(),
        Method::POST,
        "/products",
        Some(r#"{"productName":"Rice","$where":"1"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error adding product");

    let (_, product) = send(app, Method::GET, &format!("/products/{id}"), None).await;
    assert_eq!(product["origin"], json!({ "port": "Kolkata" }));
    assert!(product.get("origin.port").is_none());
}

#[tokio::test]
async fn store_outage_fails_each_route_individually() {
    let cases = [
        (Method::GET, "/products", None, "Error fetching products"),
        (Method::GET, "/products/latest", None, "Error fetching latest products"),
        (
            Method::GET,
            "/products/64b7f0c2a1b2c3d4e5f60718",
            None,
            "Error fetching product details",
        ),
        (Method::GET, "/products/search/tea", None, "Error searching products"),
        (Method::GET, "/my-exports/a@x.com", None, "Error fetching your exports"),
        (
            Method::POST,
            "/products",
            Some(r#"{"productName":"Tea"}"#),
            "Error adding product",
        ),
    ];

    for (method, uri, body, message) in cases {
        let (status, response) = send(disconnected_router(), method, uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(response["message"], message, "{uri}");
        assert_eq!(response["error"], "MONGODB_URI is not set", "{uri}");
    }

    let (status, _) = send(disconnected_router(), Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn probes_report_store_outage() {
    let (status, body) = send(disconnected_router(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");

    let (status, _) = send(disconnected_router(), Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = send(in_memory_router(), Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let response = in_memory_router()
        .oneshot(
            Request::builder()
                .uri("/products")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-42");
}
