//! Local development server: every route on one axum router, with the CORS
//! preflight answered the way the API Gateway mock integration answers it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use items_core::cors;
use items_core::operation::{COLLECTION_PATH, ITEM_PATH};
use items_core::ItemStore;

use crate::errors::ApiError;
use crate::service::{ItemsService, Reply, utf8_body};

/// API Gateway's maximum integration timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(29);

type SharedService<S> = Arc<ItemsService<S>>;

/// Build the router serving all seven methods of the API.
pub fn router<S: ItemStore>(service: SharedService<S>) -> Router {
    Router::new()
        .route(
            COLLECTION_PATH,
            get(get_all::<S>).post(create::<S>).options(preflight),
        )
        .route(
            ITEM_PATH,
            get(get_one::<S>)
                .patch(update_one::<S>)
                .delete(delete_one::<S>)
                .options(preflight),
        )
        .layer(TraceLayer::new_for_http())
        .layer(timeout_layer(REQUEST_TIMEOUT))
        .with_state(service)
}

/// Answer 504 once `timeout` elapses, as API Gateway does.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, timeout)
}

/// Serve `service` on `addr` until Ctrl-C.
pub async fn serve<S: ItemStore>(service: ItemsService<S>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, router(Arc::new(service)))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C, serving until killed");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn get_all<S: ItemStore>(State(service): State<SharedService<S>>) -> Result<Reply, ApiError> {
    service.get_all().await
}

async fn get_one<S: ItemStore>(
    State(service): State<SharedService<S>>,
    Path(id): Path<String>,
) -> Result<Reply, ApiError> {
    service.get_one(Some(&id)).await
}

async fn create<S: ItemStore>(
    State(service): State<SharedService<S>>,
    body: Bytes,
) -> Result<Reply, ApiError> {
    service.create(Some(utf8_body(&body)?)).await
}

async fn update_one<S: ItemStore>(
    State(service): State<SharedService<S>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Reply, ApiError> {
    service.update_one(Some(&id), Some(utf8_body(&body)?)).await
}

async fn delete_one<S: ItemStore>(
    State(service): State<SharedService<S>>,
    Path(id): Path<String>,
) -> Result<Reply, ApiError> {
    service.delete_one(Some(&id)).await
}

async fn preflight() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    for (name, value) in cors::PREFLIGHT_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    (StatusCode::OK, headers)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request};
    use items_core::MemoryStore;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        router(Arc::new(ItemsService::new(MemoryStore::new("itemId"))))
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn preflight_on_both_resources() {
        for uri in ["/items", "/items/abc"] {
            let response = app()
                .oneshot(request(Method::OPTIONS, uri, ""))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let headers = response.headers();
            assert_eq!(headers["access-control-allow-origin"], "*");
            assert_eq!(headers["access-control-allow-credentials"], "false");
            assert_eq!(headers["access-control-allow-methods"], "OPTIONS,GET,PUT,POST,DELETE");
            assert_eq!(headers["access-control-allow-headers"], cors::ALLOW_HEADERS);
        }
    }

    #[tokio::test]
    async fn crud_round_through_router() {
        let app = app();

        let created = app
            .clone()
            .oneshot(request(Method::POST, "/items", r#"{"name": "lamp"}"#))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let id = json(created).await["itemId"].as_str().unwrap().to_string();
        let item_uri = format!("/items/{id}");

        let patched = app
            .clone()
            .oneshot(request(Method::PATCH, &item_uri, r#"{"name": "desk lamp"}"#))
            .await
            .unwrap();
        assert_eq!(patched.status(), StatusCode::NO_CONTENT);

        let fetched = app
            .clone()
            .oneshot(request(Method::GET, &item_uri, ""))
            .await
            .unwrap();
        assert_eq!(fetched.status(), StatusCode::OK);
        assert_eq!(json(fetched).await, json!({"itemId": id, "name": "desk lamp"}));

        let deleted = app
            .clone()
            .oneshot(request(Method::DELETE, &item_uri, ""))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);

        let listed = app
            .oneshot(request(Method::GET, "/items", ""))
            .await
            .unwrap();
        assert_eq!(json(listed).await, json!([]));
    }

    #[tokio::test]
    async fn errors_are_json_documents() {
        let response = app()
            .oneshot(request(Method::GET, "/items/nope", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await, json!({"error": "item nope not found"}));
    }

    #[tokio::test]
    async fn non_utf8_body_gets_json_error() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/items")
            .body(Body::from(vec![b'{', 0xff, b'}']))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await, json!({"error": "request body must be UTF-8 JSON"}));
    }

    #[tokio::test]
    async fn slow_handlers_time_out_with_504() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .layer(timeout_layer(Duration::from_millis(10)));

        let response = app
            .oneshot(request(Method::GET, "/slow", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn put_is_not_routed() {
        let response = app()
            .oneshot(request(Method::PUT, "/items/abc", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
