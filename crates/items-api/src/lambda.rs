//! API Gateway proxy-event adapter: one Lambda function per [`Operation`].

use lambda_http::http::header::CONTENT_TYPE;
use lambda_http::{Body, Error, Request, RequestExt, Response, run, service_fn};
use tracing::{info, warn};

use items_core::operation::{ID_PARAMETER, route_for};
use items_core::{Config, DynamoStore, ItemStore, Operation, telemetry};

use crate::errors::ApiError;
use crate::service::{ItemsService, OperationRequest, Reply, utf8_body};

/// Run the Lambda runtime loop for `operation` against the table named by the
/// function's environment.
pub async fn serve(operation: Operation) -> Result<(), Error> {
    telemetry::init();

    let config = Config::from_env()?;
    let route = route_for(operation);
    info!(
        %operation,
        method = %route.method,
        path = route.path,
        table = %config.table_name,
        "starting handler"
    );

    let store = DynamoStore::new(config.table_name, config.primary_key).await;
    let service = ItemsService::new(store);
    let service = &service;

    run(service_fn(move |event: Request| async move {
        handle(service, operation, event).await
    }))
    .await
}

/// Handle one proxy event.
pub async fn handle<S: ItemStore>(
    service: &ItemsService<S>,
    operation: Operation,
    event: Request,
) -> Result<Response<Body>, Error> {
    let id = event
        .path_parameters_ref()
        .and_then(|params| params.first(ID_PARAMETER));

    let result = match body_text(event.body()) {
        Ok(body) => service.dispatch(operation, OperationRequest { id, body }).await,
        Err(err) => Err(err),
    };

    to_response(operation, result)
}

fn body_text(body: &Body) -> Result<Option<&str>, ApiError> {
    match body {
        Body::Empty => Ok(None),
        Body::Text(text) => Ok(Some(text.as_str())),
        Body::Binary(bytes) => utf8_body(bytes).map(Some),
    }
}

fn to_response(
    operation: Operation,
    result: Result<Reply, ApiError>,
) -> Result<Response<Body>, Error> {
    let reply = match result {
        Ok(reply) => reply,
        Err(err) => {
            if err.status().is_client_error() {
                warn!(%operation, status = err.status().as_u16(), error = %err.message(), "request rejected");
            }
            Reply::json(err.status(), err.body())
        }
    };

    let builder = Response::builder().status(reply.status.as_u16());
    let response = match reply.body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::Text(body.to_string()))?,
        None => builder.body(Body::Empty)?,
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use items_core::MemoryStore;
    use serde_json::{Value, json};

    use super::*;

    fn with_id(request: Request, id: &str) -> Request {
        request.with_path_parameters(HashMap::from([("id".to_string(), id.to_string())]))
    }

    fn json_body(response: &Response<Body>) -> Value {
        match response.body() {
            Body::Text(text) => serde_json::from_str(text).unwrap(),
            other => panic!("expected text body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_then_get_one_through_proxy_events() {
        let service = ItemsService::new(MemoryStore::new("itemId"));

        let created = handle(
            &service,
            Operation::Create,
            Request::new(Body::from(r#"{"name": "lamp"}"#)),
        )
        .await
        .unwrap();
        assert_eq!(created.status().as_u16(), 201);
        assert_eq!(created.headers()[CONTENT_TYPE], "application/json");
        let id = json_body(&created)["itemId"].as_str().unwrap().to_string();

        let fetched = handle(&service, Operation::GetOne, with_id(Request::default(), &id))
            .await
            .unwrap();
        assert_eq!(fetched.status().as_u16(), 200);
        assert_eq!(json_body(&fetched)["name"], json!("lamp"));
    }

    #[tokio::test]
    async fn missing_path_parameter_is_400() {
        let service = ItemsService::new(MemoryStore::new("itemId"));
        let response = handle(&service, Operation::DeleteOne, Request::default())
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        assert_eq!(
            json_body(&response),
            json!({"error": "invalid request, you are missing the path parameter id"})
        );
    }

    #[tokio::test]
    async fn missing_body_is_400() {
        let service = ItemsService::new(MemoryStore::new("itemId"));
        let response = handle(&service, Operation::Create, Request::default())
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        assert_eq!(
            json_body(&response)["error"],
            json!("invalid request, you are missing the parameter body")
        );
    }

    #[tokio::test]
    async fn binary_bodies_are_decoded() {
        let service = ItemsService::new(MemoryStore::new("itemId"));
        let request = Request::new(Body::Binary(br#"{"a": 1}"#.to_vec()));
        let response = handle(&service, Operation::Create, request).await.unwrap();
        assert_eq!(response.status().as_u16(), 201);

        let request = Request::new(Body::Binary(vec![0xff, 0xfe]));
        let response = handle(&service, Operation::Create, request).await.unwrap();
        assert_eq!(response.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn update_returns_empty_204() {
        let service = ItemsService::new(MemoryStore::new("itemId"));
        let created = handle(&service, Operation::Create, Request::new(Body::from("{}")))
            .await
            .unwrap();
        let id = json_body(&created)["itemId"].as_str().unwrap().to_string();

        let request = with_id(Request::new(Body::from(r#"{"size": 2}"#)), &id);
        let response = handle(&service, Operation::UpdateOne, request).await.unwrap();
        assert_eq!(response.status().as_u16(), 204);
        assert!(matches!(response.body(), Body::Empty));
    }
}
