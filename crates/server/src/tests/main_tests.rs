use super::*;
use axum::{body, body::Body, http::Request};
use crate::config::DEFAULT_BOARD_PATH;
use tower::ServiceExt;

fn test_app() -> Router {
    build_router(
        Arc::new(AppState {
            api: ApiContext::default(),
        }),
        DEFAULT_BOARD_PATH,
    )
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn post_message(body: serde_json::Value) -> Request<Body> {
    Request::post(DEFAULT_BOARD_PATH)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let request = Request::get("/healthz").body(Body::empty()).expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_board_lists_as_json_array() {
    let request = Request::get(DEFAULT_BOARD_PATH)
        .body(Body::empty())
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let messages: serde_json::Value = read_json(response).await;
    assert_eq!(messages, serde_json::json!([]));
}

#[tokio::test]
async fn posted_message_is_created_listed_and_fetchable() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(post_message(serde_json::json!({
            "nome": "Ana",
            "mensagem": "Oi",
            "data": "2024-01-01T10:00:00.000Z"
        })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Message = read_json(response).await;
    let id = created.id.clone().expect("id").to_string();

    let list = Request::get(DEFAULT_BOARD_PATH)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(list).await.expect("response");
    let messages: Vec<Message> = read_json(response).await;
    assert_eq!(messages, vec![created.clone()]);

    let single = Request::get(format!("{DEFAULT_BOARD_PATH}/{id}"))
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(single).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let found: Message = read_json(response).await;
    assert_eq!(found, created);
}

#[tokio::test]
async fn blank_name_is_a_bad_request() {
    let response = test_app()
        .oneshot(post_message(serde_json::json!({ "nome": " ", "mensagem": "Oi" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ApiError = read_json(response).await;
    assert!(matches!(error.code, ErrorCode::Validation));
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let request = Request::get(format!("{DEFAULT_BOARD_PATH}/nope"))
        .body(Body::empty())
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
