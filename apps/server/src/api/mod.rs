//! API endpoints.

pub mod auth;
pub mod category;
pub mod todo;

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRequest,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use todo_store::TodoStore;
use uuid::Uuid;

use crate::error::ServerError;
use crate::state::AppState;

/// JSON request body whose rejections render as [`ServerError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);

/// Request body naming a single record.
#[derive(Debug, Deserialize)]
pub struct IdRequest {
    pub id: Uuid,
}

/// Empty response body.
#[derive(Debug, Default, Serialize)]
pub struct EmptyResponse {}

/// Creates the API router with all endpoints.
pub fn create_router<S: TodoStore + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        // Category endpoints
        .route("/api/category/list", post(category::list_categories))
        .route("/api/category/add", post(category::add_category))
        .route("/api/category/remove", post(category::remove_category))
        .route(
            "/api/category/seed-defaults",
            post(category::seed_default_categories),
        )
        // Todo endpoints
        .route("/api/todo/list", post(todo::list_todos))
        .route("/api/todo/add", post(todo::add_todo))
        .route("/api/todo/update", post(todo::update_todo))
        .route("/api/todo/toggle", post(todo::toggle_todo))
        .route("/api/todo/remove", post(todo::remove_todo))
        .route("/api/todo/stats", post(todo::todo_stats))
        // Auth endpoints
        .route("/api/auth/anonymous", post(auth::sign_in_anonymously))
        .route("/api/auth/me", get(auth::get_current_user))
        // Health check
        .route("/health", get(health_check))
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use todo_store::MemoryTodoStore;
    use tokio_test::assert_ok;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::{create_app, create_state, ensure_local_user};

    const SECRET: &str = "test-secret-key-must-be-long-enough";

    async fn single_user_app() -> Router {
        let config = Config::from_lookup(|_| None).unwrap();
        let state = assert_ok!(create_state(config, MemoryTodoStore::new()));
        assert_ok!(ensure_local_user(&state).await);
        create_app(state)
    }

    fn multi_user_app() -> Router {
        let config = Config::from_lookup(|key| match key {
            "TASKDECK_SINGLE_USER_MODE" => Some("false".to_string()),
            "TASKDECK_JWT_SECRET" => Some(SECRET.to_string()),
            _ => None,
        })
        .unwrap();
        create_app(assert_ok!(create_state(config, MemoryTodoStore::new())))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn post(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        send(app, Method::POST, uri, token, Some(body)).await
    }

    async fn sign_in(app: &Router) -> String {
        let (status, body) = send(app, Method::POST, "/api/auth/anonymous", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["user"]["is_anonymous"], true);
        body["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = single_user_app().await;
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_category_filter_scenario() {
        let app = single_user_app().await;

        for (name, color) in [("Work", "#f00"), ("Home", "#0f0")] {
            let (status, body) = post(
                &app,
                "/api/category/add",
                None,
                json!({ "name": name, "color": color }),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["category"]["name"], name);
        }

        let (status, body) = post(
            &app,
            "/api/todo/add",
            None,
            json!({ "text": "Buy milk", "category": "Home", "priority": "low" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["todo"]["is_completed"], false);
        let todo_id = body["todo"]["id"].clone();

        let (_, body) = post(&app, "/api/todo/list", None, json!({ "category": "Work" })).await;
        assert_eq!(body["todos"], json!([]));

        let (_, body) = post(&app, "/api/todo/list", None, json!({ "category": "Home" })).await;
        let todos = body["todos"].as_array().unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0]["id"], todo_id);
        assert_eq!(todos[0]["is_overdue"], false);

        let (_, body) = send(&app, Method::POST, "/api/category/list", None, None).await;
        assert_eq!(body["categories"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_todo_lifecycle() {
        let app = single_user_app().await;
        let yesterday = chrono::Utc::now().timestamp_millis() - 24 * 60 * 60 * 1000;

        let (_, body) = post(
            &app,
            "/api/todo/add",
            None,
            json!({
                "text": "File taxes",
                "description": "Before the deadline",
                "category": "Home",
                "priority": "high",
                "deadline": yesterday,
            }),
        )
        .await;
        let id = body["todo"]["id"].clone();
        assert_eq!(body["todo"]["is_overdue"], true);

        let (status, body) = post(
            &app,
            "/api/todo/update",
            None,
            json!({ "id": id, "text": "File the taxes" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["todo"]["text"], "File the taxes");
        assert_eq!(body["todo"]["description"], "Before the deadline");
        assert_eq!(body["todo"]["priority"], "high");

        let (_, body) = post(&app, "/api/todo/stats", None, json!({})).await;
        assert_eq!(
            body,
            json!({ "total": 1, "completed": 0, "remaining": 1, "overdue": 1 })
        );

        let (_, body) = post(&app, "/api/todo/toggle", None, json!({ "id": id })).await;
        assert_eq!(body["todo"]["is_completed"], true);
        assert_eq!(body["todo"]["is_overdue"], false);

        let (status, _) = post(&app, "/api/todo/remove", None, json!({ "id": id })).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post(&app, "/api/todo/toggle", None, json!({ "id": id })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_category_conflicts() {
        let app = single_user_app().await;

        let (_, body) = post(
            &app,
            "/api/category/add",
            None,
            json!({ "name": "Home", "color": "#0f0" }),
        )
        .await;
        let category_id = body["category"]["id"].clone();

        let (status, body) = post(
            &app,
            "/api/category/add",
            None,
            json!({ "name": "Home", "color": "#00f" }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "DUPLICATE_NAME");

        let (_, body) = post(
            &app,
            "/api/todo/add",
            None,
            json!({ "text": "Buy milk", "category": "Home", "priority": "low" }),
        )
        .await;
        let todo_id = body["todo"]["id"].clone();

        let (status, body) = post(
            &app,
            "/api/category/remove",
            None,
            json!({ "id": category_id }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CATEGORY_IN_USE");

        post(&app, "/api/todo/remove", None, json!({ "id": todo_id })).await;
        let (status, _) = post(
            &app,
            "/api/category/remove",
            None,
            json!({ "id": category_id }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_seed_defaults() {
        let app = single_user_app().await;

        let (status, body) = send(&app, Method::POST, "/api/category/seed-defaults", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["categories"].as_array().unwrap().len(), 4);

        let (_, body) = send(&app, Method::POST, "/api/category/seed-defaults", None, None).await;
        assert_eq!(body["categories"], json!([]));
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let app = single_user_app().await;

        let (status, body) = post(
            &app,
            "/api/todo/add",
            None,
            json!({ "text": "Buy milk", "category": "Home", "priority": "urgent" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_REQUEST");

        let (status, _) = post(
            &app,
            "/api/todo/add",
            None,
            json!({ "text": "   ", "category": "Home", "priority": "low" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post(&app, "/api/todo/toggle", None, json!({ "id": "nope" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_single_user_me() {
        let app = single_user_app().await;

        let (status, body) = send(&app, Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["name"], "Local User");

        let (status, _) = send(&app, Method::POST, "/api/auth/anonymous", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_multi_user_identity() {
        let app = multi_user_app();

        // Reads soft-fail, writes are rejected.
        let (status, body) = post(&app, "/api/todo/list", None, json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["todos"], json!([]));

        let new_todo = json!({ "text": "Buy milk", "category": "Home", "priority": "low" });
        let (status, body) = post(&app, "/api/todo/add", None, new_todo.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTHENTICATION_REQUIRED");

        let (status, _) = post(&app, "/api/todo/add", Some("junk"), new_todo.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let alice = sign_in(&app).await;
        let bob = sign_in(&app).await;

        let (status, body) = post(&app, "/api/todo/add", Some(&alice), new_todo).await;
        assert_eq!(status, StatusCode::OK);
        let id = body["todo"]["id"].clone();

        let (status, body) = post(&app, "/api/todo/toggle", Some(&bob), json!({ "id": id })).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "PERMISSION_DENIED");

        let (_, body) = post(&app, "/api/todo/list", Some(&bob), json!({})).await;
        assert_eq!(body["todos"], json!([]));

        let (_, body) = post(&app, "/api/todo/list", Some(&alice), json!({})).await;
        assert_eq!(body["todos"][0]["is_completed"], false);

        let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["is_anonymous"], true);

        let (status, _) = send(&app, Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
