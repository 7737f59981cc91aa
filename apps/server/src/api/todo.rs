//! Todo API endpoints.

use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use chrono::Utc;
use entities::{NewTodo, Priority, Todo, TodoPatch};
use serde::{Deserialize, Serialize};
use todo_store::{TodoFilter, TodoStats, TodoStore};
use uuid::Uuid;

use crate::api::{ApiJson, EmptyResponse, IdRequest};
use crate::error::{ServerError, ServerResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// A todo with its deadline state at response time.
#[derive(Debug, Serialize)]
pub struct TodoView {
    #[serde(flatten)]
    pub todo: Todo,
    pub is_overdue: bool,
    pub is_due_soon: bool,
}

impl TodoView {
    fn new(todo: Todo, now_ms: i64) -> Self {
        Self {
            is_overdue: todo.is_overdue(now_ms),
            is_due_soon: todo.is_due_soon(now_ms),
            todo,
        }
    }
}

/// Request body for adding a todo.
#[derive(Debug, Deserialize)]
pub struct AddTodoRequest {
    pub text: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub priority: Priority,
    #[serde(default)]
    pub deadline: Option<i64>,
}

impl From<AddTodoRequest> for NewTodo {
    fn from(request: AddTodoRequest) -> Self {
        NewTodo {
            text: request.text,
            description: request.description,
            category: request.category,
            priority: request.priority,
            deadline: request.deadline,
        }
    }
}

/// Request body for updating a todo. Omitted fields stay unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub patch: TodoPatch,
}

/// A list of todos.
#[derive(Debug, Serialize)]
pub struct TodosResponse {
    pub todos: Vec<TodoView>,
}

/// A single todo.
#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub todo: TodoView,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn require_non_empty(value: &str, field: &str) -> ServerResult<()> {
    if value.trim().is_empty() {
        return Err(ServerError::InvalidRequest(format!(
            "Todo {field} must not be empty"
        )));
    }
    Ok(())
}

/// Lists the caller's todos matching the filters in the body.
pub async fn list_todos<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    ApiJson(filter): ApiJson<TodoFilter>,
) -> ServerResult<Json<TodosResponse>> {
    let todos = state.service.list_todos(caller, &filter).await?;

    let now = now_ms();
    Ok(Json(TodosResponse {
        todos: todos.into_iter().map(|t| TodoView::new(t, now)).collect(),
    }))
}

/// Adds a todo.
pub async fn add_todo<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    ApiJson(request): ApiJson<AddTodoRequest>,
) -> ServerResult<Json<TodoResponse>> {
    require_non_empty(&request.text, "text")?;
    require_non_empty(&request.category, "category")?;

    let todo = state.service.add_todo(caller, request.into()).await?;
    Ok(Json(TodoResponse {
        todo: TodoView::new(todo, now_ms()),
    }))
}

/// Updates the fields present in the body.
pub async fn update_todo<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    ApiJson(request): ApiJson<UpdateTodoRequest>,
) -> ServerResult<Json<TodoResponse>> {
    if let Some(text) = &request.patch.text {
        require_non_empty(text, "text")?;
    }
    if let Some(category) = &request.patch.category {
        require_non_empty(category, "category")?;
    }

    let todo = state
        .service
        .update_todo(caller, request.id, &request.patch)
        .await?;
    Ok(Json(TodoResponse {
        todo: TodoView::new(todo, now_ms()),
    }))
}

/// Flips a todo between active and completed.
pub async fn toggle_todo<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    ApiJson(request): ApiJson<IdRequest>,
) -> ServerResult<Json<TodoResponse>> {
    let todo = state.service.toggle_todo(caller, request.id).await?;
    Ok(Json(TodoResponse {
        todo: TodoView::new(todo, now_ms()),
    }))
}

/// Deletes a todo.
pub async fn remove_todo<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    ApiJson(request): ApiJson<IdRequest>,
) -> ServerResult<Json<EmptyResponse>> {
    state.service.remove_todo(caller, request.id).await?;
    Ok(Json(EmptyResponse {}))
}

/// Counts the caller's todos matching the filters in the body.
pub async fn todo_stats<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    ApiJson(filter): ApiJson<TodoFilter>,
) -> ServerResult<Json<TodoStats>> {
    let stats = state.service.todo_stats(caller, &filter, now_ms()).await?;
    Ok(Json(stats))
}
