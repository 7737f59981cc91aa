//! Category API endpoints.

use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use entities::{Category, NewCategory};
use serde::{Deserialize, Serialize};
use todo_store::TodoStore;

use crate::api::{ApiJson, EmptyResponse, IdRequest};
use crate::error::{ServerError, ServerResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Request body for adding a category.
#[derive(Debug, Deserialize)]
pub struct AddCategoryRequest {
    pub name: String,
    pub color: String,
}

/// A list of categories.
#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

/// A single category.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: Category,
}

/// Lists the caller's categories.
pub async fn list_categories<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
) -> ServerResult<Json<CategoriesResponse>> {
    let categories = state.service.list_categories(caller).await?;
    Ok(Json(CategoriesResponse { categories }))
}

/// Adds a category.
pub async fn add_category<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    ApiJson(request): ApiJson<AddCategoryRequest>,
) -> ServerResult<Json<CategoryResponse>> {
    if request.name.trim().is_empty() {
        return Err(ServerError::InvalidRequest(
            "Category name must not be empty".to_string(),
        ));
    }

    let category = state
        .service
        .add_category(caller, NewCategory::new(request.name, request.color))
        .await?;
    Ok(Json(CategoryResponse { category }))
}

/// Removes a category no todo uses.
pub async fn remove_category<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    ApiJson(request): ApiJson<IdRequest>,
) -> ServerResult<Json<EmptyResponse>> {
    state.service.remove_category(caller, request.id).await?;
    Ok(Json(EmptyResponse {}))
}

/// Adds the default categories the caller is missing.
pub async fn seed_default_categories<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
) -> ServerResult<Json<CategoriesResponse>> {
    let categories = state.service.seed_default_categories(caller).await?;
    Ok(Json(CategoriesResponse { categories }))
}
