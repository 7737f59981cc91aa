//! Authentication API endpoints.

use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use entities::User;
use serde::Serialize;
use todo_store::TodoStore;

use crate::error::{ServerError, ServerResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Response for a new anonymous session.
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: User,
}

/// Response carrying the current user.
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: User,
}

/// Creates an anonymous user and issues a token for it.
pub async fn sign_in_anonymously<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ServerResult<Json<SignInResponse>> {
    // In single-user mode, auth is disabled
    if !state.auth_enabled() {
        return Err(ServerError::InvalidRequest(
            "Authentication is disabled in single-user mode".to_string(),
        ));
    }

    let jwt_manager = state
        .jwt_manager
        .as_ref()
        .ok_or_else(|| ServerError::Internal("JWT manager not configured".to_string()))?;

    let user = state.store().create_user(User::anonymous()).await?;
    let access_token = jwt_manager.generate_token(user.id.as_uuid(), user.name.clone(), true)?;

    tracing::info!(user_id = %user.id, "Anonymous user signed in");

    Ok(Json(SignInResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_manager.expiration_seconds(),
        user,
    }))
}

/// Gets the current user.
pub async fn get_current_user<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
) -> ServerResult<Json<CurrentUserResponse>> {
    let user_id = caller.ok_or(ServerError::AuthenticationRequired)?;

    let user = state
        .store()
        .get_user(user_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("User not found".to_string()))?;

    Ok(Json(CurrentUserResponse { user }))
}
