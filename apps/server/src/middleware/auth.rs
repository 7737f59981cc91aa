//! Caller identity resolution.

use std::sync::Arc;

use auth::JwtManager;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use entities::UserId;
use todo_store::TodoStore;

use crate::state::AppState;

/// The caller a request acts as, if any.
///
/// Always present in request extensions once [`identity_middleware`] ran.
/// `None` means the request is anonymous: reads return nothing and writes
/// fail with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Option<UserId>);

/// Extracts the bearer token from the Authorization header.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves a bearer token to a user ID, treating any failure as no caller.
fn caller_from_token(jwt_manager: &JwtManager, token: &str) -> Option<UserId> {
    match jwt_manager
        .validate_token(token)
        .and_then(|claims| claims.user_id())
    {
        Ok(id) => Some(UserId::from(id)),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid access token");
            None
        }
    }
}

/// Resolves the caller for a request.
///
/// In single-user mode every request is the configured local user.
pub fn resolve_identity<S: TodoStore>(state: &AppState<S>, headers: &HeaderMap) -> Option<UserId> {
    if !state.auth_enabled() {
        return Some(state.config.local_user_id);
    }

    let Some(jwt_manager) = &state.jwt_manager else {
        tracing::error!("JWT manager not configured but auth is enabled");
        return None;
    };

    caller_from_token(jwt_manager, extract_token(headers)?)
}

/// Stores the resolved [`CurrentUser`] in the request extensions.
pub async fn identity_middleware<S: TodoStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = resolve_identity(&state, request.headers());
    request.extensions_mut().insert(CurrentUser(caller));

    next.run(request).await
}
