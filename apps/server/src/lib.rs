//! taskdeck server
//!
//! Serves the category and todo operations over JSON. In single-user mode
//! every request acts as one local user; in multi-user mode callers present
//! a bearer token.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod state;

use std::sync::Arc;

use auth::{JwtConfig, JwtManager};
use axum::Router;
use entities::User;
use todo_store::{TodoStore, TodoStoreResult};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::state::{AppState, SharedState, create_shared_state};

/// Creates the application router with all routes configured.
pub fn create_app<S: TodoStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::create_router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::identity_middleware::<S>,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Creates the application state with the given configuration and store.
pub fn create_state<S: TodoStore>(config: Config, store: S) -> anyhow::Result<SharedState<S>> {
    let jwt_manager = match (&config.jwt_secret, config.auth_enabled()) {
        (Some(secret), true) => {
            let jwt_config =
                JwtConfig::new(secret).with_expiration_hours(config.jwt_expiration_hours);
            Some(JwtManager::new(jwt_config)?)
        }
        _ => None,
    };

    Ok(create_shared_state(config, store, jwt_manager))
}

/// Makes sure the single-user mode identity has a user record.
pub async fn ensure_local_user<S: TodoStore>(state: &AppState<S>) -> TodoStoreResult<()> {
    if state.auth_enabled() {
        return Ok(());
    }

    let local_user_id = state.config.local_user_id;
    if state.store().get_user(local_user_id).await?.is_none() {
        state
            .store()
            .create_user(User::new("Local User").with_id(local_user_id))
            .await?;
        tracing::info!(user_id = %local_user_id, "Created local user");
    }

    Ok(())
}

/// Initializes tracing with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
