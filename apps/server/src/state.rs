//! Application state.

use std::sync::Arc;

use auth::JwtManager;
use todo_store::{TodoService, TodoStore};

use crate::config::Config;

/// Shared application state.
pub struct AppState<S: TodoStore> {
    /// Server configuration.
    pub config: Config,
    /// Todo and category operations.
    pub service: TodoService<S>,
    /// JWT manager (only present in multi-user mode).
    pub jwt_manager: Option<JwtManager>,
}

impl<S: TodoStore> AppState<S> {
    /// Creates new application state.
    pub fn new(config: Config, store: S, jwt_manager: Option<JwtManager>) -> Self {
        Self {
            config,
            service: TodoService::new(store),
            jwt_manager,
        }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        self.service.store()
    }

    /// Returns true if authentication is enabled.
    pub fn auth_enabled(&self) -> bool {
        self.config.auth_enabled()
    }
}

/// Type alias for shared state.
pub type SharedState<S> = Arc<AppState<S>>;

/// Creates shared state from config and store.
pub fn create_shared_state<S: TodoStore>(
    config: Config,
    store: S,
    jwt_manager: Option<JwtManager>,
) -> SharedState<S> {
    Arc::new(AppState::new(config, store, jwt_manager))
}
