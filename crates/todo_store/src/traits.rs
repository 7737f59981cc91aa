//! Todo store trait definitions.

use async_trait::async_trait;
use entities::{Category, Priority, Todo, TodoPatch, User, UserId};
use uuid::Uuid;

use crate::TodoStoreResult;

/// Scoped lookup path for listing a user's todos.
///
/// Each variant corresponds to one secondary index keyed by owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoIndex {
    /// All of the owner's todos.
    ByOwner,
    /// Todos filed under a category name.
    ByCategory(String),
    /// Todos with a priority.
    ByPriority(Priority),
    /// Todos with a completion state.
    ByCompleted(bool),
}

/// Full-text query over todo text, scoped to one owner.
///
/// Only category and completion narrow natively; anything else has to be
/// applied to the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Search text.
    pub text: String,
    /// Restrict to a category name.
    pub category: Option<String>,
    /// Restrict to a completion state.
    pub completed: Option<bool>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: None,
            completed: None,
        }
    }
}

/// Trait for todo storage operations.
///
/// Every method is one atomic operation against the backing store.
#[async_trait]
pub trait TodoStore: Send + Sync {
    // =========================================================================
    // User operations
    // =========================================================================

    /// Creates a new user.
    async fn create_user(&self, user: User) -> TodoStoreResult<User>;

    /// Gets a user by ID.
    async fn get_user(&self, id: UserId) -> TodoStoreResult<Option<User>>;

    // =========================================================================
    // Category operations
    // =========================================================================

    /// Inserts a category.
    async fn insert_category(&self, category: Category) -> TodoStoreResult<Category>;

    /// Gets a category by ID.
    async fn get_category(&self, id: Uuid) -> TodoStoreResult<Option<Category>>;

    /// Lists the owner's categories.
    async fn list_categories(&self, owner: UserId) -> TodoStoreResult<Vec<Category>>;

    /// Finds the owner's category with exactly this name.
    async fn find_category_by_name(
        &self,
        owner: UserId,
        name: &str,
    ) -> TodoStoreResult<Option<Category>>;

    /// Deletes a category.
    async fn delete_category(&self, id: Uuid) -> TodoStoreResult<()>;

    // =========================================================================
    // Todo operations
    // =========================================================================

    /// Inserts a todo.
    async fn insert_todo(&self, todo: Todo) -> TodoStoreResult<Todo>;

    /// Gets a todo by ID.
    async fn get_todo(&self, id: Uuid) -> TodoStoreResult<Option<Todo>>;

    /// Applies a partial update and returns the updated todo.
    async fn patch_todo(&self, id: Uuid, patch: &TodoPatch) -> TodoStoreResult<Todo>;

    /// Flips the completion flag in one step and returns the updated todo.
    async fn toggle_todo_completed(&self, id: Uuid) -> TodoStoreResult<Todo>;

    /// Deletes a todo.
    async fn delete_todo(&self, id: Uuid) -> TodoStoreResult<()>;

    /// Lists the owner's todos through one index, newest first.
    async fn query_todos(&self, owner: UserId, index: TodoIndex) -> TodoStoreResult<Vec<Todo>>;

    /// Searches the owner's todos by text, most relevant first.
    async fn search_todos(&self, owner: UserId, query: &SearchQuery)
        -> TodoStoreResult<Vec<Todo>>;

    /// Returns true if any of the owner's todos is filed under `category`.
    async fn todo_exists_in_category(&self, owner: UserId, category: &str)
        -> TodoStoreResult<bool>;
}
