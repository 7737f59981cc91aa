//! Caller-scoped todo and category operations.
//!
//! Every operation takes the caller explicitly. Reads without a caller
//! return nothing; writes without one fail with `Unauthenticated`.

use entities::{
    Category, NewCategory, NewTodo, Todo, TodoPatch, UserId, DEFAULT_CATEGORIES,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    authorize_owned, require_caller, ListPlan, TodoFilter, TodoStore, TodoStoreError,
    TodoStoreResult,
};

/// Counts over a list of todos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
    pub overdue: usize,
}

impl TodoStats {
    /// Computes the counts at `now_ms`.
    pub fn from_todos(todos: &[Todo], now_ms: i64) -> Self {
        let completed = todos.iter().filter(|t| t.is_completed).count();
        Self {
            total: todos.len(),
            completed,
            remaining: todos.len() - completed,
            overdue: todos.iter().filter(|t| t.is_overdue(now_ms)).count(),
        }
    }
}

/// Todo and category operations on top of a [`TodoStore`].
#[derive(Debug)]
pub struct TodoService<S: TodoStore> {
    store: S,
}

impl<S: TodoStore> TodoService<S> {
    /// Creates a service backed by `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Category operations
    // =========================================================================

    /// Lists the caller's categories.
    pub async fn list_categories(&self, caller: Option<UserId>) -> TodoStoreResult<Vec<Category>> {
        let Some(user_id) = caller else {
            return Ok(Vec::new());
        };
        self.store.list_categories(user_id).await
    }

    /// Adds a category, rejecting a name the caller already uses.
    pub async fn add_category(
        &self,
        caller: Option<UserId>,
        new: NewCategory,
    ) -> TodoStoreResult<Category> {
        let user_id = require_caller(caller)?;

        if self
            .store
            .find_category_by_name(user_id, &new.name)
            .await?
            .is_some()
        {
            return Err(TodoStoreError::DuplicateName(new.name));
        }

        let category = self
            .store
            .insert_category(Category::new(user_id, new))
            .await?;

        tracing::info!(
            user_id = %user_id,
            category_id = %category.id,
            name = %category.name,
            "Category added"
        );
        Ok(category)
    }

    /// Removes a category no todo of the caller is filed under.
    pub async fn remove_category(&self, caller: Option<UserId>, id: Uuid) -> TodoStoreResult<()> {
        let user_id = require_caller(caller)?;
        let category = authorize_owned(user_id, id, self.store.get_category(id).await?)?;

        if self
            .store
            .todo_exists_in_category(user_id, &category.name)
            .await?
        {
            return Err(TodoStoreError::InUse(category.name));
        }

        self.store.delete_category(id).await?;

        tracing::info!(user_id = %user_id, category_id = %id, "Category removed");
        Ok(())
    }

    /// Adds the default categories the caller does not have yet.
    ///
    /// Returns only the categories that were created.
    pub async fn seed_default_categories(
        &self,
        caller: Option<UserId>,
    ) -> TodoStoreResult<Vec<Category>> {
        let user_id = require_caller(caller)?;
        let mut added = Vec::new();

        for (name, color) in DEFAULT_CATEGORIES {
            if self
                .store
                .find_category_by_name(user_id, name)
                .await?
                .is_some()
            {
                continue;
            }

            let category = Category::new(user_id, NewCategory::new(name, color));
            match self.store.insert_category(category).await {
                Ok(category) => added.push(category),
                Err(TodoStoreError::DuplicateName(_)) => {}
                Err(e) => return Err(e),
            }
        }

        tracing::info!(user_id = %user_id, count = added.len(), "Default categories seeded");
        Ok(added)
    }

    // =========================================================================
    // Todo operations
    // =========================================================================

    /// Lists the caller's todos matching `filter`.
    ///
    /// Search results come back in relevance order, everything else newest
    /// first.
    pub async fn list_todos(
        &self,
        caller: Option<UserId>,
        filter: &TodoFilter,
    ) -> TodoStoreResult<Vec<Todo>> {
        let Some(user_id) = caller else {
            return Ok(Vec::new());
        };

        match filter.plan() {
            ListPlan::Search { query, priority } => {
                let mut todos = self.store.search_todos(user_id, &query).await?;
                if let Some(priority) = priority {
                    todos.retain(|todo| todo.priority == priority);
                }
                Ok(todos)
            }
            ListPlan::Indexed(index) => {
                let mut todos = self.store.query_todos(user_id, index).await?;
                todos.retain(|todo| filter.matches(todo));
                Ok(todos)
            }
        }
    }

    /// Adds an active todo owned by the caller.
    pub async fn add_todo(&self, caller: Option<UserId>, new: NewTodo) -> TodoStoreResult<Todo> {
        let user_id = require_caller(caller)?;
        let todo = self.store.insert_todo(Todo::new(user_id, new)).await?;

        tracing::info!(user_id = %user_id, todo_id = %todo.id, "Todo added");
        Ok(todo)
    }

    /// Applies a partial update to one of the caller's todos.
    pub async fn update_todo(
        &self,
        caller: Option<UserId>,
        id: Uuid,
        patch: &TodoPatch,
    ) -> TodoStoreResult<Todo> {
        let user_id = require_caller(caller)?;
        let todo = authorize_owned(user_id, id, self.store.get_todo(id).await?)?;

        if patch.is_empty() {
            return Ok(todo);
        }

        let todo = self.store.patch_todo(id, patch).await?;

        tracing::info!(user_id = %user_id, todo_id = %id, "Todo updated");
        Ok(todo)
    }

    /// Flips the completion state of one of the caller's todos.
    pub async fn toggle_todo(&self, caller: Option<UserId>, id: Uuid) -> TodoStoreResult<Todo> {
        let user_id = require_caller(caller)?;
        authorize_owned(user_id, id, self.store.get_todo(id).await?)?;

        let todo = self.store.toggle_todo_completed(id).await?;

        tracing::info!(
            user_id = %user_id,
            todo_id = %id,
            status = ?todo.status(),
            "Todo toggled"
        );
        Ok(todo)
    }

    /// Deletes one of the caller's todos.
    pub async fn remove_todo(&self, caller: Option<UserId>, id: Uuid) -> TodoStoreResult<()> {
        let user_id = require_caller(caller)?;
        authorize_owned(user_id, id, self.store.get_todo(id).await?)?;

        self.store.delete_todo(id).await?;

        tracing::info!(user_id = %user_id, todo_id = %id, "Todo removed");
        Ok(())
    }

    /// Counts the caller's todos matching `filter` at `now_ms`.
    pub async fn todo_stats(
        &self,
        caller: Option<UserId>,
        filter: &TodoFilter,
        now_ms: i64,
    ) -> TodoStoreResult<TodoStats> {
        let todos = self.list_todos(caller, filter).await?;
        Ok(TodoStats::from_todos(&todos, now_ms))
    }
}
