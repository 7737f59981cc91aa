//! In-memory todo store implementation for testing.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use entities::{Category, Todo, TodoPatch, User, UserId};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{search, SearchQuery, TodoIndex, TodoStore, TodoStoreError, TodoStoreResult};

/// A todo tagged with its insertion sequence number.
#[derive(Debug, Clone)]
struct StoredTodo {
    seq: u64,
    todo: Todo,
}

/// In-memory todo store for testing purposes.
#[derive(Debug, Default)]
pub struct MemoryTodoStore {
    users: RwLock<HashMap<UserId, User>>,
    categories: RwLock<HashMap<Uuid, Category>>,
    todos: RwLock<HashMap<Uuid, StoredTodo>>,
    next_seq: AtomicU64,
}

impl MemoryTodoStore {
    /// Creates a new in-memory todo store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Sorts newest first and strips the sequence numbers.
fn newest_first(mut rows: Vec<StoredTodo>) -> Vec<Todo> {
    rows.sort_by(|a, b| b.seq.cmp(&a.seq));
    rows.into_iter().map(|row| row.todo).collect()
}

impl TodoIndex {
    fn covers(&self, owner: UserId, todo: &Todo) -> bool {
        todo.user_id == owner
            && match self {
                TodoIndex::ByOwner => true,
                TodoIndex::ByCategory(category) => &todo.category == category,
                TodoIndex::ByPriority(priority) => todo.priority == *priority,
                TodoIndex::ByCompleted(completed) => todo.is_completed == *completed,
            }
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> TodoStoreResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(TodoStoreError::Other(format!(
                "User already exists: {}",
                user.id
            )));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> TodoStoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    // =========================================================================
    // Category operations
    // =========================================================================

    async fn insert_category(&self, category: Category) -> TodoStoreResult<Category> {
        let mut categories = self.categories.write().await;
        if categories
            .values()
            .any(|c| c.user_id == category.user_id && c.name == category.name)
        {
            return Err(TodoStoreError::DuplicateName(category.name));
        }
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: Uuid) -> TodoStoreResult<Option<Category>> {
        let categories = self.categories.read().await;
        Ok(categories.get(&id).cloned())
    }

    async fn list_categories(&self, owner: UserId) -> TodoStoreResult<Vec<Category>> {
        let categories = self.categories.read().await;
        let mut result: Vec<Category> = categories
            .values()
            .filter(|c| c.user_id == owner)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    async fn find_category_by_name(
        &self,
        owner: UserId,
        name: &str,
    ) -> TodoStoreResult<Option<Category>> {
        let categories = self.categories.read().await;
        Ok(categories
            .values()
            .find(|c| c.user_id == owner && c.name == name)
            .cloned())
    }

    async fn delete_category(&self, id: Uuid) -> TodoStoreResult<()> {
        let mut categories = self.categories.write().await;
        if categories.remove(&id).is_none() {
            return Err(TodoStoreError::not_found("Category", id));
        }
        Ok(())
    }

    // =========================================================================
    // Todo operations
    // =========================================================================

    async fn insert_todo(&self, todo: Todo) -> TodoStoreResult<Todo> {
        let mut todos = self.todos.write().await;
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        todos.insert(
            todo.id,
            StoredTodo {
                seq,
                todo: todo.clone(),
            },
        );
        Ok(todo)
    }

    async fn get_todo(&self, id: Uuid) -> TodoStoreResult<Option<Todo>> {
        let todos = self.todos.read().await;
        Ok(todos.get(&id).map(|row| row.todo.clone()))
    }

    async fn patch_todo(&self, id: Uuid, patch: &TodoPatch) -> TodoStoreResult<Todo> {
        let mut todos = self.todos.write().await;
        let row = todos
            .get_mut(&id)
            .ok_or_else(|| TodoStoreError::not_found("Todo", id))?;
        row.todo.apply(patch);
        Ok(row.todo.clone())
    }

    async fn toggle_todo_completed(&self, id: Uuid) -> TodoStoreResult<Todo> {
        let mut todos = self.todos.write().await;
        let row = todos
            .get_mut(&id)
            .ok_or_else(|| TodoStoreError::not_found("Todo", id))?;
        row.todo.is_completed = !row.todo.is_completed;
        Ok(row.todo.clone())
    }

    async fn delete_todo(&self, id: Uuid) -> TodoStoreResult<()> {
        let mut todos = self.todos.write().await;
        if todos.remove(&id).is_none() {
            return Err(TodoStoreError::not_found("Todo", id));
        }
        Ok(())
    }

    async fn query_todos(&self, owner: UserId, index: TodoIndex) -> TodoStoreResult<Vec<Todo>> {
        let todos = self.todos.read().await;
        let rows: Vec<StoredTodo> = todos
            .values()
            .filter(|row| index.covers(owner, &row.todo))
            .cloned()
            .collect();
        Ok(newest_first(rows))
    }

    async fn search_todos(
        &self,
        owner: UserId,
        query: &SearchQuery,
    ) -> TodoStoreResult<Vec<Todo>> {
        let terms = search::terms(&query.text);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let todos = self.todos.read().await;
        let mut hits: Vec<(usize, &StoredTodo)> = todos
            .values()
            .filter(|row| {
                let todo = &row.todo;
                todo.user_id == owner
                    && query.category.as_ref().is_none_or(|c| &todo.category == c)
                    && query.completed.is_none_or(|c| todo.is_completed == c)
            })
            .map(|row| (search::score(&terms, &row.todo.text), row))
            .filter(|(score, _)| *score > 0)
            .collect();

        hits.sort_by(|(score_a, a), (score_b, b)| score_b.cmp(score_a).then(b.seq.cmp(&a.seq)));
        Ok(hits.into_iter().map(|(_, row)| row.todo.clone()).collect())
    }

    async fn todo_exists_in_category(
        &self,
        owner: UserId,
        category: &str,
    ) -> TodoStoreResult<bool> {
        let todos = self.todos.read().await;
        Ok(todos
            .values()
            .any(|row| row.todo.user_id == owner && row.todo.category == category))
    }
}

#[cfg(test)]
mod tests {
    use entities::{NewCategory, NewTodo, Priority};

    use super::*;

    async fn add(store: &MemoryTodoStore, owner: UserId, text: &str, category: &str) -> Todo {
        store
            .insert_todo(Todo::new(owner, NewTodo::new(text, category, Priority::Medium)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_category_crud() {
        let store = MemoryTodoStore::new();
        let owner = UserId::new();

        // Create
        let created = store
            .insert_category(Category::new(owner, NewCategory::new("Work", "#f00")))
            .await
            .unwrap();

        // Get
        let fetched = store.get_category(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Work");

        // Find by name is exact and owner-scoped
        assert!(store
            .find_category_by_name(owner, "Work")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_category_by_name(owner, "work")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_category_by_name(UserId::new(), "Work")
            .await
            .unwrap()
            .is_none());

        // Delete
        store.delete_category(created.id).await.unwrap();
        assert!(store.get_category(created.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete_category(created.id).await,
            Err(TodoStoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_query_is_newest_first_and_scoped() {
        let store = MemoryTodoStore::new();
        let owner = UserId::new();

        let first = add(&store, owner, "First", "Work").await;
        let second = add(&store, owner, "Second", "Home").await;
        let third = add(&store, owner, "Third", "Work").await;
        add(&store, UserId::new(), "Someone else's", "Work").await;

        let all = store.query_todos(owner, TodoIndex::ByOwner).await.unwrap();
        let ids: Vec<Uuid> = all.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        let work = store
            .query_todos(owner, TodoIndex::ByCategory("Work".to_string()))
            .await
            .unwrap();
        let ids: Vec<Uuid> = work.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);
    }

    #[tokio::test]
    async fn test_patch_and_complete() {
        let store = MemoryTodoStore::new();
        let owner = UserId::new();
        let todo = add(&store, owner, "Buy milk", "Home").await;

        let patch = TodoPatch {
            text: Some("Buy oat milk".to_string()),
            ..Default::default()
        };
        let patched = store.patch_todo(todo.id, &patch).await.unwrap();
        assert_eq!(patched.text, "Buy oat milk");
        assert_eq!(patched.category, "Home");

        let completed = store.toggle_todo_completed(todo.id).await.unwrap();
        assert!(completed.is_completed);

        let done = store
            .query_todos(owner, TodoIndex::ByCompleted(true))
            .await
            .unwrap();
        assert_eq!(done.len(), 1);

        assert!(matches!(
            store.patch_todo(Uuid::new_v4(), &patch).await,
            Err(TodoStoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_ranks_and_narrows() {
        let store = MemoryTodoStore::new();
        let owner = UserId::new();

        let milk = add(&store, owner, "Milk", "Home").await;
        let buy_milk = add(&store, owner, "Buy milk", "Home").await;
        add(&store, owner, "Walk the dog", "Home").await;
        let work_milk = add(&store, owner, "Milk report", "Work").await;

        let results = store
            .search_todos(owner, &SearchQuery::new("buy milk"))
            .await
            .unwrap();
        let ids: Vec<Uuid> = results.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![buy_milk.id, work_milk.id, milk.id]);

        let query = SearchQuery {
            category: Some("Work".to_string()),
            ..SearchQuery::new("milk")
        };
        let results = store.search_todos(owner, &query).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, work_milk.id);

        let results = store
            .search_todos(UserId::new(), &SearchQuery::new("milk"))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_todo_exists_in_category() {
        let store = MemoryTodoStore::new();
        let owner = UserId::new();
        let todo = add(&store, owner, "Buy milk", "Home").await;

        assert!(store.todo_exists_in_category(owner, "Home").await.unwrap());
        assert!(!store.todo_exists_in_category(owner, "Work").await.unwrap());
        assert!(!store
            .todo_exists_in_category(UserId::new(), "Home")
            .await
            .unwrap());

        store.delete_todo(todo.id).await.unwrap();
        assert!(!store.todo_exists_in_category(owner, "Home").await.unwrap());
    }
}
