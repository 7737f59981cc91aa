//! SQLite todo store implementation.
//!
//! Todos keep an autoincrement `seq` column for creation order, one
//! secondary index per [`TodoIndex`] variant, and an FTS5 table holding the
//! searchable text. The FTS table is standalone; every write to `todos`
//! updates it in the same transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{Category, Priority, Todo, TodoPatch, User, UserId};
use sqlx::{
    sqlite::{SqlitePool, SqlitePoolOptions},
    FromRow, QueryBuilder, Sqlite,
};
use uuid::Uuid;

use crate::{search, SearchQuery, TodoIndex, TodoStore, TodoStoreError, TodoStoreResult};

const SCHEMA: [&str; 9] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT,
        is_anonymous INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        color TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_user_name ON categories (user_id, name)",
    r#"
    CREATE TABLE IF NOT EXISTS todos (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        user_id TEXT NOT NULL,
        text TEXT NOT NULL,
        description TEXT,
        is_completed INTEGER NOT NULL DEFAULT 0,
        category TEXT NOT NULL,
        priority TEXT NOT NULL,
        deadline INTEGER,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_todos_user ON todos (user_id, seq)",
    "CREATE INDEX IF NOT EXISTS idx_todos_user_category ON todos (user_id, category, seq)",
    "CREATE INDEX IF NOT EXISTS idx_todos_user_priority ON todos (user_id, priority, seq)",
    "CREATE INDEX IF NOT EXISTS idx_todos_user_completed ON todos (user_id, is_completed, seq)",
    r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS todos_fts USING fts5(
        todo_id UNINDEXED,
        text,
        tokenize = 'unicode61 remove_diacritics 0'
    )
    "#,
];

const TODO_COLUMNS: &str = "t.id, t.user_id, t.text, t.description, t.is_completed, t.category, \
                            t.priority, t.deadline, t.created_at";

/// Database row for User
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: Option<String>,
    is_anonymous: bool,
    created_at: String,
}

/// Database row for Category
#[derive(Debug, FromRow)]
struct CategoryRow {
    id: String,
    user_id: String,
    name: String,
    color: String,
    created_at: String,
}

/// Database row for Todo
#[derive(Debug, FromRow)]
struct TodoRow {
    id: String,
    user_id: String,
    text: String,
    description: Option<String>,
    is_completed: bool,
    category: String,
    priority: String,
    deadline: Option<i64>,
    created_at: String,
}

fn parse_uuid(field: &str, value: &str) -> TodoStoreResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| TodoStoreError::Corrupt(format!("{} {:?}: {}", field, value, e)))
}

fn parse_timestamp(value: &str) -> TodoStoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TodoStoreError::Corrupt(format!("created_at {:?}: {}", value, e)))
}

impl TryFrom<UserRow> for User {
    type Error = TodoStoreError;

    fn try_from(row: UserRow) -> TodoStoreResult<Self> {
        Ok(User {
            id: parse_uuid("user id", &row.id)?.into(),
            name: row.name,
            is_anonymous: row.is_anonymous,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<CategoryRow> for Category {
    type Error = TodoStoreError;

    fn try_from(row: CategoryRow) -> TodoStoreResult<Self> {
        Ok(Category {
            id: parse_uuid("category id", &row.id)?,
            user_id: parse_uuid("user id", &row.user_id)?.into(),
            name: row.name,
            color: row.color,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<TodoRow> for Todo {
    type Error = TodoStoreError;

    fn try_from(row: TodoRow) -> TodoStoreResult<Self> {
        let priority = Priority::parse(&row.priority)
            .ok_or_else(|| TodoStoreError::Corrupt(format!("priority {:?}", row.priority)))?;

        Ok(Todo {
            id: parse_uuid("todo id", &row.id)?,
            user_id: parse_uuid("user id", &row.user_id)?.into(),
            text: row.text,
            description: row.description,
            is_completed: row.is_completed,
            category: row.category,
            priority,
            deadline: row.deadline,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

fn into_todos(rows: Vec<TodoRow>) -> TodoStoreResult<Vec<Todo>> {
    rows.into_iter().map(Todo::try_from).collect()
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// SQLite-backed todo store.
#[derive(Debug, Clone)]
pub struct SqliteTodoStore {
    pool: SqlitePool,
}

impl SqliteTodoStore {
    /// Connects to a database URL such as `sqlite:taskdeck.db?mode=rwc` and
    /// creates the schema if needed.
    pub async fn connect(database_url: &str) -> TodoStoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Self::from_pool(pool).await
    }

    /// Opens a private in-memory database.
    ///
    /// The pool holds a single connection that is never recycled, since
    /// every SQLite connection to `:memory:` sees its own database.
    pub async fn in_memory() -> TodoStoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool and creates the schema if needed.
    pub async fn from_pool(pool: SqlitePool) -> TodoStoreResult<Self> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_migrations(&self) -> TodoStoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!("SQLite schema ready");
        Ok(())
    }

    async fn fetch_todo<'e, E>(executor: E, id: Uuid) -> TodoStoreResult<Option<Todo>>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let row: Option<TodoRow> =
            sqlx::query_as(&format!("SELECT {} FROM todos t WHERE t.id = ?", TODO_COLUMNS))
                .bind(id.to_string())
                .fetch_optional(executor)
                .await?;

        row.map(Todo::try_from).transpose()
    }
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> TodoStoreResult<User> {
        sqlx::query("INSERT INTO users (id, name, is_anonymous, created_at) VALUES (?, ?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.name)
            .bind(user.is_anonymous)
            .bind(user.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    TodoStoreError::Other(format!("User already exists: {}", user.id))
                } else {
                    e.into()
                }
            })?;

        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> TodoStoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, name, is_anonymous, created_at FROM users WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    // =========================================================================
    // Category operations
    // =========================================================================

    async fn insert_category(&self, category: Category) -> TodoStoreResult<Category> {
        sqlx::query(
            "INSERT INTO categories (id, user_id, name, color, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(category.id.to_string())
        .bind(category.user_id.to_string())
        .bind(&category.name)
        .bind(&category.color)
        .bind(category.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                TodoStoreError::DuplicateName(category.name.clone())
            } else {
                e.into()
            }
        })?;

        Ok(category)
    }

    async fn get_category(&self, id: Uuid) -> TodoStoreResult<Option<Category>> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "SELECT id, user_id, name, color, created_at FROM categories WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Category::try_from).transpose()
    }

    async fn list_categories(&self, owner: UserId) -> TodoStoreResult<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            "SELECT id, user_id, name, color, created_at FROM categories WHERE user_id = ? \
             ORDER BY rowid",
        )
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Category::try_from).collect()
    }

    async fn find_category_by_name(
        &self,
        owner: UserId,
        name: &str,
    ) -> TodoStoreResult<Option<Category>> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "SELECT id, user_id, name, color, created_at FROM categories \
             WHERE user_id = ? AND name = ?",
        )
        .bind(owner.to_string())
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Category::try_from).transpose()
    }

    async fn delete_category(&self, id: Uuid) -> TodoStoreResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TodoStoreError::not_found("Category", id));
        }
        Ok(())
    }

    // =========================================================================
    // Todo operations
    // =========================================================================

    async fn insert_todo(&self, todo: Todo) -> TodoStoreResult<Todo> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO todos (id, user_id, text, description, is_completed, category, \
             priority, deadline, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(todo.id.to_string())
        .bind(todo.user_id.to_string())
        .bind(&todo.text)
        .bind(&todo.description)
        .bind(todo.is_completed)
        .bind(&todo.category)
        .bind(todo.priority.as_str())
        .bind(todo.deadline)
        .bind(todo.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO todos_fts (todo_id, text) VALUES (?, ?)")
            .bind(todo.id.to_string())
            .bind(&todo.text)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(todo)
    }

    async fn get_todo(&self, id: Uuid) -> TodoStoreResult<Option<Todo>> {
        Self::fetch_todo(&self.pool, id).await
    }

    async fn patch_todo(&self, id: Uuid, patch: &TodoPatch) -> TodoStoreResult<Todo> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE todos SET \
             text = COALESCE(?, text), \
             description = COALESCE(?, description), \
             category = COALESCE(?, category), \
             priority = COALESCE(?, priority), \
             deadline = COALESCE(?, deadline) \
             WHERE id = ?",
        )
        .bind(&patch.text)
        .bind(&patch.description)
        .bind(&patch.category)
        .bind(patch.priority.map(|p| p.as_str()))
        .bind(patch.deadline)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TodoStoreError::not_found("Todo", id));
        }

        if let Some(text) = &patch.text {
            sqlx::query("UPDATE todos_fts SET text = ? WHERE todo_id = ?")
                .bind(text)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        let todo = Self::fetch_todo(&mut *tx, id)
            .await?
            .ok_or_else(|| TodoStoreError::not_found("Todo", id))?;

        tx.commit().await?;
        Ok(todo)
    }

    async fn toggle_todo_completed(&self, id: Uuid) -> TodoStoreResult<Todo> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE todos SET is_completed = NOT is_completed WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TodoStoreError::not_found("Todo", id));
        }

        let todo = Self::fetch_todo(&mut *tx, id)
            .await?
            .ok_or_else(|| TodoStoreError::not_found("Todo", id))?;

        tx.commit().await?;
        Ok(todo)
    }

    async fn delete_todo(&self, id: Uuid) -> TodoStoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TodoStoreError::not_found("Todo", id));
        }

        sqlx::query("DELETE FROM todos_fts WHERE todo_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn query_todos(&self, owner: UserId, index: TodoIndex) -> TodoStoreResult<Vec<Todo>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM todos t WHERE t.user_id = ",
            TODO_COLUMNS
        ));
        query.push_bind(owner.to_string());

        match index {
            TodoIndex::ByOwner => {}
            TodoIndex::ByCategory(category) => {
                query.push(" AND t.category = ").push_bind(category);
            }
            TodoIndex::ByPriority(priority) => {
                query.push(" AND t.priority = ").push_bind(priority.as_str());
            }
            TodoIndex::ByCompleted(completed) => {
                query.push(" AND t.is_completed = ").push_bind(completed);
            }
        }
        query.push(" ORDER BY t.seq DESC");

        let rows: Vec<TodoRow> = query.build_query_as().fetch_all(&self.pool).await?;
        into_todos(rows)
    }

    async fn search_todos(
        &self,
        owner: UserId,
        search_query: &SearchQuery,
    ) -> TodoStoreResult<Vec<Todo>> {
        let Some(expression) = search::fts_expression(&search_query.text) else {
            return Ok(Vec::new());
        };

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM todos_fts JOIN todos t ON t.id = todos_fts.todo_id \
             WHERE todos_fts MATCH ",
            TODO_COLUMNS
        ));
        query.push_bind(expression);
        query.push(" AND t.user_id = ").push_bind(owner.to_string());

        if let Some(category) = &search_query.category {
            query.push(" AND t.category = ").push_bind(category.clone());
        }
        if let Some(completed) = search_query.completed {
            query.push(" AND t.is_completed = ").push_bind(completed);
        }
        query.push(" ORDER BY bm25(todos_fts), t.seq DESC");

        let rows: Vec<TodoRow> = query.build_query_as().fetch_all(&self.pool).await?;
        into_todos(rows)
    }

    async fn todo_exists_in_category(
        &self,
        owner: UserId,
        category: &str,
    ) -> TodoStoreResult<bool> {
        let found: i64 = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM todos WHERE user_id = ? AND category = ?)",
        )
        .bind(owner.to_string())
        .bind(category)
        .fetch_one(&self.pool)
        .await?;

        Ok(found != 0)
    }
}

#[cfg(test)]
mod tests {
    use entities::{NewCategory, NewTodo};

    use super::*;

    async fn add(store: &SqliteTodoStore, owner: UserId, new: NewTodo) -> Todo {
        store.insert_todo(Todo::new(owner, new)).await.unwrap()
    }

    #[tokio::test]
    async fn test_user_round_trip() {
        let store = SqliteTodoStore::in_memory().await.unwrap();
        let user = store.create_user(User::anonymous()).await.unwrap();

        let fetched = store.get_user(user.id).await.unwrap().unwrap();
        assert!(fetched.is_anonymous);
        assert_eq!(fetched.created_at, user.created_at);

        assert!(store.create_user(user).await.is_err());
        assert!(store.get_user(UserId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_category_name_is_unique_per_user() {
        let store = SqliteTodoStore::in_memory().await.unwrap();
        let owner = UserId::new();

        store
            .insert_category(Category::new(owner, NewCategory::new("Work", "#f00")))
            .await
            .unwrap();

        let err = store
            .insert_category(Category::new(owner, NewCategory::new("Work", "#0f0")))
            .await
            .unwrap_err();
        assert!(matches!(err, TodoStoreError::DuplicateName(name) if name == "Work"));

        // Another user may reuse the name.
        store
            .insert_category(Category::new(UserId::new(), NewCategory::new("Work", "#00f")))
            .await
            .unwrap();

        let categories = store.list_categories(owner).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].color, "#f00");
    }

    #[tokio::test]
    async fn test_todo_round_trip_and_indexes() {
        let store = SqliteTodoStore::in_memory().await.unwrap();
        let owner = UserId::new();

        let report = add(
            &store,
            owner,
            NewTodo::new("Write report", "Work", Priority::High)
                .with_description("Q3 numbers")
                .with_deadline(1_700_000_000_000),
        )
        .await;
        let milk = add(&store, owner, NewTodo::new("Buy milk", "Home", Priority::Low)).await;

        let fetched = store.get_todo(report.id).await.unwrap().unwrap();
        assert_eq!(fetched, report);

        let all = store.query_todos(owner, TodoIndex::ByOwner).await.unwrap();
        let ids: Vec<Uuid> = all.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![milk.id, report.id]);

        let high = store
            .query_todos(owner, TodoIndex::ByPriority(Priority::High))
            .await
            .unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].id, report.id);

        let home = store
            .query_todos(owner, TodoIndex::ByCategory("Home".to_string()))
            .await
            .unwrap();
        assert_eq!(home.len(), 1);
        assert_eq!(home[0].id, milk.id);

        assert!(store
            .query_todos(UserId::new(), TodoIndex::ByOwner)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_patch_keeps_omitted_fields() {
        let store = SqliteTodoStore::in_memory().await.unwrap();
        let owner = UserId::new();
        let todo = add(
            &store,
            owner,
            NewTodo::new("Buy milk", "Home", Priority::Low).with_description("2 litres"),
        )
        .await;

        let patch = TodoPatch {
            priority: Some(Priority::High),
            ..Default::default()
        };
        let patched = store.patch_todo(todo.id, &patch).await.unwrap();

        assert_eq!(patched.priority, Priority::High);
        assert_eq!(patched.text, todo.text);
        assert_eq!(patched.description, todo.description);
        assert_eq!(patched.category, todo.category);
        assert_eq!(patched.deadline, todo.deadline);
        assert_eq!(patched.created_at, todo.created_at);

        assert!(matches!(
            store.patch_todo(Uuid::new_v4(), &patch).await,
            Err(TodoStoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_follows_text_changes() {
        let store = SqliteTodoStore::in_memory().await.unwrap();
        let owner = UserId::new();
        let todo = add(&store, owner, NewTodo::new("Buy milk", "Home", Priority::Low)).await;
        add(&store, owner, NewTodo::new("Walk the dog", "Home", Priority::Low)).await;

        let hits = store
            .search_todos(owner, &SearchQuery::new("milk"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, todo.id);

        // Prefix match on the last term.
        let hits = store
            .search_todos(owner, &SearchQuery::new("mil"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let patch = TodoPatch {
            text: Some("Buy bread".to_string()),
            ..Default::default()
        };
        store.patch_todo(todo.id, &patch).await.unwrap();

        assert!(store
            .search_todos(owner, &SearchQuery::new("milk"))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .search_todos(owner, &SearchQuery::new("bread"))
                .await
                .unwrap()
                .len(),
            1
        );

        store.delete_todo(todo.id).await.unwrap();
        assert!(store
            .search_todos(owner, &SearchQuery::new("bread"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_search_narrowing() {
        let store = SqliteTodoStore::in_memory().await.unwrap();
        let owner = UserId::new();
        let open = add(&store, owner, NewTodo::new("Buy milk", "Home", Priority::Low)).await;
        let done = add(&store, owner, NewTodo::new("Milk run", "Errands", Priority::Low)).await;
        store.toggle_todo_completed(done.id).await.unwrap();

        let query = SearchQuery {
            completed: Some(false),
            ..SearchQuery::new("milk")
        };
        let hits = store.search_todos(owner, &query).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, open.id);

        let query = SearchQuery {
            category: Some("Errands".to_string()),
            ..SearchQuery::new("milk")
        };
        let hits = store.search_todos(owner, &query).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, done.id);

        assert!(store
            .search_todos(UserId::new(), &SearchQuery::new("milk"))
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .search_todos(owner, &SearchQuery::new("?!"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_todo_exists_in_category_and_delete() {
        let store = SqliteTodoStore::in_memory().await.unwrap();
        let owner = UserId::new();
        let todo = add(&store, owner, NewTodo::new("Buy milk", "Home", Priority::Low)).await;

        assert!(store.todo_exists_in_category(owner, "Home").await.unwrap());
        assert!(!store.todo_exists_in_category(owner, "Work").await.unwrap());

        store.delete_todo(todo.id).await.unwrap();
        assert!(!store.todo_exists_in_category(owner, "Home").await.unwrap());
        assert!(matches!(
            store.delete_todo(todo.id).await,
            Err(TodoStoreError::NotFound { .. })
        ));
    }
}
