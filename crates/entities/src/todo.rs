//! Todo entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserId;

/// Window before a deadline in which a todo counts as due soon.
pub const DUE_SOON_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// Priority of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Converts the priority to a string for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses a priority from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Lifecycle state of a todo, derived from `is_completed`.
///
/// Every todo starts `Active`; toggling moves it back and forth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Active,
    Completed,
}

/// A user-scoped todo item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user. Never changes after creation.
    pub user_id: UserId,
    /// Short title.
    pub text: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Completion flag, only changed by toggling.
    pub is_completed: bool,
    /// Name of the category, copied at write time. Not a foreign key.
    pub category: String,
    /// Priority.
    pub priority: Priority,
    /// Deadline in milliseconds since the Unix epoch.
    pub deadline: Option<i64>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Creates a new, active todo owned by `user_id`.
    pub fn new(user_id: UserId, new: NewTodo) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            text: new.text,
            description: new.description,
            is_completed: false,
            category: new.category,
            priority: new.priority,
            deadline: new.deadline,
            created_at: Utc::now(),
        }
    }

    /// Returns the lifecycle state.
    pub fn status(&self) -> TodoStatus {
        if self.is_completed {
            TodoStatus::Completed
        } else {
            TodoStatus::Active
        }
    }

    /// Returns true if the deadline has passed and the todo is still open.
    pub fn is_overdue(&self, now_ms: i64) -> bool {
        !self.is_completed && self.deadline.is_some_and(|deadline| deadline < now_ms)
    }

    /// Returns true if the todo is open and due within the next day.
    pub fn is_due_soon(&self, now_ms: i64) -> bool {
        !self.is_completed
            && self
                .deadline
                .is_some_and(|deadline| deadline >= now_ms && deadline < now_ms + DUE_SOON_WINDOW_MS)
    }

    /// Applies the fields present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: &TodoPatch) {
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = Some(deadline);
        }
    }
}

/// Fields supplied when adding a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    pub text: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub priority: Priority,
    #[serde(default)]
    pub deadline: Option<i64>,
}

impl NewTodo {
    pub fn new(text: impl Into<String>, category: impl Into<String>, priority: Priority) -> Self {
        Self {
            text: text.into(),
            description: None,
            category: category.into(),
            priority,
            deadline: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the deadline (milliseconds since the Unix epoch).
    pub fn with_deadline(mut self, deadline: i64) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Partial update of a todo. Omitted fields keep their value.
///
/// Completion is deliberately absent: it only changes through toggling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<i64>,
}

impl TodoPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.deadline.is_none()
    }
}
