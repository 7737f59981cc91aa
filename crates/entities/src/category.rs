//! Category entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserId;

/// A user-scoped label todos are filed under.
///
/// Todos reference a category by its `name`, not by `id`, so names are
/// unique per user and never change once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: UserId,
    /// Display name, unique within the owner's categories.
    pub name: String,
    /// Display color hint (e.g. `#3B82F6`). Not validated.
    pub color: String,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Creates a new category owned by `user_id`.
    pub fn new(user_id: UserId, new: NewCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: new.name,
            color: new.color,
            created_at: Utc::now(),
        }
    }
}

/// Fields supplied when adding a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Categories offered to a user who has none yet.
pub const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("Work", "#3B82F6"),
    ("Personal", "#10B981"),
    ("Shopping", "#F59E0B"),
    ("Health", "#EF4444"),
];
