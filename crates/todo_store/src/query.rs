//! List filter resolution.
//!
//! A list request may carry several filters, but only one of them drives
//! the store lookup. The rest are enforced afterwards by [`TodoFilter::matches`].

use entities::{Priority, Todo};
use serde::{Deserialize, Serialize};

use crate::{SearchQuery, TodoIndex};

/// Filters accepted when listing todos.
///
/// Empty `category` and blank `search` values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
}

/// How a list request is executed against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListPlan {
    /// Full-text search, results filtered by priority afterwards.
    Search {
        query: SearchQuery,
        priority: Option<Priority>,
    },
    /// Scoped index lookup followed by the full post-filter.
    Indexed(TodoIndex),
}

impl TodoFilter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by category name.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Filters by priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Filters by completion state.
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Searches todo text.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// The category filter, if non-empty.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    /// The trimmed search text, if any.
    pub fn search_text(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Chooses the lookup path.
    ///
    /// Search wins over everything. Otherwise exactly one index is used, in
    /// the order category, priority, completion, owner.
    pub fn plan(&self) -> ListPlan {
        if let Some(text) = self.search_text() {
            return ListPlan::Search {
                query: SearchQuery {
                    text: text.to_string(),
                    category: self.category().map(str::to_string),
                    completed: self.completed,
                },
                priority: self.priority,
            };
        }

        let index = if let Some(category) = self.category() {
            TodoIndex::ByCategory(category.to_string())
        } else if let Some(priority) = self.priority {
            TodoIndex::ByPriority(priority)
        } else if let Some(completed) = self.completed {
            TodoIndex::ByCompleted(completed)
        } else {
            TodoIndex::ByOwner
        };
        ListPlan::Indexed(index)
    }

    /// Returns true if `todo` satisfies every requested category, priority
    /// and completion filter.
    pub fn matches(&self, todo: &Todo) -> bool {
        self.category().is_none_or(|c| todo.category == c)
            && self.priority.is_none_or(|p| todo.priority == p)
            && self.completed.is_none_or(|c| todo.is_completed == c)
    }
}
