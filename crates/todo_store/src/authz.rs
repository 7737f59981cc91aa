//! Ownership checks applied before every mutation.

use entities::{Category, Todo, UserId};
use uuid::Uuid;

use crate::{TodoStoreError, TodoStoreResult};

/// A record owned by exactly one user.
pub trait Owned {
    /// Entity name used in error messages.
    const ENTITY_TYPE: &'static str;

    /// The owning user.
    fn owner(&self) -> UserId;
}

impl Owned for Category {
    const ENTITY_TYPE: &'static str = "Category";

    fn owner(&self) -> UserId {
        self.user_id
    }
}

impl Owned for Todo {
    const ENTITY_TYPE: &'static str = "Todo";

    fn owner(&self) -> UserId {
        self.user_id
    }
}

/// Resolves the caller for a write, failing if nobody is signed in.
pub fn require_caller(caller: Option<UserId>) -> TodoStoreResult<UserId> {
    caller.ok_or(TodoStoreError::Unauthenticated)
}

/// Checks a loaded record against the caller.
///
/// `record` is the result of looking up `id`; a missing record is
/// `NotFound` and someone else's record is `Forbidden`.
pub fn authorize_owned<T: Owned>(caller: UserId, id: Uuid, record: Option<T>) -> TodoStoreResult<T> {
    let record = record.ok_or_else(|| TodoStoreError::not_found(T::ENTITY_TYPE, id))?;

    if record.owner() != caller {
        tracing::warn!(
            entity_type = T::ENTITY_TYPE,
            id = %id,
            caller = %caller,
            "Rejected mutation of another user's record"
        );
        return Err(TodoStoreError::forbidden(T::ENTITY_TYPE, id));
    }

    Ok(record)
}
