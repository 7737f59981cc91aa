//! Todo and category storage for taskdeck.
//!
//! This crate provides the storage abstraction ([`TodoStore`]) with an
//! in-memory backend for tests and a SQLite backend for deployments, the
//! list-filter resolution, the ownership gate and [`TodoService`], which
//! exposes the operations the server calls.

mod authz;
mod error;
mod memory;
mod query;
mod search;
mod service;
mod sqlite;
mod traits;

pub use authz::*;
pub use error::*;
pub use memory::*;
pub use query::*;
pub use service::*;
pub use sqlite::*;
pub use traits::*;
