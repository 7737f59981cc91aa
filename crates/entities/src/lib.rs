//! Core entity definitions for taskdeck.
//!
//! This crate defines the data types shared by the store and the server:
//! users, categories and todo items, plus the request shapes used to create
//! and patch them.

mod category;
mod todo;
mod user;

pub use category::*;
pub use todo::*;
pub use user::*;
