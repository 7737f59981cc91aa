//! Access tokens for taskdeck.
//!
//! The server runs either in single-user mode, where every request acts as
//! the configured local user, or in multi-user mode, where callers present a
//! bearer token issued by [`JwtManager`].

mod error;
mod jwt;

pub use error::*;
pub use jwt::*;

/// Default JWT expiration time in hours.
pub const DEFAULT_JWT_EXPIRATION_HOURS: u64 = 24;

/// Default JWT issuer.
pub const DEFAULT_JWT_ISSUER: &str = "taskdeck";
