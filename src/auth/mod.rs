//! Authentication: JWT access tokens, Argon2id password hashing, and axum
//! extractors for authenticated/admin callers.

pub mod jwt;
pub mod middleware;
pub mod password;
