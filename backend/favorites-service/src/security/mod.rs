//! Authentication primitives
//!
//! - **tokens**: HS256 token pairs backed by the session ledger in the cache store
//! - **password**: Argon2id password hashing

pub mod password;
pub mod tokens;

pub use password::{hash_password, verify_password};
pub use tokens::{AccessClaims, RefreshClaims, TokenPair, TokenService};
