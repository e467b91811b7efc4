//! leafnode authentication and authorization
//!
//! JWT tokens for admin users, argon2 password hashing and the shared
//! secret that jobs use to call each other.

pub mod error;
pub mod internal;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use error::AuthError;
pub use internal::InternalSecret;
pub use jwt::{Claims, JwtManager};
pub use middleware::{AuthUser, Caller, extract_bearer_token, identify_caller};
pub use password::{hash_password, verify_password};
