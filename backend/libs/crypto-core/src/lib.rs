//! Credential primitives shared by Strak services.
//!
//! - `jwt`: RS256 access/refresh token issuing and validation
//! - `password`: Argon2id hashing and password policy

pub mod jwt;
pub mod password;

#[cfg(any(test, feature = "test-keys"))]
pub mod testing;

pub use password::{check_password_policy, hash_password, verify_password, PasswordError};
