//! # auth-adapters
//!
//! Credential and session adapters for the `PasswordHasher` and
//! `TokenService` ports.
//!
//! - [`Argon2PasswordHasher`]: always compiled. PHC-format Argon2id hashes
//!   with a random salt per password.
//! - `JwtTokenService` (feature `auth-jwt`): HS256 bearer tokens.

mod error;
pub mod password;
#[cfg(feature = "auth-jwt")]
pub mod token;

pub use error::AuthAdapterError;
pub use password::Argon2PasswordHasher;
#[cfg(feature = "auth-jwt")]
pub use token::JwtTokenService;
