use domains::AppError;
use thiserror::Error;

/// Failures raised inside this crate before they cross the port boundary.
#[derive(Debug, Error)]
pub enum AuthAdapterError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("hashing task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("token could not be signed: {0}")]
    Sign(String),

    #[error("token rejected: {0}")]
    Rejected(String),
}

impl From<AuthAdapterError> for AppError {
    fn from(err: AuthAdapterError) -> Self {
        match err {
            AuthAdapterError::Rejected(reason) => AppError::Unauthorized(reason),
            other => AppError::internal(other.to_string()),
        }
    }
}
