use crate::domain::error::DomainError;

/// Contract-facing error, exposed to other modules through the client hub.
/// Infrastructure-free, like [`DomainError`]; kept separate so callers outside
/// this crate depend on a stable error shape rather than the domain internals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("{0}")]
    User(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal error")]
    Internal,
}

impl From<DomainError> for LifecycleError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::User(msg) => Self::User(msg),
            DomainError::NotFound(msg) => Self::NotFound(msg),
            DomainError::Internal(_) => Self::Internal,
        }
    }
}
