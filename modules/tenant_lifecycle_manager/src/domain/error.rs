/// Domain-level errors for the tenant lifecycle manager.
///
/// Three-way taxonomy: caller-caused (`User`), missing entity (`NotFound`), and
/// propagated infrastructure failure (`Internal`). Infrastructure-free by design;
/// conversion to the wire representation happens once, at the REST boundary.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{0}")]
    User(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<anyhow::Error> for DomainError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e.to_string())
    }
}
