//! Store error taxonomy.

/// Errors raised by the local and remote store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The remote answered but the call itself is broken (schema, decoding).
    #[error("remote store error: {0}")]
    Remote(String),

    #[error(transparent)]
    Engine(#[from] tandem_engine::Error),

    #[error("local store error: {0}")]
    Local(String),
}

impl StoreError {
    /// Whether the caller should fall back to the local store.
    ///
    /// True for connectivity and authorization failures only. Serialization
    /// and envelope errors are never masked by a fallback.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_)
                | StoreError::PermissionDenied(_)
                | StoreError::Unauthenticated(_)
        )
    }

    /// Stable machine-readable code, surfaced as `SaveResult.code`.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "unavailable",
            StoreError::PermissionDenied(_) => "permission-denied",
            StoreError::Unauthenticated(_) => "unauthenticated",
            StoreError::Remote(_) => "remote",
            StoreError::Engine(e) => e.code(),
            StoreError::Local(_) => "local-store",
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Local(err.to_string())
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
