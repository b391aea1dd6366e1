use serde::Serialize;
use thiserror::Error;

/// Result alias for catalog verbs.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Coarse failure classes shared by every catalog backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidArgument,
    Conflict,
    Other,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Other => "other",
        }
    }
}

/// Canonical catalog error surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("{entity} not found")]
    NotFound { entity: String },
    #[error("{entity} already exists")]
    AlreadyExists { entity: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("concurrent modification of {entity}: {message}")]
    Conflict { entity: String, message: String },
    #[error("catalog service error: {0}")]
    Other(String),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::NotFound { .. } => ErrorKind::NotFound,
            CatalogError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            CatalogError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CatalogError::Conflict { .. } => ErrorKind::Conflict,
            CatalogError::Other(_) => ErrorKind::Other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub(crate) fn not_found(entity: impl Into<String>) -> Self {
        CatalogError::NotFound {
            entity: entity.into(),
        }
    }

    pub(crate) fn already_exists(entity: impl Into<String>) -> Self {
        CatalogError::AlreadyExists {
            entity: entity.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        CatalogError::InvalidArgument(message.into())
    }
}
