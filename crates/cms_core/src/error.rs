//! Error taxonomy shared by every repository operation.
//!
//! # Responsibility
//! - Fold validation, lookup and storage failures into three kinds the
//!   boundary layer can map to responses without inspecting SQLite details.
//!
//! # Invariants
//! - Every `RepoError` classifies into exactly one `ErrorKind`.
//! - `Validation` and `NotFound` are raised before a transaction opens.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use crate::model::{EntityId, EntityKind};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Coarse failure category consumed by the boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller supplied missing or invalid data.
    Validation,
    /// Requested identifier has no row.
    NotFound,
    /// The persistence engine failed.
    Storage,
}

impl ErrorKind {
    /// Stable code used in log lines.
    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::NotFound => "not_found",
            Self::Storage => "storage_error",
        }
    }
}

/// Persistence failure for reasons the caller cannot fix.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// Persisted row breaks a model invariant.
    InvalidData(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

/// Error returned by every repository operation.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    NotFound { entity: EntityKind, id: EntityId },
    Storage(StorageError),
}

impl RepoError {
    pub fn not_found(entity: EntityKind, id: EntityId) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::Storage(StorageError::InvalidData(message.into()))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, .. } => write!(f, "{} not found", entity.label()),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Storage(StorageError::Db(value))
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Db(DbError::Sqlite(value)))
    }
}
