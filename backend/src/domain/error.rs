//! Errors raised by the domain services.

use shared::EntityId;
use thiserror::Error;

use crate::storage::EntityKind;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} not found with id: {id}")]
    NotFound { entity: EntityKind, id: EntityId },

    #[error("{field} already exists: {value}")]
    Duplicate {
        entity: EntityKind,
        field: &'static str,
        value: String,
    },

    #[error("{field} {message}")]
    Validation { field: &'static str, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Coarse classification callers map onto their own status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    BadRequest,
    Internal,
}

impl DomainError {
    pub fn not_found(entity: EntityKind, id: EntityId) -> Self {
        DomainError::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::Duplicate { .. } => ErrorKind::Conflict,
            DomainError::Validation { .. } => ErrorKind::BadRequest,
            // A concurrent insert can slip past the pre-check and hit the UNIQUE index
            DomainError::Storage(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                ErrorKind::Conflict
            }
            DomainError::Storage(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = DomainError::not_found(EntityKind::PetType, 42);
        assert_eq!(err.to_string(), "Pet type not found with id: 42");
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = DomainError::Duplicate {
            entity: EntityKind::Owner,
            field: "Email",
            value: "a@x".to_string(),
        };
        assert_eq!(err.to_string(), "Email already exists: a@x");
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = DomainError::Validation {
            field: "Name",
            message: "is required".to_string(),
        };
        assert_eq!(err.to_string(), "Name is required");
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_storage_errors_are_internal() {
        let err = DomainError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_unique_index_violation_is_a_conflict() {
        let db = crate::storage::DbConnection::init_in_memory().await.expect("Failed to create test database");
        let insert = "INSERT INTO specialties (name, active, created_at) VALUES ('Surgery', 1, '2025-01-01T00:00:00Z')";
        sqlx::query(insert).execute(db.pool()).await.expect("First insert should succeed");

        let err = sqlx::query(insert).execute(db.pool()).await.unwrap_err();
        assert_eq!(DomainError::from(err).kind(), ErrorKind::Conflict);
    }
}
