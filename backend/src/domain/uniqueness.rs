//! Pre-write uniqueness checks.
//!
//! Comparison is exact and case-sensitive on the stored string. The UNIQUE
//! indexes in the schema back these checks; a concurrent writer that slips
//! past them still surfaces as a conflict through [`DomainError::kind`].

use shared::EntityId;
use sqlx::SqliteConnection;
use tracing::warn;

use super::error::{DomainError, DomainResult};
use crate::storage::{EntityStore, Predicate, Record, SqlValue};

/// A unique column and the label used when reporting a duplicate
#[derive(Debug, Clone, Copy)]
pub struct UniqueField {
    pub column: &'static str,
    pub label: &'static str,
}

pub const OWNER_EMAIL: UniqueField = UniqueField { column: "email", label: "Email" };
pub const OWNER_DOCUMENT: UniqueField = UniqueField { column: "document_number", label: "Document number" };
pub const PET_TYPE_NAME: UniqueField = UniqueField { column: "name", label: "Pet type" };
pub const SPECIALTY_NAME: UniqueField = UniqueField { column: "name", label: "Specialty" };
pub const VETERINARIAN_EMAIL: UniqueField = UniqueField { column: "email", label: "Email" };
pub const VETERINARIAN_LICENSE: UniqueField = UniqueField { column: "license_number", label: "License number" };

pub struct UniquenessChecker;

impl UniquenessChecker {
    /// Fail with `Duplicate` if another row of `T` already holds `value`.
    /// `exclude_id` is the row being updated, which may keep its own value.
    pub async fn check_unique<T: Record>(
        conn: &mut SqliteConnection,
        field: UniqueField,
        value: &str,
        exclude_id: Option<EntityId>,
    ) -> DomainResult<()> {
        let mut predicates = vec![Predicate::Equals(field.column, SqlValue::from(value))];
        if let Some(id) = exclude_id {
            predicates.push(Predicate::NotEquals("id", SqlValue::Integer(id)));
        }

        let taken = EntityStore::<T>::ids_where(conn, &predicates).await?;
        if !taken.is_empty() {
            warn!("{} already exists for {}: {}", field.label, T::KIND, value);
            return Err(DomainError::Duplicate {
                entity: T::KIND,
                field: field.label,
                value: value.to_string(),
            });
        }
        Ok(())
    }

    /// Absent optional values are never checked
    pub async fn check_unique_optional<T: Record>(
        conn: &mut SqliteConnection,
        field: UniqueField,
        value: Option<&str>,
        exclude_id: Option<EntityId>,
    ) -> DomainResult<()> {
        match value {
            Some(value) => Self::check_unique::<T>(conn, field, value, exclude_id).await,
            None => Ok(()),
        }
    }
}
