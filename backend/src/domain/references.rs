//! Resolution of referenced entities by id.

use shared::EntityId;
use sqlx::SqliteConnection;
use tracing::warn;

use super::error::{DomainError, DomainResult};
use crate::storage::{EntityStore, Record};

/// Load a row of `T`, failing with `NotFound` when the id does not resolve
pub async fn resolve<T: Record>(conn: &mut SqliteConnection, id: EntityId) -> DomainResult<T> {
    match EntityStore::<T>::get(conn, id).await? {
        Some(record) => Ok(record),
        None => {
            warn!("{} not found: {}", T::KIND, id);
            Err(DomainError::not_found(T::KIND, id))
        }
    }
}

/// Like [`resolve`] but only checks existence
pub async fn ensure_exists<T: Record>(conn: &mut SqliteConnection, id: EntityId) -> DomainResult<()> {
    if EntityStore::<T>::exists(conn, id).await? {
        Ok(())
    } else {
        warn!("{} not found: {}", T::KIND, id);
        Err(DomainError::not_found(T::KIND, id))
    }
}

/// Resolve an optional reference; `None` stays `None`
pub async fn resolve_optional<T: Record>(
    conn: &mut SqliteConnection,
    id: Option<EntityId>,
) -> DomainResult<Option<T>> {
    match id {
        Some(id) => resolve::<T>(conn, id).await.map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use crate::storage::{DbConnection, PetTypeRepository};
    use shared::{CreateCatalogEntryRequest, PetType};

    #[tokio::test]
    async fn test_resolve_existing_and_missing() {
        let db = DbConnection::init_in_memory().await.expect("Failed to create test database");
        let mut conn = db.acquire().await.unwrap();
        let dog = PetTypeRepository::insert(
            &mut conn,
            &CreateCatalogEntryRequest {
                name: "Dog".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();

        let found = resolve::<PetType>(&mut conn, dog.id).await.unwrap();
        assert_eq!(found.name, "Dog");

        let err = resolve::<PetType>(&mut conn, dog.id + 100).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(ensure_exists::<PetType>(&mut conn, dog.id + 100).await.is_err());

        assert!(resolve_optional::<PetType>(&mut conn, None).await.unwrap().is_none());
        assert!(resolve_optional::<PetType>(&mut conn, Some(dog.id)).await.unwrap().is_some());
    }
}
