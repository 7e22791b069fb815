use shared::{CreateOwnerRequest, EntityId, Owner, OwnerWithPets, UpdateOwnerRequest};
use tracing::{debug, info};

use super::cascade::{CascadePolicy, CascadeReport};
use super::error::DomainResult;
use super::projections::AggregateProjector;
use super::references::resolve;
use super::uniqueness::{UniquenessChecker, OWNER_DOCUMENT, OWNER_EMAIL};
use super::validation::{normalize_optional, patch, patch_optional, require, require_email, require_email_patch, require_patch};
use crate::storage::{DbConnection, EntityKind, EntityStore, OwnerRepository, Predicate};

/// Service for managing pet owners
#[derive(Clone)]
pub struct OwnerService {
    db: DbConnection,
}

impl OwnerService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Register a new owner. Email and document number must be unused.
    pub async fn create(&self, request: CreateOwnerRequest) -> DomainResult<Owner> {
        info!("Creating owner: email={}", request.email);

        let request = CreateOwnerRequest {
            first_name: require("First name", &request.first_name)?,
            last_name: require("Last name", &request.last_name)?,
            document_number: normalize_optional(request.document_number),
            email: require_email("Email", &request.email)?,
            phone: normalize_optional(request.phone),
            address: normalize_optional(request.address),
            city: normalize_optional(request.city),
        };

        let mut tx = self.db.begin().await?;
        UniquenessChecker::check_unique::<Owner>(&mut tx, OWNER_EMAIL, &request.email, None).await?;
        UniquenessChecker::check_unique_optional::<Owner>(&mut tx, OWNER_DOCUMENT, request.document_number.as_deref(), None)
            .await?;
        let owner = OwnerRepository::insert(&mut tx, &request).await?;
        tx.commit().await?;

        info!("Created owner: {} with ID: {}", owner.full_name(), owner.id);
        Ok(owner)
    }

    pub async fn find_by_id(&self, id: EntityId) -> DomainResult<Owner> {
        debug!("Finding owner: {}", id);
        let mut conn = self.db.acquire().await?;
        resolve::<Owner>(&mut conn, id).await
    }

    /// Owner together with all of their pets, active or not
    pub async fn find_by_id_with_pets(&self, id: EntityId) -> DomainResult<OwnerWithPets> {
        debug!("Finding owner with pets: {}", id);
        let mut conn = self.db.acquire().await?;
        AggregateProjector::owner_with_pets(&mut conn, id).await
    }

    pub async fn find_all(&self) -> DomainResult<Vec<Owner>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Owner>::list_all(&mut conn).await?)
    }

    pub async fn find_all_active(&self) -> DomainResult<Vec<Owner>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Owner>::list_where(&mut conn, &[Predicate::IsTrue("active")]).await?)
    }

    /// Case-insensitive match on first or last name
    pub async fn search(&self, term: &str) -> DomainResult<Vec<Owner>> {
        debug!("Searching owners: {}", term);
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Owner>::list_where(&mut conn, &[OwnerRepository::name_contains(term)]).await?)
    }

    pub async fn update(&self, id: EntityId, request: UpdateOwnerRequest) -> DomainResult<Owner> {
        info!("Updating owner: {}", id);

        let email = require_email_patch("Email", request.email)?;
        let first_name = require_patch("First name", request.first_name)?;
        let last_name = require_patch("Last name", request.last_name)?;

        let mut tx = self.db.begin().await?;
        let mut owner = resolve::<Owner>(&mut tx, id).await?;

        if let Some(email) = email {
            UniquenessChecker::check_unique::<Owner>(&mut tx, OWNER_EMAIL, &email, Some(id)).await?;
            owner.email = email;
        }
        if request.document_number.is_some() {
            let document_number = normalize_optional(request.document_number);
            UniquenessChecker::check_unique_optional::<Owner>(&mut tx, OWNER_DOCUMENT, document_number.as_deref(), Some(id))
                .await?;
            owner.document_number = document_number;
        }
        patch(&mut owner.first_name, first_name);
        patch(&mut owner.last_name, last_name);
        patch_optional(&mut owner.phone, request.phone);
        patch_optional(&mut owner.address, request.address);
        patch_optional(&mut owner.city, request.city);

        OwnerRepository::update(&mut tx, &owner).await?;
        tx.commit().await?;

        info!("Updated owner: {}", id);
        Ok(owner)
    }

    /// Delete an owner together with their pets and those pets' visits
    pub async fn delete(&self, id: EntityId) -> DomainResult<CascadeReport> {
        info!("Deleting owner: {}", id);
        let mut tx = self.db.begin().await?;
        let report = CascadePolicy::delete(&mut tx, EntityKind::Owner, id).await?;
        tx.commit().await?;

        info!("Deleted owner {} ({} rows)", id, report.total_removed());
        Ok(report)
    }

    pub async fn deactivate(&self, id: EntityId) -> DomainResult<()> {
        info!("Deactivating owner: {}", id);
        let mut tx = self.db.begin().await?;
        CascadePolicy::deactivate(&mut tx, EntityKind::Owner, id).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{DomainError, ErrorKind};
    use crate::storage::test_utils::*;
    use crate::storage::count_rows;

    async fn create_test_service() -> OwnerService {
        let db = DbConnection::init_in_memory().await.expect("Failed to init test DB");
        OwnerService::new(db)
    }

    fn owner_request(email: &str) -> CreateOwnerRequest {
        CreateOwnerRequest {
            first_name: "Laura".to_string(),
            last_name: "Gomez".to_string(),
            email: email.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_owner_normalizes_input() {
        let service = create_test_service().await;

        let owner = service
            .create(CreateOwnerRequest {
                first_name: " Laura ".to_string(),
                phone: Some("  ".to_string()),
                document_number: Some(" CC-1 ".to_string()),
                ..owner_request(" laura@example.com ")
            })
            .await
            .expect("Failed to create owner");

        assert!(owner.id > 0);
        assert!(owner.active);
        assert_eq!(owner.first_name, "Laura");
        assert_eq!(owner.email, "laura@example.com");
        assert_eq!(owner.phone, None);
        assert_eq!(owner.document_number.as_deref(), Some("CC-1"));
        assert_eq!(service.find_by_id(owner.id).await.unwrap(), owner);
    }

    #[tokio::test]
    async fn test_names_are_required() {
        let service = create_test_service().await;

        let err = service
            .create(CreateOwnerRequest {
                first_name: "  ".to_string(),
                ..owner_request("laura@example.com")
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "First name is required");

        let err = service
            .create(CreateOwnerRequest {
                last_name: String::new(),
                ..owner_request("laura@example.com")
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Last name is required");
        assert!(service.find_all().await.unwrap().is_empty());

        let owner = service.create(owner_request("laura@example.com")).await.unwrap();
        let err = service
            .update(
                owner.id,
                UpdateOwnerRequest {
                    last_name: Some(" ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_duplicate_email_and_document_are_rejected() {
        let service = create_test_service().await;
        service
            .create(CreateOwnerRequest {
                document_number: Some("CC-1".to_string()),
                ..owner_request("laura@example.com")
            })
            .await
            .unwrap();

        let err = service.create(owner_request("laura@example.com")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "Email already exists: laura@example.com");

        let err = service
            .create(CreateOwnerRequest {
                document_number: Some("CC-1".to_string()),
                ..owner_request("other@example.com")
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Document number already exists: CC-1");

        // Owners without a document never collide with each other
        service.create(owner_request("a@example.com")).await.unwrap();
        service.create(owner_request("b@example.com")).await.unwrap();
        assert_eq!(service.find_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_email_is_a_bad_request() {
        let service = create_test_service().await;
        let err = service.create(owner_request("   ")).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "Email", .. }));
        assert!(service.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_to_taken_email_leaves_row_unchanged() {
        let service = create_test_service().await;
        service.create(owner_request("a@x.com")).await.unwrap();
        let second = service.create(owner_request("b@x.com")).await.unwrap();

        let err = service
            .update(
                second.id,
                UpdateOwnerRequest {
                    email: Some("a@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(service.find_by_id(second.id).await.unwrap().email, "b@x.com");
    }

    #[tokio::test]
    async fn test_update_patches_only_supplied_fields() {
        let service = create_test_service().await;
        let owner = service
            .create(CreateOwnerRequest {
                phone: Some("555-0100".to_string()),
                city: Some("Cali".to_string()),
                ..owner_request("laura@example.com")
            })
            .await
            .unwrap();

        let updated = service
            .update(
                owner.id,
                UpdateOwnerRequest {
                    // Re-submitting the current email is not a conflict
                    email: Some("laura@example.com".to_string()),
                    last_name: Some("Perez".to_string()),
                    city: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name, "Laura");
        assert_eq!(updated.last_name, "Perez");
        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
        assert_eq!(updated.city, None);
        assert_eq!(updated.created_at, owner.created_at);
        assert_eq!(service.find_by_id(owner.id).await.unwrap(), updated);

        let err = service.update(999, UpdateOwnerRequest::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_search_and_active_listing() {
        let service = create_test_service().await;
        let laura = service.create(owner_request("laura@example.com")).await.unwrap();
        let pedro = service
            .create(CreateOwnerRequest {
                first_name: "Pedro".to_string(),
                last_name: "Lopez".to_string(),
                ..owner_request("pedro@example.com")
            })
            .await
            .unwrap();

        let found = service.search("GOM").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, laura.id);
        assert_eq!(service.search("pe").await.unwrap().len(), 1);
        assert!(service.search("%").await.unwrap().is_empty());

        service.deactivate(pedro.id).await.unwrap();
        let active = service.find_all_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, laura.id);
        // Deactivated owners stay searchable and addressable
        assert!(!service.find_by_id(pedro.id).await.unwrap().active);
    }

    #[tokio::test]
    async fn test_search_folds_accented_capitals() {
        let service = create_test_service().await;
        let angela = service
            .create(CreateOwnerRequest {
                first_name: "Ángela".to_string(),
                last_name: "Núñez".to_string(),
                ..owner_request("angela@example.com")
            })
            .await
            .unwrap();
        service.create(owner_request("laura@example.com")).await.unwrap();

        for term in ["Ángela", "ángela", "ÁNGELA", "NÚÑ", "ñez"] {
            let found = service.search(term).await.unwrap();
            assert_eq!(found.len(), 1, "search for {term}");
            assert_eq!(found[0].id, angela.id);
        }
        assert!(service.search("angela").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_cascades_but_deactivate_does_not() {
        let service = create_test_service().await;
        let owner = service.create(owner_request("laura@example.com")).await.unwrap();
        let keeper = service.create(owner_request("keeper@example.com")).await.unwrap();

        {
            let mut conn = service.db.acquire().await.unwrap();
            let dog = seed_pet_type(&mut conn, "Dog").await;
            let clinic = seed_clinic(&mut conn, "Central").await;
            let vet = seed_veterinarian(&mut conn, "V1", None).await;
            for name in ["Max", "Rex"] {
                let pet = seed_pet(&mut conn, name, owner.id, dog.id, None).await;
                seed_visit(&mut conn, pet.id, vet.id, clinic.id, at(2025, 5, 1, 10)).await;
            }
            let kept = seed_pet(&mut conn, "Kept", keeper.id, dog.id, None).await;
            seed_visit(&mut conn, kept.id, vet.id, clinic.id, at(2025, 5, 2, 10)).await;
        }

        service.deactivate(keeper.id).await.unwrap();
        let with_pets = service.find_by_id_with_pets(keeper.id).await.unwrap();
        assert_eq!(with_pets.pets.len(), 1);

        let report = service.delete(owner.id).await.unwrap();
        assert_eq!(report.removed(EntityKind::Pet), 2);
        assert_eq!(report.removed(EntityKind::Visit), 2);

        let mut conn = service.db.acquire().await.unwrap();
        assert_eq!(count_rows(&mut conn, EntityKind::Pet).await.unwrap(), 1);
        assert_eq!(count_rows(&mut conn, EntityKind::Visit).await.unwrap(), 1);
        drop(conn);

        let err = service.find_by_id(owner.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = service.delete(owner.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
