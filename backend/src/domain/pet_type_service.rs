use shared::{CreateCatalogEntryRequest, EntityId, PetType, UpdateCatalogEntryRequest};
use tracing::{debug, info};

use super::cascade::{CascadePolicy, CascadeReport};
use super::error::DomainResult;
use super::references::resolve;
use super::uniqueness::{UniquenessChecker, PET_TYPE_NAME};
use super::validation::{normalize_optional, patch, patch_optional, require, require_patch};
use crate::storage::{DbConnection, EntityKind, EntityStore, PetTypeRepository, Predicate};

/// Service for the catalog of pet types (Dog, Cat, ...)
#[derive(Clone)]
pub struct PetTypeService {
    db: DbConnection,
}

impl PetTypeService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, request: CreateCatalogEntryRequest) -> DomainResult<PetType> {
        info!("Creating pet type: {}", request.name);

        let request = CreateCatalogEntryRequest {
            name: require("Pet type name", &request.name)?,
            description: normalize_optional(request.description),
        };

        let mut tx = self.db.begin().await?;
        UniquenessChecker::check_unique::<PetType>(&mut tx, PET_TYPE_NAME, &request.name, None).await?;
        let pet_type = PetTypeRepository::insert(&mut tx, &request).await?;
        tx.commit().await?;

        info!("Created pet type: {} with ID: {}", pet_type.name, pet_type.id);
        Ok(pet_type)
    }

    pub async fn find_by_id(&self, id: EntityId) -> DomainResult<PetType> {
        debug!("Finding pet type: {}", id);
        let mut conn = self.db.acquire().await?;
        resolve::<PetType>(&mut conn, id).await
    }

    pub async fn find_all(&self) -> DomainResult<Vec<PetType>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<PetType>::list_all(&mut conn).await?)
    }

    pub async fn find_all_active(&self) -> DomainResult<Vec<PetType>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<PetType>::list_where(&mut conn, &[Predicate::IsTrue("active")]).await?)
    }

    pub async fn search(&self, term: &str) -> DomainResult<Vec<PetType>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<PetType>::list_where(&mut conn, &[PetTypeRepository::name_contains(term)]).await?)
    }

    pub async fn update(&self, id: EntityId, request: UpdateCatalogEntryRequest) -> DomainResult<PetType> {
        info!("Updating pet type: {}", id);

        let name = require_patch("Pet type name", request.name)?;

        let mut tx = self.db.begin().await?;
        let mut pet_type = resolve::<PetType>(&mut tx, id).await?;
        if let Some(name) = &name {
            UniquenessChecker::check_unique::<PetType>(&mut tx, PET_TYPE_NAME, name, Some(id)).await?;
        }
        patch(&mut pet_type.name, name);
        patch_optional(&mut pet_type.description, request.description);

        PetTypeRepository::update(&mut tx, &pet_type).await?;
        tx.commit().await?;

        info!("Updated pet type: {}", id);
        Ok(pet_type)
    }

    /// Delete a pet type along with every pet of that type and their visits
    pub async fn delete(&self, id: EntityId) -> DomainResult<CascadeReport> {
        info!("Deleting pet type: {}", id);
        let mut tx = self.db.begin().await?;
        let report = CascadePolicy::delete(&mut tx, EntityKind::PetType, id).await?;
        tx.commit().await?;

        info!("Deleted pet type {} ({} rows)", id, report.total_removed());
        Ok(report)
    }

    pub async fn deactivate(&self, id: EntityId) -> DomainResult<()> {
        info!("Deactivating pet type: {}", id);
        let mut tx = self.db.begin().await?;
        CascadePolicy::deactivate(&mut tx, EntityKind::PetType, id).await?;
        tx.commit().await?;
        Ok(())
    }
}
