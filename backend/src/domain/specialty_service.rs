use shared::{CreateCatalogEntryRequest, EntityId, Specialty, UpdateCatalogEntryRequest};
use tracing::{debug, info};

use super::cascade::{CascadePolicy, CascadeReport};
use super::error::DomainResult;
use super::references::resolve;
use super::uniqueness::{UniquenessChecker, SPECIALTY_NAME};
use super::validation::{normalize_optional, patch, patch_optional, require, require_patch};
use crate::storage::{DbConnection, EntityKind, EntityStore, SpecialtyRepository, Predicate};

/// Service for veterinary specialties (Surgery, Cardiology, ...)
#[derive(Clone)]
pub struct SpecialtyService {
    db: DbConnection,
}

impl SpecialtyService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, request: CreateCatalogEntryRequest) -> DomainResult<Specialty> {
        info!("Creating specialty: {}", request.name);

        let request = CreateCatalogEntryRequest {
            name: require("Specialty name", &request.name)?,
            description: normalize_optional(request.description),
        };

        let mut tx = self.db.begin().await?;
        UniquenessChecker::check_unique::<Specialty>(&mut tx, SPECIALTY_NAME, &request.name, None).await?;
        let specialty = SpecialtyRepository::insert(&mut tx, &request).await?;
        tx.commit().await?;

        info!("Created specialty: {} with ID: {}", specialty.name, specialty.id);
        Ok(specialty)
    }

    pub async fn find_by_id(&self, id: EntityId) -> DomainResult<Specialty> {
        debug!("Finding specialty: {}", id);
        let mut conn = self.db.acquire().await?;
        resolve::<Specialty>(&mut conn, id).await
    }

    pub async fn find_all(&self) -> DomainResult<Vec<Specialty>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Specialty>::list_all(&mut conn).await?)
    }

    pub async fn find_all_active(&self) -> DomainResult<Vec<Specialty>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Specialty>::list_where(&mut conn, &[Predicate::IsTrue("active")]).await?)
    }

    pub async fn search(&self, term: &str) -> DomainResult<Vec<Specialty>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Specialty>::list_where(&mut conn, &[SpecialtyRepository::name_contains(term)]).await?)
    }

    pub async fn update(&self, id: EntityId, request: UpdateCatalogEntryRequest) -> DomainResult<Specialty> {
        info!("Updating specialty: {}", id);

        let name = require_patch("Specialty name", request.name)?;

        let mut tx = self.db.begin().await?;
        let mut specialty = resolve::<Specialty>(&mut tx, id).await?;
        if let Some(name) = &name {
            UniquenessChecker::check_unique::<Specialty>(&mut tx, SPECIALTY_NAME, name, Some(id)).await?;
        }
        patch(&mut specialty.name, name);
        patch_optional(&mut specialty.description, request.description);

        SpecialtyRepository::update(&mut tx, &specialty).await?;
        tx.commit().await?;

        info!("Updated specialty: {}", id);
        Ok(specialty)
    }

    /// Delete a specialty. Veterinarians holding it simply lose it.
    pub async fn delete(&self, id: EntityId) -> DomainResult<CascadeReport> {
        info!("Deleting specialty: {}", id);
        let mut tx = self.db.begin().await?;
        let report = CascadePolicy::delete(&mut tx, EntityKind::Specialty, id).await?;
        tx.commit().await?;

        info!("Deleted specialty {} ({} veterinarian links dropped)", id, report.links_removed);
        Ok(report)
    }

    pub async fn deactivate(&self, id: EntityId) -> DomainResult<()> {
        info!("Deactivating specialty: {}", id);
        let mut tx = self.db.begin().await?;
        CascadePolicy::deactivate(&mut tx, EntityKind::Specialty, id).await?;
        tx.commit().await?;
        Ok(())
    }
}
