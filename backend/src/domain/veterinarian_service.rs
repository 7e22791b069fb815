use shared::{Clinic, CreateVeterinarianRequest, EntityId, UpdateVeterinarianRequest, Veterinarian, VeterinarianDetail};
use tracing::{debug, info};

use super::associations::AssociationManager;
use super::cascade::{CascadePolicy, CascadeReport};
use super::error::DomainResult;
use super::projections::AggregateProjector;
use super::references::{ensure_exists, resolve};
use super::uniqueness::{UniquenessChecker, VETERINARIAN_EMAIL, VETERINARIAN_LICENSE};
use super::validation::{normalize_optional, patch, patch_optional, require, require_email, require_email_patch, require_patch};
use crate::storage::{DbConnection, EntityKind, EntityStore, Predicate, VeterinarianRepository};

/// Service for managing veterinarians and their specialties
#[derive(Clone)]
pub struct VeterinarianService {
    db: DbConnection,
}

impl VeterinarianService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Register a veterinarian. Email and license number must be unused and
    /// the clinic, when given, must exist.
    pub async fn create(&self, request: CreateVeterinarianRequest) -> DomainResult<Veterinarian> {
        info!("Creating veterinarian: license={}", request.license_number);

        let request = CreateVeterinarianRequest {
            first_name: require("First name", &request.first_name)?,
            last_name: require("Last name", &request.last_name)?,
            license_number: require("License number", &request.license_number)?,
            email: require_email("Email", &request.email)?,
            phone: normalize_optional(request.phone),
            photo_url: normalize_optional(request.photo_url),
            clinic_id: request.clinic_id,
        };

        let mut tx = self.db.begin().await?;
        UniquenessChecker::check_unique::<Veterinarian>(&mut tx, VETERINARIAN_EMAIL, &request.email, None).await?;
        UniquenessChecker::check_unique::<Veterinarian>(&mut tx, VETERINARIAN_LICENSE, &request.license_number, None)
            .await?;
        if let Some(clinic_id) = request.clinic_id {
            ensure_exists::<Clinic>(&mut tx, clinic_id).await?;
        }
        let vet = VeterinarianRepository::insert(&mut tx, &request).await?;
        tx.commit().await?;

        info!("Created veterinarian: {} with ID: {}", vet.full_name(), vet.id);
        Ok(vet)
    }

    pub async fn find_by_id(&self, id: EntityId) -> DomainResult<Veterinarian> {
        debug!("Finding veterinarian: {}", id);
        let mut conn = self.db.acquire().await?;
        resolve::<Veterinarian>(&mut conn, id).await
    }

    /// Veterinarian with clinic summary and specialties
    pub async fn find_by_id_with_details(&self, id: EntityId) -> DomainResult<VeterinarianDetail> {
        debug!("Finding veterinarian with details: {}", id);
        let mut conn = self.db.acquire().await?;
        AggregateProjector::veterinarian_detail(&mut conn, id).await
    }

    pub async fn find_all(&self) -> DomainResult<Vec<Veterinarian>> {
        self.list(&[]).await
    }

    pub async fn find_all_active(&self) -> DomainResult<Vec<Veterinarian>> {
        self.list(&[Predicate::IsTrue("active")]).await
    }

    pub async fn find_by_clinic_id(&self, clinic_id: EntityId) -> DomainResult<Vec<Veterinarian>> {
        self.list(&[VeterinarianRepository::by_clinic(clinic_id)]).await
    }

    /// Active veterinarians holding the specialty
    pub async fn find_by_specialty(&self, specialty_id: EntityId) -> DomainResult<Vec<Veterinarian>> {
        debug!("Finding veterinarians with specialty: {}", specialty_id);
        let mut conn = self.db.acquire().await?;
        let ids = AssociationManager::veterinarian_ids_for(&mut conn, specialty_id).await?;
        let vets = EntityStore::<Veterinarian>::list_where(
            &mut conn,
            &[Predicate::ids_in("id", &ids), Predicate::IsTrue("active")],
        )
        .await?;
        Ok(vets)
    }

    /// Case-insensitive match on first or last name
    pub async fn search(&self, term: &str) -> DomainResult<Vec<Veterinarian>> {
        debug!("Searching veterinarians: {}", term);
        self.list(&[VeterinarianRepository::name_contains(term)]).await
    }

    pub async fn update(&self, id: EntityId, request: UpdateVeterinarianRequest) -> DomainResult<Veterinarian> {
        info!("Updating veterinarian: {}", id);

        let email = require_email_patch("Email", request.email)?;
        let first_name = require_patch("First name", request.first_name)?;
        let last_name = require_patch("Last name", request.last_name)?;

        let mut tx = self.db.begin().await?;
        let mut vet = resolve::<Veterinarian>(&mut tx, id).await?;

        if let Some(email) = email {
            UniquenessChecker::check_unique::<Veterinarian>(&mut tx, VETERINARIAN_EMAIL, &email, Some(id)).await?;
            vet.email = email;
        }
        patch(&mut vet.first_name, first_name);
        patch(&mut vet.last_name, last_name);
        patch_optional(&mut vet.phone, request.phone);
        patch_optional(&mut vet.photo_url, request.photo_url);

        VeterinarianRepository::update(&mut tx, &vet).await?;
        tx.commit().await?;

        info!("Updated veterinarian: {}", id);
        Ok(vet)
    }

    pub async fn add_specialty(&self, vet_id: EntityId, specialty_id: EntityId) -> DomainResult<VeterinarianDetail> {
        info!("Adding specialty {} to veterinarian {}", specialty_id, vet_id);
        let mut tx = self.db.begin().await?;
        let detail = AssociationManager::add_specialty(&mut tx, vet_id, specialty_id).await?;
        tx.commit().await?;
        Ok(detail)
    }

    pub async fn remove_specialty(&self, vet_id: EntityId, specialty_id: EntityId) -> DomainResult<VeterinarianDetail> {
        info!("Removing specialty {} from veterinarian {}", specialty_id, vet_id);
        let mut tx = self.db.begin().await?;
        let detail = AssociationManager::remove_specialty(&mut tx, vet_id, specialty_id).await?;
        tx.commit().await?;
        Ok(detail)
    }

    /// Delete a veterinarian, its specialty links and the visits it attended
    pub async fn delete(&self, id: EntityId) -> DomainResult<CascadeReport> {
        info!("Deleting veterinarian: {}", id);
        let mut tx = self.db.begin().await?;
        let report = CascadePolicy::delete(&mut tx, EntityKind::Veterinarian, id).await?;
        tx.commit().await?;

        info!("Deleted veterinarian {} ({} visits)", id, report.removed(EntityKind::Visit));
        Ok(report)
    }

    pub async fn deactivate(&self, id: EntityId) -> DomainResult<()> {
        info!("Deactivating veterinarian: {}", id);
        let mut tx = self.db.begin().await?;
        CascadePolicy::deactivate(&mut tx, EntityKind::Veterinarian, id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list(&self, predicates: &[Predicate]) -> DomainResult<Vec<Veterinarian>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Veterinarian>::list_where(&mut conn, predicates).await?)
    }
}
