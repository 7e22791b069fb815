use shared::{Clinic, CreatePetRequest, EntityId, Owner, Pet, PetDetail, PetType, UpdatePetRequest};
use tracing::{debug, info};

use super::cascade::{CascadePolicy, CascadeReport};
use super::error::DomainResult;
use super::projections::AggregateProjector;
use super::references::{ensure_exists, resolve};
use super::validation::{normalize_optional, patch, patch_optional, require, require_patch, require_value};
use crate::storage::{DbConnection, EntityKind, EntityStore, PetRepository, Predicate};

/// Service for managing pets.
///
/// A pet is bound to its owner, pet type and (optionally) primary clinic when
/// it is created; updates only ever touch its descriptive fields.
#[derive(Clone)]
pub struct PetService {
    db: DbConnection,
}

impl PetService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Register a pet. Owner, pet type and the optional clinic must exist.
    pub async fn create(&self, request: CreatePetRequest) -> DomainResult<Pet> {
        info!(
            "Creating pet: name={}, owner_id={}, pet_type_id={}",
            request.name, request.owner_id, request.pet_type_id
        );

        let request = CreatePetRequest {
            name: require("Pet name", &request.name)?,
            breed: normalize_optional(request.breed),
            color: normalize_optional(request.color),
            medical_notes: normalize_optional(request.medical_notes),
            photo_url: normalize_optional(request.photo_url),
            ..request
        };
        let birth_date = require_value("Birth date", request.birth_date)?;

        let mut tx = self.db.begin().await?;
        ensure_exists::<Owner>(&mut tx, request.owner_id).await?;
        ensure_exists::<PetType>(&mut tx, request.pet_type_id).await?;
        if let Some(clinic_id) = request.clinic_id {
            ensure_exists::<Clinic>(&mut tx, clinic_id).await?;
        }
        let pet = PetRepository::insert(&mut tx, &request, birth_date).await?;
        tx.commit().await?;

        info!("Created pet: {} with ID: {}", pet.name, pet.id);
        Ok(pet)
    }

    pub async fn find_by_id(&self, id: EntityId) -> DomainResult<Pet> {
        debug!("Finding pet: {}", id);
        let mut conn = self.db.acquire().await?;
        resolve::<Pet>(&mut conn, id).await
    }

    /// Pet with owner summary, pet type and primary clinic
    pub async fn find_by_id_with_details(&self, id: EntityId) -> DomainResult<PetDetail> {
        debug!("Finding pet with details: {}", id);
        let mut conn = self.db.acquire().await?;
        AggregateProjector::pet_detail(&mut conn, id).await
    }

    pub async fn find_all(&self) -> DomainResult<Vec<Pet>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Pet>::list_all(&mut conn).await?)
    }

    pub async fn find_all_active(&self) -> DomainResult<Vec<Pet>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Pet>::list_where(&mut conn, &[Predicate::IsTrue("active")]).await?)
    }

    pub async fn find_by_owner_id(&self, owner_id: EntityId) -> DomainResult<Vec<Pet>> {
        self.list(&[PetRepository::by_owner(owner_id)]).await
    }

    pub async fn find_by_pet_type_id(&self, pet_type_id: EntityId) -> DomainResult<Vec<Pet>> {
        self.list(&[PetRepository::by_pet_type(pet_type_id)]).await
    }

    pub async fn find_by_primary_clinic_id(&self, clinic_id: EntityId) -> DomainResult<Vec<Pet>> {
        self.list(&[PetRepository::by_primary_clinic(clinic_id)]).await
    }

    pub async fn search(&self, term: &str) -> DomainResult<Vec<Pet>> {
        debug!("Searching pets: {}", term);
        self.list(&[PetRepository::name_contains(term)]).await
    }

    pub async fn update(&self, id: EntityId, request: UpdatePetRequest) -> DomainResult<Pet> {
        info!("Updating pet: {}", id);

        let name = require_patch("Pet name", request.name)?;

        let mut tx = self.db.begin().await?;
        let mut pet = resolve::<Pet>(&mut tx, id).await?;

        patch(&mut pet.name, name);
        patch(&mut pet.birth_date, request.birth_date);
        patch(&mut pet.gender, request.gender);
        if request.weight.is_some() {
            pet.weight = request.weight;
        }
        patch_optional(&mut pet.breed, request.breed);
        patch_optional(&mut pet.color, request.color);
        patch_optional(&mut pet.medical_notes, request.medical_notes);
        patch_optional(&mut pet.photo_url, request.photo_url);

        PetRepository::update(&mut tx, &pet).await?;
        tx.commit().await?;

        info!("Updated pet: {}", id);
        Ok(pet)
    }

    /// Delete a pet and its visit history
    pub async fn delete(&self, id: EntityId) -> DomainResult<CascadeReport> {
        info!("Deleting pet: {}", id);
        let mut tx = self.db.begin().await?;
        let report = CascadePolicy::delete(&mut tx, EntityKind::Pet, id).await?;
        tx.commit().await?;

        info!("Deleted pet {} ({} visits)", id, report.removed(EntityKind::Visit));
        Ok(report)
    }

    pub async fn deactivate(&self, id: EntityId) -> DomainResult<()> {
        info!("Deactivating pet: {}", id);
        let mut tx = self.db.begin().await?;
        CascadePolicy::deactivate(&mut tx, EntityKind::Pet, id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list(&self, predicates: &[Predicate]) -> DomainResult<Vec<Pet>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Pet>::list_where(&mut conn, predicates).await?)
    }
}
