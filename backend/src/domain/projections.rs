//! # Aggregate Projector
//!
//! Read-only composite views assembled from several tables on demand. Nothing
//! here is cached or persisted; every call reflects the store as it is.

use shared::{
    Clinic, ClinicSummary, ClinicWithVeterinarians, EntityId, Owner, OwnerSummary, OwnerWithPets, Pet, PetDetail,
    PetSummary, PetType, Specialty, Veterinarian, VeterinarianDetail, VeterinarianSummary, Visit, VisitDetail,
};
use sqlx::SqliteConnection;
use std::collections::HashMap;

use super::error::DomainResult;
use super::references::{resolve, resolve_optional};
use crate::storage::{EntityStore, PetRepository, Predicate, VeterinarianRepository};

pub struct AggregateProjector;

impl AggregateProjector {
    /// Owner with every pet they own, active or not, ordered by pet id
    pub async fn owner_with_pets(conn: &mut SqliteConnection, owner_id: EntityId) -> DomainResult<OwnerWithPets> {
        let owner = resolve::<Owner>(conn, owner_id).await?;
        let pets = EntityStore::<Pet>::list_where(conn, &[PetRepository::by_owner(owner_id)]).await?;
        let pets = Self::pet_summaries(conn, &pets).await?;
        Ok(OwnerWithPets { owner, pets })
    }

    pub async fn pet_detail(conn: &mut SqliteConnection, pet_id: EntityId) -> DomainResult<PetDetail> {
        let pet = resolve::<Pet>(conn, pet_id).await?;
        let owner = resolve::<Owner>(conn, pet.owner_id).await?;
        let pet_type = resolve::<PetType>(conn, pet.pet_type_id).await?;
        let primary_clinic = resolve_optional::<Clinic>(conn, pet.primary_clinic_id).await?;

        Ok(PetDetail {
            owner: OwnerSummary::from(&owner),
            pet_type,
            primary_clinic: primary_clinic.as_ref().map(ClinicSummary::from),
            pet,
        })
    }

    pub async fn veterinarian_detail(conn: &mut SqliteConnection, vet_id: EntityId) -> DomainResult<VeterinarianDetail> {
        let veterinarian = resolve::<Veterinarian>(conn, vet_id).await?;
        let clinic = resolve_optional::<Clinic>(conn, veterinarian.clinic_id).await?;
        let specialties = Self::specialties_of(conn, vet_id).await?;

        Ok(VeterinarianDetail {
            veterinarian,
            clinic: clinic.as_ref().map(ClinicSummary::from),
            specialties,
        })
    }

    pub async fn visit_detail(conn: &mut SqliteConnection, visit_id: EntityId) -> DomainResult<VisitDetail> {
        let visit = resolve::<Visit>(conn, visit_id).await?;
        let pet = resolve::<Pet>(conn, visit.pet_id).await?;
        let pet_type = resolve::<PetType>(conn, pet.pet_type_id).await?;
        let veterinarian = resolve::<Veterinarian>(conn, visit.veterinarian_id).await?;
        let clinic = resolve::<Clinic>(conn, visit.clinic_id).await?;

        Ok(VisitDetail {
            visit,
            pet: PetSummary::new(&pet, pet_type.name),
            veterinarian: VeterinarianSummary::from(&veterinarian),
            clinic: ClinicSummary::from(&clinic),
        })
    }

    /// Clinic with the veterinarians assigned to it, ordered by id
    pub async fn clinic_with_veterinarians(
        conn: &mut SqliteConnection,
        clinic_id: EntityId,
    ) -> DomainResult<ClinicWithVeterinarians> {
        let clinic = resolve::<Clinic>(conn, clinic_id).await?;
        let veterinarians =
            EntityStore::<Veterinarian>::list_where(conn, &[VeterinarianRepository::by_clinic(clinic_id)]).await?;

        Ok(ClinicWithVeterinarians {
            clinic,
            veterinarians: veterinarians.iter().map(VeterinarianSummary::from).collect(),
        })
    }

    /// Current specialty set of a veterinarian, ordered by name
    pub async fn specialties_of(conn: &mut SqliteConnection, vet_id: EntityId) -> DomainResult<Vec<Specialty>> {
        let ids = VeterinarianRepository::specialty_ids_of(conn, vet_id).await?;
        let specialties =
            EntityStore::<Specialty>::list_where_ordered(conn, &[Predicate::ids_in("id", &ids)], "name ASC").await?;
        Ok(specialties)
    }

    /// Summaries for a batch of pets, resolving each distinct pet type once
    pub async fn pet_summaries(conn: &mut SqliteConnection, pets: &[Pet]) -> DomainResult<Vec<PetSummary>> {
        let mut type_ids: Vec<EntityId> = pets.iter().map(|pet| pet.pet_type_id).collect();
        type_ids.sort_unstable();
        type_ids.dedup();

        let type_names: HashMap<EntityId, String> =
            EntityStore::<PetType>::list_where(conn, &[Predicate::ids_in("id", &type_ids)])
                .await?
                .into_iter()
                .map(|pet_type| (pet_type.id, pet_type.name))
                .collect();

        Ok(pets
            .iter()
            .map(|pet| {
                let name = type_names.get(&pet.pet_type_id).cloned().unwrap_or_default();
                PetSummary::new(pet, name)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use crate::storage::test_utils::*;
    use crate::storage::DbConnection;

    #[tokio::test]
    async fn test_owner_with_pets_includes_inactive_pets() {
        let db = DbConnection::init_in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let owner = seed_owner(&mut conn, "ana@example.com").await;
        let dog = seed_pet_type(&mut conn, "Dog").await;
        let cat = seed_pet_type(&mut conn, "Cat").await;
        let max = seed_pet(&mut conn, "Max", owner.id, dog.id, None).await;
        let luna = seed_pet(&mut conn, "Luna", owner.id, cat.id, None).await;
        EntityStore::<Pet>::set_active(&mut conn, luna.id, false).await.unwrap();

        let projection = AggregateProjector::owner_with_pets(&mut conn, owner.id).await.unwrap();

        assert_eq!(projection.owner.id, owner.id);
        assert_eq!(projection.pets.len(), 2);
        assert_eq!(projection.pets[0].id, max.id);
        assert_eq!(projection.pets[0].pet_type_name, "Dog");
        assert_eq!(projection.pets[1].name, "Luna");
        assert_eq!(projection.pets[1].pet_type_name, "Cat");
    }

    #[tokio::test]
    async fn test_pet_detail_with_and_without_clinic() {
        let db = DbConnection::init_in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let owner = seed_owner(&mut conn, "ana@example.com").await;
        let dog = seed_pet_type(&mut conn, "Dog").await;
        let clinic = seed_clinic(&mut conn, "Central").await;
        let max = seed_pet(&mut conn, "Max", owner.id, dog.id, Some(clinic.id)).await;
        let rex = seed_pet(&mut conn, "Rex", owner.id, dog.id, None).await;

        let detail = AggregateProjector::pet_detail(&mut conn, max.id).await.unwrap();
        assert_eq!(detail.owner.full_name, "Test Owner");
        assert_eq!(detail.pet_type.name, "Dog");
        assert_eq!(detail.primary_clinic.map(|c| c.name), Some("Central".to_string()));

        let detail = AggregateProjector::pet_detail(&mut conn, rex.id).await.unwrap();
        assert!(detail.primary_clinic.is_none());

        let err = AggregateProjector::pet_detail(&mut conn, 999).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_veterinarian_specialties_are_ordered_by_name() {
        let db = DbConnection::init_in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let vet = seed_veterinarian(&mut conn, "V1", None).await;
        let surgery = seed_specialty(&mut conn, "Surgery").await;
        let cardiology = seed_specialty(&mut conn, "Cardiology").await;
        seed_specialty(&mut conn, "Dermatology").await;
        VeterinarianRepository::link_specialty(&mut conn, vet.id, surgery.id).await.unwrap();
        VeterinarianRepository::link_specialty(&mut conn, vet.id, cardiology.id).await.unwrap();

        let detail = AggregateProjector::veterinarian_detail(&mut conn, vet.id).await.unwrap();

        let names: Vec<&str> = detail.specialties.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Cardiology", "Surgery"]);
        assert!(detail.clinic.is_none());
    }

    #[tokio::test]
    async fn test_visit_detail_and_clinic_roster() {
        let db = DbConnection::init_in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let owner = seed_owner(&mut conn, "ana@example.com").await;
        let dog = seed_pet_type(&mut conn, "Dog").await;
        let clinic = seed_clinic(&mut conn, "Central").await;
        let vet = seed_veterinarian(&mut conn, "V1", Some(clinic.id)).await;
        seed_veterinarian(&mut conn, "V2", None).await;
        let max = seed_pet(&mut conn, "Max", owner.id, dog.id, None).await;
        let visit = seed_visit(&mut conn, max.id, vet.id, clinic.id, at(2025, 3, 1, 9)).await;

        let detail = AggregateProjector::visit_detail(&mut conn, visit.id).await.unwrap();
        assert_eq!(detail.pet.name, "Max");
        assert_eq!(detail.pet.pet_type_name, "Dog");
        assert_eq!(detail.veterinarian.license_number, "V1");
        assert_eq!(detail.clinic.id, clinic.id);

        let roster = AggregateProjector::clinic_with_veterinarians(&mut conn, clinic.id).await.unwrap();
        assert_eq!(roster.veterinarians.len(), 1);
        assert_eq!(roster.veterinarians[0].full_name, "Test Vet");
    }
}
