use shared::{Clinic, ClinicWithVeterinarians, CreateClinicRequest, EntityId, UpdateClinicRequest};
use tracing::{debug, info};

use super::cascade::{CascadePolicy, CascadeReport};
use super::error::DomainResult;
use super::projections::AggregateProjector;
use super::references::resolve;
use super::validation::{normalize_optional, patch, patch_optional, require, require_patch};
use crate::storage::{ClinicRepository, DbConnection, EntityKind, EntityStore, Predicate};

/// Service for managing clinics
#[derive(Clone)]
pub struct ClinicService {
    db: DbConnection,
}

impl ClinicService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, request: CreateClinicRequest) -> DomainResult<Clinic> {
        info!("Creating clinic: {}", request.name);

        let request = CreateClinicRequest {
            name: require("Clinic name", &request.name)?,
            address: require("Address", &request.address)?,
            city: require("City", &request.city)?,
            phone: normalize_optional(request.phone),
            email: normalize_optional(request.email),
            working_hours: normalize_optional(request.working_hours),
        };

        let mut tx = self.db.begin().await?;
        let clinic = ClinicRepository::insert(&mut tx, &request).await?;
        tx.commit().await?;

        info!("Created clinic: {} with ID: {}", clinic.name, clinic.id);
        Ok(clinic)
    }

    pub async fn find_by_id(&self, id: EntityId) -> DomainResult<Clinic> {
        debug!("Finding clinic: {}", id);
        let mut conn = self.db.acquire().await?;
        resolve::<Clinic>(&mut conn, id).await
    }

    pub async fn find_by_id_with_veterinarians(&self, id: EntityId) -> DomainResult<ClinicWithVeterinarians> {
        debug!("Finding clinic with veterinarians: {}", id);
        let mut conn = self.db.acquire().await?;
        AggregateProjector::clinic_with_veterinarians(&mut conn, id).await
    }

    pub async fn find_all(&self) -> DomainResult<Vec<Clinic>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Clinic>::list_all(&mut conn).await?)
    }

    pub async fn find_all_active(&self) -> DomainResult<Vec<Clinic>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Clinic>::list_where(&mut conn, &[Predicate::IsTrue("active")]).await?)
    }

    /// Exact, case-sensitive city match
    pub async fn find_by_city(&self, city: &str) -> DomainResult<Vec<Clinic>> {
        debug!("Finding clinics in city: {}", city);
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Clinic>::list_where(&mut conn, &[ClinicRepository::by_city(city)]).await?)
    }

    pub async fn search(&self, term: &str) -> DomainResult<Vec<Clinic>> {
        debug!("Searching clinics: {}", term);
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Clinic>::list_where(&mut conn, &[ClinicRepository::name_contains(term)]).await?)
    }

    pub async fn update(&self, id: EntityId, request: UpdateClinicRequest) -> DomainResult<Clinic> {
        info!("Updating clinic: {}", id);

        let name = require_patch("Clinic name", request.name)?;
        let address = require_patch("Address", request.address)?;
        let city = require_patch("City", request.city)?;

        let mut tx = self.db.begin().await?;
        let mut clinic = resolve::<Clinic>(&mut tx, id).await?;

        patch(&mut clinic.name, name);
        patch(&mut clinic.address, address);
        patch(&mut clinic.city, city);
        patch_optional(&mut clinic.phone, request.phone);
        patch_optional(&mut clinic.email, request.email);
        patch_optional(&mut clinic.working_hours, request.working_hours);

        ClinicRepository::update(&mut tx, &clinic).await?;
        tx.commit().await?;

        info!("Updated clinic: {}", id);
        Ok(clinic)
    }

    /// Delete a clinic, its veterinarians and every visit held there.
    /// Pets that named it as primary clinic keep existing without one.
    pub async fn delete(&self, id: EntityId) -> DomainResult<CascadeReport> {
        info!("Deleting clinic: {}", id);
        let mut tx = self.db.begin().await?;
        let report = CascadePolicy::delete(&mut tx, EntityKind::Clinic, id).await?;
        tx.commit().await?;

        info!(
            "Deleted clinic {} ({} rows, {} pets detached)",
            id,
            report.total_removed(),
            report.detached
        );
        Ok(report)
    }

    pub async fn deactivate(&self, id: EntityId) -> DomainResult<()> {
        info!("Deactivating clinic: {}", id);
        let mut tx = self.db.begin().await?;
        CascadePolicy::deactivate(&mut tx, EntityKind::Clinic, id).await?;
        tx.commit().await?;
        Ok(())
    }
}
