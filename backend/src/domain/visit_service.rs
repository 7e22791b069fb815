use chrono::NaiveDateTime;
use shared::{Clinic, CreateVisitRequest, EntityId, Pet, UpdateVisitRequest, Veterinarian, Visit, VisitDetail, VisitStatus};
use tracing::{debug, info};

use super::cascade::{CascadePolicy, CascadeReport};
use super::error::DomainResult;
use super::projections::AggregateProjector;
use super::references::{ensure_exists, resolve};
use super::validation::{normalize_optional, patch, patch_optional, require, require_patch, require_value};
use crate::storage::{DbConnection, EntityKind, EntityStore, PetRepository, Predicate, VisitRepository};

/// Newest first, ties broken by id
const NEWEST_FIRST: &str = "visit_date DESC, id DESC";

/// Service for managing visits.
///
/// Visits carry no active flag; their lifecycle is tracked through
/// [`VisitStatus`] instead, so there is no `deactivate` here.
#[derive(Clone)]
pub struct VisitService {
    db: DbConnection,
}

impl VisitService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Book a visit. Pet, veterinarian and clinic must all exist.
    pub async fn create(&self, request: CreateVisitRequest) -> DomainResult<Visit> {
        info!(
            "Creating visit: pet_id={}, veterinarian_id={}, clinic_id={}",
            request.pet_id, request.veterinarian_id, request.clinic_id
        );

        let request = CreateVisitRequest {
            reason: require("Reason", &request.reason)?,
            diagnosis: normalize_optional(request.diagnosis),
            treatment: normalize_optional(request.treatment),
            notes: normalize_optional(request.notes),
            ..request
        };
        let visit_date = require_value("Visit date", request.visit_date)?;

        let mut tx = self.db.begin().await?;
        ensure_exists::<Pet>(&mut tx, request.pet_id).await?;
        ensure_exists::<Veterinarian>(&mut tx, request.veterinarian_id).await?;
        ensure_exists::<Clinic>(&mut tx, request.clinic_id).await?;
        let visit = VisitRepository::insert(&mut tx, &request, visit_date).await?;
        tx.commit().await?;

        info!("Created visit {} on {} ({})", visit.id, visit.visit_date, visit.status);
        Ok(visit)
    }

    pub async fn find_by_id(&self, id: EntityId) -> DomainResult<Visit> {
        debug!("Finding visit: {}", id);
        let mut conn = self.db.acquire().await?;
        resolve::<Visit>(&mut conn, id).await
    }

    pub async fn find_by_id_with_details(&self, id: EntityId) -> DomainResult<VisitDetail> {
        debug!("Finding visit with details: {}", id);
        let mut conn = self.db.acquire().await?;
        AggregateProjector::visit_detail(&mut conn, id).await
    }

    pub async fn find_all(&self) -> DomainResult<Vec<Visit>> {
        self.list(&[]).await
    }

    pub async fn find_by_pet_id(&self, pet_id: EntityId) -> DomainResult<Vec<Visit>> {
        self.list(&[VisitRepository::by_pet(pet_id)]).await
    }

    pub async fn find_by_veterinarian_id(&self, veterinarian_id: EntityId) -> DomainResult<Vec<Visit>> {
        self.list(&[VisitRepository::by_veterinarian(veterinarian_id)]).await
    }

    pub async fn find_by_clinic_id(&self, clinic_id: EntityId) -> DomainResult<Vec<Visit>> {
        self.list(&[VisitRepository::by_clinic(clinic_id)]).await
    }

    /// Visits of every pet the owner has, newest first
    pub async fn find_by_owner_id(&self, owner_id: EntityId) -> DomainResult<Vec<Visit>> {
        debug!("Finding visits for owner: {}", owner_id);
        let mut conn = self.db.acquire().await?;
        let pet_ids = EntityStore::<Pet>::ids_where(&mut conn, &[PetRepository::by_owner(owner_id)]).await?;
        let visits =
            EntityStore::<Visit>::list_where_ordered(&mut conn, &[VisitRepository::by_pets(&pet_ids)], NEWEST_FIRST)
                .await?;
        Ok(visits)
    }

    pub async fn find_by_status(&self, status: VisitStatus) -> DomainResult<Vec<Visit>> {
        self.list(&[VisitRepository::by_status(status)]).await
    }

    /// Both bounds are inclusive
    pub async fn find_by_date_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> DomainResult<Vec<Visit>> {
        debug!("Finding visits between {} and {}", start, end);
        self.list(&[VisitRepository::between(start, end)]).await
    }

    /// A veterinarian's visits in a status within an inclusive window
    pub async fn find_veterinarian_schedule(
        &self,
        veterinarian_id: EntityId,
        start: NaiveDateTime,
        end: NaiveDateTime,
        status: VisitStatus,
    ) -> DomainResult<Vec<Visit>> {
        debug!(
            "Finding {} schedule for veterinarian {} between {} and {}",
            status, veterinarian_id, start, end
        );
        self.list(&[
            VisitRepository::by_veterinarian(veterinarian_id),
            VisitRepository::between(start, end),
            VisitRepository::by_status(status),
        ])
        .await
    }

    pub async fn update(&self, id: EntityId, request: UpdateVisitRequest) -> DomainResult<Visit> {
        info!("Updating visit: {}", id);

        let reason = require_patch("Reason", request.reason)?;

        let mut tx = self.db.begin().await?;
        let mut visit = resolve::<Visit>(&mut tx, id).await?;

        patch(&mut visit.visit_date, request.visit_date);
        patch(&mut visit.reason, reason);
        patch_optional(&mut visit.diagnosis, request.diagnosis);
        patch_optional(&mut visit.treatment, request.treatment);
        patch_optional(&mut visit.notes, request.notes);
        if request.cost.is_some() {
            visit.cost = request.cost;
        }
        patch(&mut visit.status, request.status);

        VisitRepository::update(&mut tx, &visit).await?;
        tx.commit().await?;

        info!("Updated visit: {}", id);
        Ok(visit)
    }

    pub async fn update_status(&self, id: EntityId, status: VisitStatus) -> DomainResult<Visit> {
        info!("Updating visit {} status to {}", id, status);

        let mut tx = self.db.begin().await?;
        let mut visit = resolve::<Visit>(&mut tx, id).await?;
        visit.status = status;
        VisitRepository::update(&mut tx, &visit).await?;
        tx.commit().await?;

        Ok(visit)
    }

    pub async fn delete(&self, id: EntityId) -> DomainResult<CascadeReport> {
        info!("Deleting visit: {}", id);
        let mut tx = self.db.begin().await?;
        let report = CascadePolicy::delete(&mut tx, EntityKind::Visit, id).await?;
        tx.commit().await?;
        Ok(report)
    }

    async fn list(&self, predicates: &[Predicate]) -> DomainResult<Vec<Visit>> {
        let mut conn = self.db.acquire().await?;
        Ok(EntityStore::<Visit>::list_where(&mut conn, predicates).await?)
    }
}
