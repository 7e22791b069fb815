//! Veterinarian ↔ specialty membership.

use shared::{EntityId, Specialty, Veterinarian, VeterinarianDetail};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::error::DomainResult;
use super::projections::AggregateProjector;
use super::references::ensure_exists;
use crate::storage::VeterinarianRepository;

pub struct AssociationManager;

impl AssociationManager {
    /// Add a specialty to a veterinarian. Adding an existing member is a no-op.
    pub async fn add_specialty(
        conn: &mut SqliteConnection,
        vet_id: EntityId,
        specialty_id: EntityId,
    ) -> DomainResult<VeterinarianDetail> {
        ensure_exists::<Veterinarian>(conn, vet_id).await?;
        ensure_exists::<Specialty>(conn, specialty_id).await?;

        if VeterinarianRepository::link_specialty(conn, vet_id, specialty_id).await? {
            info!("Added specialty {} to veterinarian {}", specialty_id, vet_id);
        } else {
            debug!("Veterinarian {} already has specialty {}", vet_id, specialty_id);
        }

        AggregateProjector::veterinarian_detail(conn, vet_id).await
    }

    /// Remove a specialty from a veterinarian. Removing a non-member is a
    /// no-op, and the specialty id itself need not exist.
    pub async fn remove_specialty(
        conn: &mut SqliteConnection,
        vet_id: EntityId,
        specialty_id: EntityId,
    ) -> DomainResult<VeterinarianDetail> {
        ensure_exists::<Veterinarian>(conn, vet_id).await?;

        if VeterinarianRepository::unlink_specialty(conn, vet_id, specialty_id).await? {
            info!("Removed specialty {} from veterinarian {}", specialty_id, vet_id);
        } else {
            debug!("Veterinarian {} does not have specialty {}", vet_id, specialty_id);
        }

        AggregateProjector::veterinarian_detail(conn, vet_id).await
    }

    pub async fn specialties_of(conn: &mut SqliteConnection, vet_id: EntityId) -> DomainResult<Vec<Specialty>> {
        AggregateProjector::specialties_of(conn, vet_id).await
    }

    pub async fn veterinarian_ids_for(conn: &mut SqliteConnection, specialty_id: EntityId) -> DomainResult<Vec<EntityId>> {
        Ok(VeterinarianRepository::ids_with_specialty(conn, specialty_id).await?)
    }

    /// Drop membership rows on one side of the link; `column` is
    /// `veterinarian_id` or `specialty_id`
    pub async fn drop_links(conn: &mut SqliteConnection, column: &'static str, id: EntityId) -> DomainResult<u64> {
        Ok(VeterinarianRepository::drop_links(conn, column, id).await?)
    }
}
