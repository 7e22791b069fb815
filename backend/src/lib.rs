//! # VetCare Backend
//!
//! Domain integrity layer for a veterinary clinic network: clinics, owners,
//! pets, pet types, veterinarians, specialties and visits.
//!
//! ## Architecture
//!
//! ```text
//! Caller (CLI, HTTP layer, tests)
//!     ↓
//! Domain services (one per entity, one transaction per call)
//!     ↓
//! Uniqueness / references / associations / cascade / projections
//!     ↓
//! Storage (EntityStore + repositories on SQLite)
//! ```
//!
//! Callers map [`domain::DomainError::kind`] onto their own status codes.

pub mod config;
pub mod domain;
pub mod logging;
pub mod storage;

use anyhow::Result;
use tracing::info;

pub use config::BackendConfig;
pub use domain::*;
pub use storage::DbConnection;

/// Every domain service, sharing one pool
#[derive(Clone)]
pub struct AppState {
    pub db: DbConnection,
    pub clinic_service: ClinicService,
    pub owner_service: OwnerService,
    pub pet_type_service: PetTypeService,
    pub pet_service: PetService,
    pub specialty_service: SpecialtyService,
    pub veterinarian_service: VeterinarianService,
    pub visit_service: VisitService,
}

impl AppState {
    pub fn new(db: DbConnection) -> Self {
        Self {
            clinic_service: ClinicService::new(db.clone()),
            owner_service: OwnerService::new(db.clone()),
            pet_type_service: PetTypeService::new(db.clone()),
            pet_service: PetService::new(db.clone()),
            specialty_service: SpecialtyService::new(db.clone()),
            veterinarian_service: VeterinarianService::new(db.clone()),
            visit_service: VisitService::new(db.clone()),
            db,
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &BackendConfig) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db = DbConnection::with_max_connections(&config.database_url, config.max_connections).await?;

    info!("Setting up domain services");
    Ok(AppState::new(db))
}
