//! # Domain Module
//!
//! Integrity rules and per-entity services for the clinic domain.
//!
//! Every mutating service call runs as one SQLite transaction:
//! validate input, check uniqueness, resolve references, persist, and for
//! deletes apply the cascade policy, then commit. Any error drops the
//! transaction and nothing is written.
//!
//! The building blocks ([`UniquenessChecker`], [`AssociationManager`],
//! [`CascadePolicy`], [`AggregateProjector`]) work on a borrowed connection
//! and never open transactions of their own.

pub mod associations;
pub mod cascade;
pub mod error;
pub mod projections;
pub mod references;
pub mod uniqueness;
pub mod validation;

pub mod clinic_service;
pub mod owner_service;
pub mod pet_service;
pub mod pet_type_service;
pub mod specialty_service;
pub mod veterinarian_service;
pub mod visit_service;

pub use associations::AssociationManager;
pub use cascade::{CascadePolicy, CascadeReport, CascadeRule};
pub use error::{DomainError, DomainResult, ErrorKind};
pub use projections::AggregateProjector;
pub use uniqueness::{UniqueField, UniquenessChecker};

pub use clinic_service::ClinicService;
pub use owner_service::OwnerService;
pub use pet_service::PetService;
pub use pet_type_service::PetTypeService;
pub use specialty_service::SpecialtyService;
pub use veterinarian_service::VeterinarianService;
pub use visit_service::VisitService;
