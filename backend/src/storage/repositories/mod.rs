// Repository modules
pub mod clinic_repository;
pub mod owner_repository;
pub mod pet_type_repository;
pub mod pet_repository;
pub mod specialty_repository;
pub mod veterinarian_repository;
pub mod visit_repository;

// Re-export repository types
pub use clinic_repository::ClinicRepository;
pub use owner_repository::OwnerRepository;
pub use pet_type_repository::PetTypeRepository;
pub use pet_repository::PetRepository;
pub use specialty_repository::SpecialtyRepository;
pub use veterinarian_repository::{VeterinarianRepository, MEMBERSHIP_TABLE};
pub use visit_repository::VisitRepository;
