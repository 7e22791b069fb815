use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Numeric identity assigned by the store when a row is created
pub type EntityId = i64;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Sex of a pet as recorded at the front desk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

/// Progress of a visit through the clinic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clinic {
    pub id: EntityId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Free-form opening hours, e.g. "Mon-Fri 08:00-18:00"
    pub working_hours: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    /// National ID or passport number, unique when present
    pub document_number: Option<String>,
    /// Unique across all owners, active or not
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Owner {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetType {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: EntityId,
    pub name: String,
    pub birth_date: NaiveDate,
    pub breed: Option<String>,
    pub gender: Gender,
    pub color: Option<String>,
    /// Kilograms
    pub weight: Option<f64>,
    pub medical_notes: Option<String>,
    pub photo_url: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub owner_id: EntityId,
    pub pet_type_id: EntityId,
    pub primary_clinic_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialty {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A veterinarian row. Specialty membership is held separately and surfaced
/// through [`VeterinarianDetail`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Veterinarian {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub email: String,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub clinic_id: Option<EntityId>,
}

impl Veterinarian {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: EntityId,
    pub visit_date: NaiveDateTime,
    pub reason: String,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub cost: Option<f64>,
    pub status: VisitStatus,
    pub created_at: DateTime<Utc>,
    pub pet_id: EntityId,
    pub veterinarian_id: EntityId,
    pub clinic_id: EntityId,
}

fn join_name(first: &str, last: &str) -> String {
    format!("{} {}", first, last).trim().to_string()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateClinicRequest {
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub working_hours: Option<String>,
}

/// Fields left as `None` keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateClinicRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub working_hours: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateOwnerRequest {
    pub first_name: String,
    pub last_name: String,
    pub document_number: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateOwnerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub document_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

/// Shared by pet types and specialties, which carry the same shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateCatalogEntryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateCatalogEntryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatePetRequest {
    pub name: String,
    /// Required; `None` is rejected by validation
    pub birth_date: Option<NaiveDate>,
    pub breed: Option<String>,
    /// Defaults to `Gender::Unknown`
    pub gender: Option<Gender>,
    pub color: Option<String>,
    pub weight: Option<f64>,
    pub medical_notes: Option<String>,
    pub photo_url: Option<String>,
    pub owner_id: EntityId,
    pub pet_type_id: EntityId,
    pub clinic_id: Option<EntityId>,
}

/// Owner, pet type and primary clinic are bound at creation and cannot be
/// changed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePetRequest {
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub breed: Option<String>,
    pub gender: Option<Gender>,
    pub color: Option<String>,
    pub weight: Option<f64>,
    pub medical_notes: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateVeterinarianRequest {
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub email: String,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
    pub clinic_id: Option<EntityId>,
}

/// The license number is fixed once issued
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateVeterinarianRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateVisitRequest {
    /// Required; `None` is rejected by validation
    pub visit_date: Option<NaiveDateTime>,
    pub reason: String,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub cost: Option<f64>,
    /// Defaults to `VisitStatus::Scheduled`
    pub status: Option<VisitStatus>,
    pub pet_id: EntityId,
    pub veterinarian_id: EntityId,
    pub clinic_id: EntityId,
}

/// Pet, veterinarian and clinic bindings are immutable after creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateVisitRequest {
    pub visit_date: Option<NaiveDateTime>,
    pub reason: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub cost: Option<f64>,
    pub status: Option<VisitStatus>,
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicSummary {
    pub id: EntityId,
    pub name: String,
    pub city: String,
    pub phone: Option<String>,
}

impl From<&Clinic> for ClinicSummary {
    fn from(clinic: &Clinic) -> Self {
        Self {
            id: clinic.id,
            name: clinic.name.clone(),
            city: clinic.city.clone(),
            phone: clinic.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: EntityId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&Owner> for OwnerSummary {
    fn from(owner: &Owner) -> Self {
        Self {
            id: owner.id,
            full_name: owner.full_name(),
            email: owner.email.clone(),
            phone: owner.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetSummary {
    pub id: EntityId,
    pub name: String,
    pub birth_date: NaiveDate,
    pub breed: Option<String>,
    pub gender: Gender,
    pub pet_type_name: String,
}

impl PetSummary {
    pub fn new(pet: &Pet, pet_type_name: impl Into<String>) -> Self {
        Self {
            id: pet.id,
            name: pet.name.clone(),
            birth_date: pet.birth_date,
            breed: pet.breed.clone(),
            gender: pet.gender,
            pet_type_name: pet_type_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VeterinarianSummary {
    pub id: EntityId,
    pub full_name: String,
    pub license_number: String,
    pub email: String,
}

impl From<&Veterinarian> for VeterinarianSummary {
    fn from(vet: &Veterinarian) -> Self {
        Self {
            id: vet.id,
            full_name: vet.full_name(),
            license_number: vet.license_number.clone(),
            email: vet.email.clone(),
        }
    }
}

/// Owner with every pet they own, active or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerWithPets {
    #[serde(flatten)]
    pub owner: Owner,
    pub pets: Vec<PetSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetDetail {
    #[serde(flatten)]
    pub pet: Pet,
    pub owner: OwnerSummary,
    pub pet_type: PetType,
    pub primary_clinic: Option<ClinicSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VeterinarianDetail {
    #[serde(flatten)]
    pub veterinarian: Veterinarian,
    pub clinic: Option<ClinicSummary>,
    /// Ordered by name
    pub specialties: Vec<Specialty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitDetail {
    #[serde(flatten)]
    pub visit: Visit,
    pub pet: PetSummary,
    pub veterinarian: VeterinarianSummary,
    pub clinic: ClinicSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicWithVeterinarians {
    #[serde(flatten)]
    pub clinic: Clinic,
    pub veterinarians: Vec<VeterinarianSummary>,
}
