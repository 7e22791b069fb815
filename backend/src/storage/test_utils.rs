//! Seeding helpers for tests that need a populated clinic graph.
//!
//! Each helper writes straight through the repositories on the connection it
//! is given, bypassing the services' validation.

use chrono::{NaiveDate, NaiveDateTime};
use shared::*;
use sqlx::SqliteConnection;

use super::repositories::*;

pub async fn seed_owner(conn: &mut SqliteConnection, email: &str) -> Owner {
    OwnerRepository::insert(
        conn,
        &CreateOwnerRequest {
            first_name: "Test".to_string(),
            last_name: "Owner".to_string(),
            email: email.to_string(),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to seed owner")
}

pub async fn seed_pet_type(conn: &mut SqliteConnection, name: &str) -> PetType {
    PetTypeRepository::insert(
        conn,
        &CreateCatalogEntryRequest {
            name: name.to_string(),
            description: None,
        },
    )
    .await
    .expect("Failed to seed pet type")
}

pub async fn seed_specialty(conn: &mut SqliteConnection, name: &str) -> Specialty {
    SpecialtyRepository::insert(
        conn,
        &CreateCatalogEntryRequest {
            name: name.to_string(),
            description: None,
        },
    )
    .await
    .expect("Failed to seed specialty")
}

pub async fn seed_clinic(conn: &mut SqliteConnection, name: &str) -> Clinic {
    ClinicRepository::insert(
        conn,
        &CreateClinicRequest {
            name: name.to_string(),
            address: "Calle 1 #2-3".to_string(),
            city: "Medellin".to_string(),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to seed clinic")
}

/// The veterinarian's email is derived from the license number
pub async fn seed_veterinarian(conn: &mut SqliteConnection, license: &str, clinic_id: Option<EntityId>) -> Veterinarian {
    VeterinarianRepository::insert(
        conn,
        &CreateVeterinarianRequest {
            first_name: "Test".to_string(),
            last_name: "Vet".to_string(),
            license_number: license.to_string(),
            email: format!("{}@vets.example.com", license.to_lowercase()),
            clinic_id,
            ..Default::default()
        },
    )
    .await
    .expect("Failed to seed veterinarian")
}

pub async fn seed_pet(
    conn: &mut SqliteConnection,
    name: &str,
    owner_id: EntityId,
    pet_type_id: EntityId,
    clinic_id: Option<EntityId>,
) -> Pet {
    PetRepository::insert(
        conn,
        &CreatePetRequest {
            name: name.to_string(),
            owner_id,
            pet_type_id,
            clinic_id,
            ..Default::default()
        },
        born(2020, 5, 15),
    )
    .await
    .expect("Failed to seed pet")
}

pub async fn seed_visit(
    conn: &mut SqliteConnection,
    pet_id: EntityId,
    veterinarian_id: EntityId,
    clinic_id: EntityId,
    visit_date: NaiveDateTime,
) -> Visit {
    VisitRepository::insert(
        conn,
        &CreateVisitRequest {
            visit_date: Some(visit_date),
            reason: "Checkup".to_string(),
            pet_id,
            veterinarian_id,
            clinic_id,
            ..Default::default()
        },
        visit_date,
    )
    .await
    .expect("Failed to seed visit")
}

pub fn born(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("Invalid test date")
}

/// A timestamp on a given day and hour
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .expect("Invalid test timestamp")
}
