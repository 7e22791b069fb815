use chrono::{NaiveDate, Utc};
use shared::{CreatePetRequest, EntityId, Pet};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::storage::entity_store::{EntityKind, Predicate, Record, SqlValue};

impl Record for Pet {
    const KIND: EntityKind = EntityKind::Pet;
    const COLUMNS: &'static str = "id, name, birth_date, breed, gender, color, weight, medical_notes, photo_url, \
                                   active, created_at, owner_id, pet_type_id, primary_clinic_id";

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Pet {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            birth_date: row.try_get("birth_date")?,
            breed: row.try_get("breed")?,
            gender: row.try_get("gender")?,
            color: row.try_get("color")?,
            weight: row.try_get("weight")?,
            medical_notes: row.try_get("medical_notes")?,
            photo_url: row.try_get("photo_url")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
            owner_id: row.try_get("owner_id")?,
            pet_type_id: row.try_get("pet_type_id")?,
            primary_clinic_id: row.try_get("primary_clinic_id")?,
        })
    }
}

/// Repository for pet rows
pub struct PetRepository;

impl PetRepository {
    /// Store a new pet. References must already be resolved by the caller and
    /// the birth date taken from the validated request.
    pub async fn insert(
        conn: &mut SqliteConnection,
        request: &CreatePetRequest,
        birth_date: NaiveDate,
    ) -> Result<Pet, sqlx::Error> {
        let created_at = Utc::now();
        let gender = request.gender.unwrap_or_default();
        let result = sqlx::query(
            r#"
            INSERT INTO pets (name, birth_date, breed, gender, color, weight, medical_notes, photo_url,
                              active, created_at, owner_id, pet_type_id, primary_clinic_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, TRUE, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.name)
        .bind(birth_date)
        .bind(&request.breed)
        .bind(gender)
        .bind(&request.color)
        .bind(request.weight)
        .bind(&request.medical_notes)
        .bind(&request.photo_url)
        .bind(created_at)
        .bind(request.owner_id)
        .bind(request.pet_type_id)
        .bind(request.clinic_id)
        .execute(&mut *conn)
        .await?;

        Ok(Pet {
            id: result.last_insert_rowid(),
            name: request.name.clone(),
            birth_date,
            breed: request.breed.clone(),
            gender,
            color: request.color.clone(),
            weight: request.weight,
            medical_notes: request.medical_notes.clone(),
            photo_url: request.photo_url.clone(),
            active: true,
            created_at,
            owner_id: request.owner_id,
            pet_type_id: request.pet_type_id,
            primary_clinic_id: request.clinic_id,
        })
    }

    /// Overwrite the mutable columns of a pet; references are never rewritten
    pub async fn update(conn: &mut SqliteConnection, pet: &Pet) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE pets
            SET name = ?, birth_date = ?, breed = ?, gender = ?, color = ?, weight = ?,
                medical_notes = ?, photo_url = ?
            WHERE id = ?
            "#,
        )
        .bind(&pet.name)
        .bind(pet.birth_date)
        .bind(&pet.breed)
        .bind(pet.gender)
        .bind(&pet.color)
        .bind(pet.weight)
        .bind(&pet.medical_notes)
        .bind(&pet.photo_url)
        .bind(pet.id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub fn by_owner(owner_id: EntityId) -> Predicate {
        Predicate::Equals("owner_id", SqlValue::Integer(owner_id))
    }

    pub fn by_pet_type(pet_type_id: EntityId) -> Predicate {
        Predicate::Equals("pet_type_id", SqlValue::Integer(pet_type_id))
    }

    pub fn by_primary_clinic(clinic_id: EntityId) -> Predicate {
        Predicate::Equals("primary_clinic_id", SqlValue::Integer(clinic_id))
    }

    pub fn name_contains(term: &str) -> Predicate {
        Predicate::ContainsIgnoreCase(&["name"], term.to_string())
    }
}
