use chrono::Utc;
use shared::{Clinic, CreateClinicRequest, EntityId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::storage::entity_store::{EntityKind, Predicate, Record, SqlValue};

impl Record for Clinic {
    const KIND: EntityKind = EntityKind::Clinic;
    const COLUMNS: &'static str = "id, name, address, city, phone, email, working_hours, active, created_at";

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Clinic {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            working_hours: row.try_get("working_hours")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Repository for clinic rows
pub struct ClinicRepository;

impl ClinicRepository {
    /// Store a new clinic, assigning its id and creation time
    pub async fn insert(conn: &mut SqliteConnection, request: &CreateClinicRequest) -> Result<Clinic, sqlx::Error> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO clinics (name, address, city, phone, email, working_hours, active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, TRUE, ?)
            "#,
        )
        .bind(&request.name)
        .bind(&request.address)
        .bind(&request.city)
        .bind(&request.phone)
        .bind(&request.email)
        .bind(&request.working_hours)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        Ok(Clinic {
            id: result.last_insert_rowid(),
            name: request.name.clone(),
            address: request.address.clone(),
            city: request.city.clone(),
            phone: request.phone.clone(),
            email: request.email.clone(),
            working_hours: request.working_hours.clone(),
            active: true,
            created_at,
        })
    }

    /// Overwrite the mutable columns of a clinic
    pub async fn update(conn: &mut SqliteConnection, clinic: &Clinic) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE clinics
            SET name = ?, address = ?, city = ?, phone = ?, email = ?, working_hours = ?
            WHERE id = ?
            "#,
        )
        .bind(&clinic.name)
        .bind(&clinic.address)
        .bind(&clinic.city)
        .bind(&clinic.phone)
        .bind(&clinic.email)
        .bind(&clinic.working_hours)
        .bind(clinic.id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub fn by_city(city: &str) -> Predicate {
        Predicate::Equals("city", SqlValue::from(city))
    }

    pub fn name_contains(term: &str) -> Predicate {
        Predicate::ContainsIgnoreCase(&["name"], term.to_string())
    }
}
