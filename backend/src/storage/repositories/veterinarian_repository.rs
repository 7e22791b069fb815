use chrono::Utc;
use shared::{CreateVeterinarianRequest, EntityId, Veterinarian};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::storage::entity_store::{EntityKind, Predicate, Record, SqlValue};

impl Record for Veterinarian {
    const KIND: EntityKind = EntityKind::Veterinarian;
    const COLUMNS: &'static str =
        "id, first_name, last_name, license_number, email, phone, photo_url, active, created_at, clinic_id";

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Veterinarian {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            license_number: row.try_get("license_number")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            photo_url: row.try_get("photo_url")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
            clinic_id: row.try_get("clinic_id")?,
        })
    }
}

/// Link table holding veterinarian ↔ specialty membership
pub const MEMBERSHIP_TABLE: &str = "veterinarian_specialties";

/// Repository for veterinarian rows and their specialty membership
pub struct VeterinarianRepository;

impl VeterinarianRepository {
    pub async fn insert(conn: &mut SqliteConnection, request: &CreateVeterinarianRequest) -> Result<Veterinarian, sqlx::Error> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO veterinarians (first_name, last_name, license_number, email, phone, photo_url,
                                       active, created_at, clinic_id)
            VALUES (?, ?, ?, ?, ?, ?, TRUE, ?, ?)
            "#,
        )
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.license_number)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.photo_url)
        .bind(created_at)
        .bind(request.clinic_id)
        .execute(&mut *conn)
        .await?;

        Ok(Veterinarian {
            id: result.last_insert_rowid(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            license_number: request.license_number.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            photo_url: request.photo_url.clone(),
            active: true,
            created_at,
            clinic_id: request.clinic_id,
        })
    }

    /// Overwrite the mutable columns; license number and clinic stay as created
    pub async fn update(conn: &mut SqliteConnection, vet: &Veterinarian) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE veterinarians
            SET first_name = ?, last_name = ?, email = ?, phone = ?, photo_url = ?
            WHERE id = ?
            "#,
        )
        .bind(&vet.first_name)
        .bind(&vet.last_name)
        .bind(&vet.email)
        .bind(&vet.phone)
        .bind(&vet.photo_url)
        .bind(vet.id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set-insert; an existing membership is left as is
    pub async fn link_specialty(
        conn: &mut SqliteConnection,
        vet_id: EntityId,
        specialty_id: EntityId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO veterinarian_specialties (veterinarian_id, specialty_id) VALUES (?, ?)",
        )
        .bind(vet_id)
        .bind(specialty_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn unlink_specialty(
        conn: &mut SqliteConnection,
        vet_id: EntityId,
        specialty_id: EntityId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM veterinarian_specialties WHERE veterinarian_id = ? AND specialty_id = ?",
        )
        .bind(vet_id)
        .bind(specialty_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every membership row whose `column` points at `id`
    pub async fn drop_links(conn: &mut SqliteConnection, column: &'static str, id: EntityId) -> Result<u64, sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", MEMBERSHIP_TABLE, column);
        let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    pub async fn specialty_ids_of(conn: &mut SqliteConnection, vet_id: EntityId) -> Result<Vec<EntityId>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT specialty_id FROM veterinarian_specialties WHERE veterinarian_id = ? ORDER BY specialty_id",
        )
        .bind(vet_id)
        .fetch_all(&mut *conn)
        .await?;
        rows.iter().map(|row| row.try_get("specialty_id")).collect()
    }

    pub async fn ids_with_specialty(conn: &mut SqliteConnection, specialty_id: EntityId) -> Result<Vec<EntityId>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT veterinarian_id FROM veterinarian_specialties WHERE specialty_id = ? ORDER BY veterinarian_id",
        )
        .bind(specialty_id)
        .fetch_all(&mut *conn)
        .await?;
        rows.iter().map(|row| row.try_get("veterinarian_id")).collect()
    }

    pub fn by_clinic(clinic_id: EntityId) -> Predicate {
        Predicate::Equals("clinic_id", SqlValue::Integer(clinic_id))
    }

    pub fn name_contains(term: &str) -> Predicate {
        Predicate::ContainsIgnoreCase(&["first_name", "last_name"], term.to_string())
    }
}
