use chrono::{NaiveDateTime, Utc};
use shared::{CreateVisitRequest, EntityId, Visit, VisitStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::storage::entity_store::{EntityKind, Predicate, Record, SqlValue};

impl Record for Visit {
    const KIND: EntityKind = EntityKind::Visit;
    const COLUMNS: &'static str = "id, visit_date, reason, diagnosis, treatment, notes, cost, status, created_at, \
                                   pet_id, veterinarian_id, clinic_id";

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Visit {
            id: row.try_get("id")?,
            visit_date: row.try_get("visit_date")?,
            reason: row.try_get("reason")?,
            diagnosis: row.try_get("diagnosis")?,
            treatment: row.try_get("treatment")?,
            notes: row.try_get("notes")?,
            cost: row.try_get("cost")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            pet_id: row.try_get("pet_id")?,
            veterinarian_id: row.try_get("veterinarian_id")?,
            clinic_id: row.try_get("clinic_id")?,
        })
    }
}

/// Repository for visit rows
pub struct VisitRepository;

impl VisitRepository {
    /// Store a new visit. Pet, veterinarian and clinic must already be resolved
    /// and the visit date taken from the validated request.
    pub async fn insert(
        conn: &mut SqliteConnection,
        request: &CreateVisitRequest,
        visit_date: NaiveDateTime,
    ) -> Result<Visit, sqlx::Error> {
        let created_at = Utc::now();
        let status = request.status.unwrap_or_default();
        let result = sqlx::query(
            r#"
            INSERT INTO visits (visit_date, reason, diagnosis, treatment, notes, cost, status, created_at,
                                pet_id, veterinarian_id, clinic_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(visit_date)
        .bind(&request.reason)
        .bind(&request.diagnosis)
        .bind(&request.treatment)
        .bind(&request.notes)
        .bind(request.cost)
        .bind(status)
        .bind(created_at)
        .bind(request.pet_id)
        .bind(request.veterinarian_id)
        .bind(request.clinic_id)
        .execute(&mut *conn)
        .await?;

        Ok(Visit {
            id: result.last_insert_rowid(),
            visit_date,
            reason: request.reason.clone(),
            diagnosis: request.diagnosis.clone(),
            treatment: request.treatment.clone(),
            notes: request.notes.clone(),
            cost: request.cost,
            status,
            created_at,
            pet_id: request.pet_id,
            veterinarian_id: request.veterinarian_id,
            clinic_id: request.clinic_id,
        })
    }

    /// Overwrite the mutable columns; the three bindings are never rewritten
    pub async fn update(conn: &mut SqliteConnection, visit: &Visit) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE visits
            SET visit_date = ?, reason = ?, diagnosis = ?, treatment = ?, notes = ?, cost = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(visit.visit_date)
        .bind(&visit.reason)
        .bind(&visit.diagnosis)
        .bind(&visit.treatment)
        .bind(&visit.notes)
        .bind(visit.cost)
        .bind(visit.status)
        .bind(visit.id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub fn by_pet(pet_id: EntityId) -> Predicate {
        Predicate::Equals("pet_id", SqlValue::Integer(pet_id))
    }

    pub fn by_pets(pet_ids: &[EntityId]) -> Predicate {
        Predicate::ids_in("pet_id", pet_ids)
    }

    pub fn by_veterinarian(veterinarian_id: EntityId) -> Predicate {
        Predicate::Equals("veterinarian_id", SqlValue::Integer(veterinarian_id))
    }

    pub fn by_clinic(clinic_id: EntityId) -> Predicate {
        Predicate::Equals("clinic_id", SqlValue::Integer(clinic_id))
    }

    pub fn by_status(status: VisitStatus) -> Predicate {
        Predicate::Equals("status", SqlValue::from(status))
    }

    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Predicate {
        Predicate::Between("visit_date", SqlValue::from(start), SqlValue::from(end))
    }
}
