use chrono::Utc;
use shared::{CreateCatalogEntryRequest, EntityId, PetType};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::storage::entity_store::{EntityKind, Predicate, Record};

impl Record for PetType {
    const KIND: EntityKind = EntityKind::PetType;
    const COLUMNS: &'static str = "id, name, description, active, created_at";

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(PetType {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Repository for pet type rows
pub struct PetTypeRepository;

impl PetTypeRepository {
    pub async fn insert(conn: &mut SqliteConnection, request: &CreateCatalogEntryRequest) -> Result<PetType, sqlx::Error> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO pet_types (name, description, active, created_at)
            VALUES (?, ?, TRUE, ?)
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        Ok(PetType {
            id: result.last_insert_rowid(),
            name: request.name.clone(),
            description: request.description.clone(),
            active: true,
            created_at,
        })
    }

    pub async fn update(conn: &mut SqliteConnection, pet_type: &PetType) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE pet_types SET name = ?, description = ? WHERE id = ?")
            .bind(&pet_type.name)
            .bind(&pet_type.description)
            .bind(pet_type.id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub fn name_contains(term: &str) -> Predicate {
        Predicate::ContainsIgnoreCase(&["name"], term.to_string())
    }
}
