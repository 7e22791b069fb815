use chrono::Utc;
use shared::{CreateOwnerRequest, EntityId, Owner};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::storage::entity_store::{EntityKind, Predicate, Record};

impl Record for Owner {
    const KIND: EntityKind = EntityKind::Owner;
    const COLUMNS: &'static str =
        "id, first_name, last_name, document_number, email, phone, address, city, active, created_at";

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Owner {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            document_number: row.try_get("document_number")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Repository for owner rows
pub struct OwnerRepository;

impl OwnerRepository {
    /// Store a new owner, assigning its id and creation time
    pub async fn insert(conn: &mut SqliteConnection, request: &CreateOwnerRequest) -> Result<Owner, sqlx::Error> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO owners (first_name, last_name, document_number, email, phone, address, city, active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, TRUE, ?)
            "#,
        )
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.document_number)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.address)
        .bind(&request.city)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        Ok(Owner {
            id: result.last_insert_rowid(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            document_number: request.document_number.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            address: request.address.clone(),
            city: request.city.clone(),
            active: true,
            created_at,
        })
    }

    /// Overwrite the mutable columns of an owner
    pub async fn update(conn: &mut SqliteConnection, owner: &Owner) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE owners
            SET first_name = ?, last_name = ?, document_number = ?, email = ?, phone = ?, address = ?, city = ?
            WHERE id = ?
            "#,
        )
        .bind(&owner.first_name)
        .bind(&owner.last_name)
        .bind(&owner.document_number)
        .bind(&owner.email)
        .bind(&owner.phone)
        .bind(&owner.address)
        .bind(&owner.city)
        .bind(owner.id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub fn name_contains(term: &str) -> Predicate {
        Predicate::ContainsIgnoreCase(&["first_name", "last_name"], term.to_string())
    }
}
