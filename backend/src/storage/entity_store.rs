//! # Entity Store
//!
//! Generic keyed persistence shared by every entity table. Each entity type
//! implements [`Record`] to describe its table and row mapping; the typed
//! [`EntityStore`] then provides lookups, predicate listings and deletes on top
//! of one caller-supplied connection, so a service can run many store calls
//! inside a single transaction.
//!
//! Inserts and updates are column-specific and live in the per-entity
//! repositories.

use chrono::NaiveDateTime;
use shared::{EntityId, VisitStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use std::fmt;
use std::marker::PhantomData;

/// Every persisted entity type, used to address tables without knowing the
/// Rust type (cascades walk the graph by kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Clinic,
    Owner,
    PetType,
    Pet,
    Specialty,
    Veterinarian,
    Visit,
}

impl EntityKind {
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Clinic => "clinics",
            EntityKind::Owner => "owners",
            EntityKind::PetType => "pet_types",
            EntityKind::Pet => "pets",
            EntityKind::Specialty => "specialties",
            EntityKind::Veterinarian => "veterinarians",
            EntityKind::Visit => "visits",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Clinic => "Clinic",
            EntityKind::Owner => "Owner",
            EntityKind::PetType => "Pet type",
            EntityKind::Pet => "Pet",
            EntityKind::Specialty => "Specialty",
            EntityKind::Veterinarian => "Veterinarian",
            EntityKind::Visit => "Visit",
        }
    }

    /// Visits track progress through `status` and have no active flag
    pub fn has_active_flag(self) -> bool {
        !matches!(self, EntityKind::Visit)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A value bound into a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<VisitStatus> for SqlValue {
    fn from(value: VisitStatus) -> Self {
        SqlValue::Text(value.to_string())
    }
}

/// Row filter. Column names are always compile-time constants.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(&'static str, SqlValue),
    NotEquals(&'static str, SqlValue),
    IsTrue(&'static str),
    /// Case-insensitive substring match on any of the columns. Folded with
    /// Unicode lowercasing and applied to fetched rows, since SQLite's
    /// `LOWER()` only folds ASCII.
    ContainsIgnoreCase(&'static [&'static str], String),
    /// Inclusive on both ends
    Between(&'static str, SqlValue, SqlValue),
    /// An empty value list matches nothing
    In(&'static str, Vec<SqlValue>),
}

impl Predicate {
    pub fn id_is(id: EntityId) -> Self {
        Predicate::Equals("id", SqlValue::Integer(id))
    }

    pub fn ids_in(column: &'static str, ids: &[EntityId]) -> Self {
        Predicate::In(column, ids.iter().copied().map(SqlValue::Integer).collect())
    }

    pub fn is_text_search(&self) -> bool {
        matches!(self, Predicate::ContainsIgnoreCase(..))
    }
}

/// A persisted entity type
pub trait Record: Sized + Send + Unpin {
    const KIND: EntityKind;
    /// Comma-separated select list, `id` first
    const COLUMNS: &'static str;

    fn id(&self) -> EntityId;

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

/// Typed access to the rows of one entity table
pub struct EntityStore<T>(PhantomData<T>);

impl<T: Record> EntityStore<T> {
    /// Get a row by id
    pub async fn get(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<T>, sqlx::Error> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?", T::COLUMNS, T::KIND.table());
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    pub async fn exists(conn: &mut SqliteConnection, id: EntityId) -> Result<bool, sqlx::Error> {
        row_exists(conn, T::KIND, id).await
    }

    /// List every row ordered by id
    pub async fn list_all(conn: &mut SqliteConnection) -> Result<Vec<T>, sqlx::Error> {
        Self::list_where(conn, &[]).await
    }

    /// List rows matching all predicates, ordered by id
    pub async fn list_where(conn: &mut SqliteConnection, predicates: &[Predicate]) -> Result<Vec<T>, sqlx::Error> {
        Self::list_where_ordered(conn, predicates, "id ASC").await
    }

    /// List rows matching all predicates with an explicit ORDER BY clause
    pub async fn list_where_ordered(
        conn: &mut SqliteConnection,
        predicates: &[Predicate],
        order_by: &'static str,
    ) -> Result<Vec<T>, sqlx::Error> {
        let rows = fetch_rows(conn, T::KIND, T::COLUMNS, predicates, order_by).await?;
        rows.iter().map(T::from_row).collect()
    }

    pub async fn ids_where(conn: &mut SqliteConnection, predicates: &[Predicate]) -> Result<Vec<EntityId>, sqlx::Error> {
        select_ids(conn, T::KIND, predicates).await
    }

    /// Delete a single row. Returns true if the row existed.
    pub async fn delete(conn: &mut SqliteConnection, id: EntityId) -> Result<bool, sqlx::Error> {
        Ok(delete_rows(conn, T::KIND, &[Predicate::id_is(id)]).await? > 0)
    }

    /// Flip the active flag. Returns false when no row has the id.
    pub async fn set_active(conn: &mut SqliteConnection, id: EntityId, active: bool) -> Result<bool, sqlx::Error> {
        set_active(conn, T::KIND, id, active).await
    }

    /// Returns the number of rows removed
    pub async fn delete_where(conn: &mut SqliteConnection, predicates: &[Predicate]) -> Result<u64, sqlx::Error> {
        delete_rows(conn, T::KIND, predicates).await
    }
}

pub(crate) async fn row_exists(conn: &mut SqliteConnection, kind: EntityKind, id: EntityId) -> Result<bool, sqlx::Error> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?", kind.table());
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
    Ok(row.is_some())
}

pub(crate) async fn select_ids(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    predicates: &[Predicate],
) -> Result<Vec<EntityId>, sqlx::Error> {
    let select_list = if predicates.iter().any(Predicate::is_text_search) { "*" } else { "id" };
    let rows = fetch_rows(conn, kind, select_list, predicates, "id ASC").await?;
    rows.iter().map(|row| row.try_get::<EntityId, _>("id")).collect()
}

pub(crate) async fn delete_rows(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    predicates: &[Predicate],
) -> Result<u64, sqlx::Error> {
    // Text matches cannot be expressed in SQL; resolve them to ids first
    let by_id;
    let predicates = if predicates.iter().any(Predicate::is_text_search) {
        by_id = [Predicate::ids_in("id", &select_ids(conn, kind, predicates).await?)];
        &by_id[..]
    } else {
        predicates
    };

    let mut builder = QueryBuilder::<Sqlite>::new(format!("DELETE FROM {}", kind.table()));
    push_where(&mut builder, predicates);

    let result = builder.build().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

/// Flip the active flag. Returns false when no row has the id.
pub(crate) async fn set_active(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: EntityId,
    active: bool,
) -> Result<bool, sqlx::Error> {
    let sql = format!("UPDATE {} SET active = ? WHERE id = ?", kind.table());
    let result = sqlx::query(&sql).bind(active).bind(id).execute(&mut *conn).await?;
    Ok(result.rows_affected() > 0)
}

/// Null out an optional reference column wherever it points at `id`
pub(crate) async fn clear_reference(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    column: &'static str,
    id: EntityId,
) -> Result<u64, sqlx::Error> {
    let sql = format!("UPDATE {table} SET {column} = NULL WHERE {column} = ?", table = kind.table());
    let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

pub async fn count_rows(conn: &mut SqliteConnection, kind: EntityKind) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) AS n FROM {}", kind.table());
    let row = sqlx::query(&sql).fetch_one(&mut *conn).await?;
    row.try_get("n")
}

async fn fetch_rows(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    select_list: &str,
    predicates: &[Predicate],
    order_by: &str,
) -> Result<Vec<SqliteRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM {}", select_list, kind.table()));
    push_where(&mut builder, predicates);
    builder.push(" ORDER BY ").push(order_by);

    let mut rows = builder.build().fetch_all(&mut *conn).await?;
    for predicate in predicates {
        if let Predicate::ContainsIgnoreCase(columns, term) = predicate {
            let needle = term.to_lowercase();
            let mut kept = Vec::with_capacity(rows.len());
            for row in rows {
                if row_contains(&row, columns, &needle)? {
                    kept.push(row);
                }
            }
            rows = kept;
        }
    }
    Ok(rows)
}

/// True when any of the text columns contains `needle` after lowercasing
fn row_contains(row: &SqliteRow, columns: &[&str], needle: &str) -> Result<bool, sqlx::Error> {
    for column in columns {
        let value: Option<String> = row.try_get(*column)?;
        if value.is_some_and(|v| v.to_lowercase().contains(needle)) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn push_where(builder: &mut QueryBuilder<'_, Sqlite>, predicates: &[Predicate]) {
    let predicates = predicates.iter().filter(|p| !p.is_text_search());
    for (index, predicate) in predicates.enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });

        match predicate {
            Predicate::Equals(column, value) => {
                builder.push(*column).push(" = ");
                push_value(builder, value);
            }
            Predicate::NotEquals(column, value) => {
                builder.push(*column).push(" <> ");
                push_value(builder, value);
            }
            Predicate::IsTrue(column) => {
                builder.push(*column).push(" = 1");
            }
            // Filtered after the fetch
            Predicate::ContainsIgnoreCase(..) => {
                builder.push("1 = 1");
            }
            Predicate::Between(column, from, to) => {
                builder.push(*column).push(" BETWEEN ");
                push_value(builder, from);
                builder.push(" AND ");
                push_value(builder, to);
            }
            Predicate::In(column, values) => {
                if values.is_empty() {
                    builder.push("0 = 1");
                    continue;
                }
                builder.push(*column).push(" IN (");
                for (position, value) in values.iter().enumerate() {
                    if position > 0 {
                        builder.push(", ");
                    }
                    push_value(builder, value);
                }
                builder.push(")");
            }
        }
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &SqlValue) {
    match value {
        SqlValue::Integer(v) => {
            builder.push_bind(*v);
        }
        SqlValue::Text(v) => {
            builder.push_bind(v.clone());
        }
        SqlValue::Timestamp(v) => {
            builder.push_bind(*v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_where_renders_predicates() {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT id FROM pets");
        push_where(
            &mut builder,
            &[
                Predicate::Equals("owner_id", SqlValue::Integer(3)),
                Predicate::IsTrue("active"),
                Predicate::ContainsIgnoreCase(&["name", "breed"], "Max".to_string()),
            ],
        );

        assert_eq!(builder.sql(), "SELECT id FROM pets WHERE owner_id = ? AND active = 1");
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT id FROM visits");
        push_where(&mut builder, &[Predicate::ids_in("pet_id", &[])]);
        assert_eq!(builder.sql(), "SELECT id FROM visits WHERE 0 = 1");

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT id FROM visits");
        push_where(&mut builder, &[Predicate::ids_in("pet_id", &[1, 2])]);
        assert_eq!(builder.sql(), "SELECT id FROM visits WHERE pet_id IN (?, ?)");
    }

    #[test]
    fn test_entity_kind_metadata() {
        assert_eq!(EntityKind::PetType.table(), "pet_types");
        assert_eq!(EntityKind::PetType.to_string(), "Pet type");
        assert!(EntityKind::Owner.has_active_flag());
        assert!(!EntityKind::Visit.has_active_flag());
    }

    #[tokio::test]
    async fn test_store_round_trips_enum_columns() {
        use crate::storage::test_utils::*;
        use crate::storage::{DbConnection, PetRepository, VisitRepository};
        use shared::{Gender, Pet, Visit};

        let db = DbConnection::init_in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let owner = seed_owner(&mut conn, "ana@example.com").await;
        let dog = seed_pet_type(&mut conn, "Dog").await;
        let clinic = seed_clinic(&mut conn, "Central").await;
        let vet = seed_veterinarian(&mut conn, "V1", None).await;
        let mut max = seed_pet(&mut conn, "Max", owner.id, dog.id, None).await;
        let mut visit = seed_visit(&mut conn, max.id, vet.id, clinic.id, at(2025, 1, 1, 9)).await;

        max.gender = Gender::Female;
        assert!(PetRepository::update(&mut conn, &max).await.unwrap());
        visit.status = VisitStatus::Cancelled;
        assert!(VisitRepository::update(&mut conn, &visit).await.unwrap());

        assert_eq!(EntityStore::<Pet>::get(&mut conn, max.id).await.unwrap(), Some(max.clone()));
        assert_eq!(EntityStore::<Visit>::get(&mut conn, visit.id).await.unwrap(), Some(visit.clone()));
        assert_eq!(EntityStore::<Pet>::get(&mut conn, 999).await.unwrap(), None);

        let cancelled = EntityStore::<Visit>::list_where(&mut conn, &[VisitRepository::by_status(VisitStatus::Cancelled)])
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_delete_where() {
        use crate::storage::test_utils::*;
        use crate::storage::DbConnection;
        use shared::Specialty;

        let db = DbConnection::init_in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let surgery = seed_specialty(&mut conn, "Surgery").await;
        seed_specialty(&mut conn, "Cardiology").await;
        seed_specialty(&mut conn, "Dermatology").await;

        assert!(EntityStore::<Specialty>::delete(&mut conn, surgery.id).await.unwrap());
        assert!(!EntityStore::<Specialty>::delete(&mut conn, surgery.id).await.unwrap());

        let removed = EntityStore::<Specialty>::delete_where(
            &mut conn,
            &[Predicate::ContainsIgnoreCase(&["name"], "logy".to_string())],
        )
        .await
        .unwrap();
        assert_eq!(removed, 2);
        assert!(EntityStore::<Specialty>::list_all(&mut conn).await.unwrap().is_empty());
    }
}
