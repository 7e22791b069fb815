//! # Cascade / Soft-Delete Policy
//!
//! Hard delete walks a fixed per-kind rule table and removes dependents
//! before their parent, so no row is ever left pointing at a missing one.
//! Deactivation only flips the `active` flag of the target row.
//!
//! | Deleted      | Effect on dependents                                        |
//! |--------------|-------------------------------------------------------------|
//! | Owner        | its pets (and their visits)                                 |
//! | Pet          | its visits                                                  |
//! | PetType      | pets of that type (and their visits)                        |
//! | Clinic       | its veterinarians, its visits; pets' primary clinic cleared |
//! | Veterinarian | specialty links, visits it attended                         |
//! | Specialty    | veterinarian links                                          |
//! | Visit        | nothing                                                     |

use shared::EntityId;
use sqlx::SqliteConnection;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

use super::associations::AssociationManager;
use super::error::{DomainError, DomainResult};
use crate::storage::entity_store::{clear_reference, delete_rows, row_exists, select_ids, set_active};
use crate::storage::{EntityKind, Predicate, SqlValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeRule {
    /// Recursively delete `child` rows whose `column` references the parent
    DeleteChildren { child: EntityKind, column: &'static str },
    /// Null out an optional reference on `child` rows
    DetachChildren { child: EntityKind, column: &'static str },
    /// Remove veterinarian ↔ specialty links keyed by `column`
    DropLinks { column: &'static str },
}

/// What a delete removed, per entity kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    removed: BTreeMap<EntityKind, u64>,
    /// Rows whose optional reference was cleared
    pub detached: u64,
    pub links_removed: u64,
}

impl CascadeReport {
    pub fn removed(&self, kind: EntityKind) -> u64 {
        self.removed.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_removed(&self) -> u64 {
        self.removed.values().sum()
    }

    fn record(&mut self, kind: EntityKind, count: u64) {
        *self.removed.entry(kind).or_insert(0) += count;
    }
}

type CascadeFuture<'a> = Pin<Box<dyn Future<Output = DomainResult<()>> + Send + 'a>>;

pub struct CascadePolicy;

impl CascadePolicy {
    pub fn rules(kind: EntityKind) -> &'static [CascadeRule] {
        use CascadeRule::*;
        use EntityKind::*;

        match kind {
            Owner => &[DeleteChildren { child: Pet, column: "owner_id" }],
            Pet => &[DeleteChildren { child: Visit, column: "pet_id" }],
            PetType => &[DeleteChildren { child: Pet, column: "pet_type_id" }],
            Clinic => &[
                DeleteChildren { child: Veterinarian, column: "clinic_id" },
                DeleteChildren { child: Visit, column: "clinic_id" },
                DetachChildren { child: Pet, column: "primary_clinic_id" },
            ],
            Veterinarian => &[
                DropLinks { column: "veterinarian_id" },
                DeleteChildren { child: Visit, column: "veterinarian_id" },
            ],
            Specialty => &[DropLinks { column: "specialty_id" }],
            Visit => &[],
        }
    }

    /// Hard-delete a row and everything that depends on it
    pub async fn delete(conn: &mut SqliteConnection, kind: EntityKind, id: EntityId) -> DomainResult<CascadeReport> {
        if !row_exists(conn, kind, id).await? {
            return Err(DomainError::not_found(kind, id));
        }

        let mut report = CascadeReport::default();
        Self::remove(conn, kind, id, &mut report).await?;
        Ok(report)
    }

    /// Soft-deactivate a row. Never touches any other row.
    pub async fn deactivate(conn: &mut SqliteConnection, kind: EntityKind, id: EntityId) -> DomainResult<()> {
        if !kind.has_active_flag() {
            return Err(DomainError::Validation {
                field: "active",
                message: format!("is not tracked for {}", kind.table()),
            });
        }
        if !set_active(conn, kind, id, false).await? {
            return Err(DomainError::not_found(kind, id));
        }
        Ok(())
    }

    fn remove<'a>(
        conn: &'a mut SqliteConnection,
        kind: EntityKind,
        id: EntityId,
        report: &'a mut CascadeReport,
    ) -> CascadeFuture<'a> {
        Box::pin(async move {
            for rule in Self::rules(kind) {
                match *rule {
                    CascadeRule::DeleteChildren { child, column } => {
                        let child_ids = select_ids(conn, child, &[Predicate::Equals(column, SqlValue::Integer(id))]).await?;
                        for child_id in child_ids {
                            Self::remove(&mut *conn, child, child_id, &mut *report).await?;
                        }
                    }
                    CascadeRule::DetachChildren { child, column } => {
                        report.detached += clear_reference(conn, child, column, id).await?;
                    }
                    CascadeRule::DropLinks { column } => {
                        report.links_removed += AssociationManager::drop_links(conn, column, id).await?;
                    }
                }
            }

            let removed = delete_rows(conn, kind, &[Predicate::id_is(id)]).await?;
            debug!("Deleted {} {}", kind, id);
            report.record(kind, removed);
            Ok(())
        })
    }
}
