//! # Storage Module
//!
//! SQLite persistence for the clinic domain.
//!
//! ## Layout
//!
//! - `connection`: the shared pool, schema setup and transaction entry points
//! - `entity_store`: the generic [`EntityStore`] over any [`Record`], plus the
//!   [`Predicate`] filter language
//! - `repositories`: entity-specific insert/update SQL, finders and the
//!   veterinarian ↔ specialty link table
//!
//! Every store and repository call takes a `&mut SqliteConnection`, so a
//! domain service decides where its transaction begins and ends.

pub mod connection;
pub mod entity_store;
pub mod repositories;

pub use connection::DbConnection;
pub use entity_store::{count_rows, EntityKind, EntityStore, Predicate, Record, SqlValue};
pub use repositories::*;

#[cfg(test)]
pub mod test_utils;
