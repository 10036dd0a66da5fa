//! Pure domain logic for the dataset registry review service.
//!
//! This crate has no I/O and no async: it provides the column-mapping
//! schema, dataset identifier handling, the import differ, the
//! change-review vocabulary, and audit-log hashing. The `db` and `api`
//! crates build on these types.

pub mod audit;
pub mod change;
pub mod diff;
pub mod error;
pub mod hashing;
pub mod identifier;
pub mod schema;
pub mod types;
