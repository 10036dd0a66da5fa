//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize`/plain create DTO for inserts

pub mod audit;
pub mod change;
pub mod chart;
pub mod dataset;
