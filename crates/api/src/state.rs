use std::sync::Arc;

use dsreg_core::schema::SchemaConfig;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: dsreg_db::DbPool,
    /// Server configuration (admin identity, chart storage, limits).
    pub config: Arc<ServerConfig>,
    /// Column-mapping schema driving import, diffing, and export.
    pub schema: Arc<SchemaConfig>,
}
