use dsreg_core::schema::SchemaConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `4000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// The single identity allowed to approve or reject pending changes.
    ///
    /// Injected into the review pipeline from here; nothing below the
    /// handler layer reads it from the environment.
    pub admin_user: String,
    /// Directory where uploaded chart images are stored.
    pub charts_dir: String,
    /// Path to a JSON column-mapping config; the built-in registry schema
    /// is used when unset.
    pub schema_config_path: Option<String>,
    /// Default number of audit entries returned by the audit-log endpoint.
    pub audit_log_limit: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `4000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `ADMIN_USER`           | `admin`                    |
    /// | `CHARTS_DIR`           | `./data/charts`            |
    /// | `SCHEMA_CONFIG`        | (unset: built-in schema)   |
    /// | `AUDIT_LOG_LIMIT`      | `100`                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "4000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let admin_user = std::env::var("ADMIN_USER").unwrap_or_else(|_| "admin".into());

        let charts_dir = std::env::var("CHARTS_DIR").unwrap_or_else(|_| "./data/charts".into());

        let schema_config_path = std::env::var("SCHEMA_CONFIG").ok();

        let audit_log_limit: i64 = std::env::var("AUDIT_LOG_LIMIT")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("AUDIT_LOG_LIMIT must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            admin_user,
            charts_dir,
            schema_config_path,
            audit_log_limit,
        }
    }

    /// Load and validate the column-mapping schema this server runs with.
    ///
    /// Panics on an unreadable or invalid config file, which is the
    /// desired behaviour -- we want misconfiguration to fail fast.
    pub fn load_schema(&self) -> SchemaConfig {
        match &self.schema_config_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .unwrap_or_else(|e| panic!("Failed to read schema config '{path}': {e}"));
                SchemaConfig::from_json(&json)
                    .unwrap_or_else(|e| panic!("Invalid schema config '{path}': {e}"))
            }
            None => SchemaConfig::registry_default(),
        }
    }
}
