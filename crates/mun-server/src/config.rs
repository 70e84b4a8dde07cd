//! Configuration management

use serde::{Deserialize, Serialize};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/mun";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Default session cookie name.
pub const DEFAULT_SESSION_COOKIE: &str = "mun_session";

/// Default session cookie lifetime in hours.
pub const DEFAULT_SESSION_COOKIE_HOURS: i64 = 8;

/// Default directory for the audit JSON-lines file.
pub const DEFAULT_AUDIT_LOG_DIR: &str = "./logs";

/// Default audit file name prefix.
pub const DEFAULT_AUDIT_FILE_PREFIX: &str = "audit";

/// Default audit file rotation threshold in bytes (8 MiB).
pub const DEFAULT_AUDIT_MAX_FILE_BYTES: u64 = 8 * 1024 * 1024;

/// Default number of rotated audit files to keep.
pub const DEFAULT_AUDIT_MAX_FILES: usize = 5;

/// Default audit mirror table.
pub const DEFAULT_AUDIT_TABLE: &str = "logs";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub session: SessionConfig,
    pub audit: AuditConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_hours: i64,
}

/// Audit sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub log_dir: String,
    pub file_prefix: String,
    pub max_file_bytes: u64,
    pub max_files: usize,
    /// Mirror table name, optionally schema-qualified. `None` disables the
    /// table sink entirely.
    pub table: Option<String>,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("MUN_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: std::env::var("MUN_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: std::env::var("MUN_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MIN_CONNECTIONS),
                connect_timeout_secs: std::env::var("DATABASE_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                allow_credentials: std::env::var("CORS_ALLOW_CREDENTIALS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
            },
            session: SessionConfig {
                cookie_name: std::env::var("SESSION_COOKIE")
                    .unwrap_or_else(|_| DEFAULT_SESSION_COOKIE.to_string()),
                cookie_secure: std::env::var("SESSION_COOKIE_SECURE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(false),
                cookie_hours: std::env::var("SESSION_COOKIE_HOURS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SESSION_COOKIE_HOURS),
            },
            audit: AuditConfig {
                log_dir: std::env::var("AUDIT_LOG_DIR")
                    .unwrap_or_else(|_| DEFAULT_AUDIT_LOG_DIR.to_string()),
                file_prefix: std::env::var("AUDIT_FILE_PREFIX")
                    .unwrap_or_else(|_| DEFAULT_AUDIT_FILE_PREFIX.to_string()),
                max_file_bytes: std::env::var("AUDIT_MAX_FILE_BYTES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_AUDIT_MAX_FILE_BYTES),
                max_files: std::env::var("AUDIT_MAX_FILES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_AUDIT_MAX_FILES),
                table: match std::env::var("AUDIT_TABLE") {
                    Ok(value) if value.trim().is_empty() || value.trim() == "off" => None,
                    Ok(value) => Some(value.trim().to_string()),
                    Err(_) => Some(DEFAULT_AUDIT_TABLE.to_string()),
                },
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if let Some(ref table) = self.audit.table {
            if !crate::audit::sink::is_valid_table_identifier(table) {
                anyhow::bail!("Invalid audit table identifier: {}", table);
            }
        }

        if self.audit.max_files == 0 {
            anyhow::bail!("audit.max_files must be at least 1");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            session: SessionConfig {
                cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
                cookie_secure: false,
                cookie_hours: DEFAULT_SESSION_COOKIE_HOURS,
            },
            audit: AuditConfig {
                log_dir: DEFAULT_AUDIT_LOG_DIR.to_string(),
                file_prefix: DEFAULT_AUDIT_FILE_PREFIX.to_string(),
                max_file_bytes: DEFAULT_AUDIT_MAX_FILE_BYTES,
                max_files: DEFAULT_AUDIT_MAX_FILES,
                table: Some(DEFAULT_AUDIT_TABLE.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_pool_bounds() {
        let mut config = Config::default();
        config.database.min_connections = 20;
        config.database.max_connections = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_audit_table() {
        let mut config = Config::default();
        config.audit.table = Some("logs; DROP TABLE users".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_accepts_schema_qualified_audit_table() {
        let mut config = Config::default();
        config.audit.table = Some("audit.logs".to_string());
        assert!(config.validate().is_ok());
    }
}
