use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Storage configuration
    pub storage_backend: String,
    pub seed_file: Option<String>,
    pub write_retry_limit: u32,

    // Database configuration
    pub database_url: String,
    pub database_namespace: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,

    // Authentication configuration
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,

    // Content settings
    pub max_comment_length: usize,

    // CORS configuration
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "vidshare=debug,tower_http=debug".to_string()),

            storage_backend: env::var("STORAGE_BACKEND")
                .unwrap_or_else(|_| "memory".to_string()),
            seed_file: env::var("SEED_FILE").ok(),
            write_retry_limit: env::var("WRITE_RETRY_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            database_namespace: env::var("DATABASE_NAMESPACE")
                .unwrap_or_else(|_| "rainbow".to_string()),
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "vidshare".to_string()),
            database_username: env::var("DATABASE_USERNAME")
                .unwrap_or_else(|_| "root".to_string()),
            database_password: env::var("DATABASE_PASSWORD")
                .unwrap_or_else(|_| "root".to_string()),

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()?,

            max_comment_length: env::var("MAX_COMMENT_LENGTH")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        })
    }

    pub fn uses_surrealdb(&self) -> bool {
        self.storage_backend.eq_ignore_ascii_case("surrealdb")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// 本地开发与测试使用的默认值；`jwt_secret` 为空，必须显式设置
impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 5000,
            environment: "development".to_string(),
            log_level: "vidshare=debug,tower_http=debug".to_string(),
            storage_backend: "memory".to_string(),
            seed_file: None,
            write_retry_limit: 5,
            database_url: "http://localhost:8000".to_string(),
            database_namespace: "rainbow".to_string(),
            database_name: "vidshare".to_string(),
            database_username: "root".to_string(),
            database_password: "root".to_string(),
            jwt_secret: String::new(),
            jwt_expiry_hours: 24,
            max_comment_length: 5000,
            cors_allowed_origins: "http://localhost:3000".to_string(),
        }
    }
}
