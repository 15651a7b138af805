use std::env;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub max_files_per_upload: usize,
    pub signup_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = match var("DATABASE_URL").filter(|v| !v.is_empty()) {
            Some(url) => url,
            None => {
                let name = var("DB_NAME").ok_or(ConfigError::Missing("DATABASE_URL or DB_NAME"))?;
                let host = var("DB_HOST").unwrap_or_else(|| "localhost".to_string());
                let port = var("DB_PORT").unwrap_or_else(|| "3306".to_string());
                let user = var("DB_USER").unwrap_or_else(|| "root".to_string());
                let password = var("DB_PASSWORD").unwrap_or_default();
                if password.is_empty() {
                    format!("mysql://{}@{}:{}/{}", user, host, port, name)
                } else {
                    format!("mysql://{}:{}@{}:{}/{}", user, password, host, port, name)
                }
            }
        };

        let jwt_secret = var("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let server_port = match var("PORT").or_else(|| var("SERVER_PORT")) {
            Some(v) => parse("PORT", &v)?,
            None => 8080,
        };

        Ok(Config {
            database_url,
            db_max_connections: parse_or(&var, "DB_MAX_CONNECTIONS", 10)?,
            run_migrations: flag(&var, "RUN_MIGRATIONS", true),
            server_host: var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port,
            jwt_secret,
            jwt_ttl_hours: parse_or(&var, "JWT_TTL_HOURS", 24)?,
            upload_dir: var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./uploads/documents")),
            max_upload_bytes: parse_or(&var, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            max_files_per_upload: parse_or(&var, "MAX_FILES_PER_UPLOAD", 10)?,
            signup_enabled: flag(&var, "SIGNUP_ENABLED", true),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_or<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(v) => parse(key, &v),
        None => Ok(default),
    }
}

fn flag<F>(var: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(v) => v != "false" && v != "0",
        None => default,
    }
}
