use anyhow::{Context, Result};

/// Database connection parameters, read once at process entry and passed
/// down to whatever needs them.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub name: String,
    pub user: String,
    pub pass: String,
}

impl DbConfig {
    pub fn from_env() -> Result<Self> {
        Ok(DbConfig {
            host: env_var("DB_HOST")?,
            name: env_var("DB_NAME")?,
            user: env_var("DB_USER")?,
            pass: env_var("DB_PASS")?,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{} environment variable must be set", key))
}
