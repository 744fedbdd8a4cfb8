use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct ProductConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    /// Connection string. Left unset, the service still starts but every
    /// query fails until it is restarted with one.
    pub uri: Option<String>,
    pub database: String,
}

impl ProductConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        Ok(ProductConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: env::var("MONGODB_URI").ok().filter(|uri| !uri.trim().is_empty()),
                // Same fallback the driver applies when no database is named.
                database: get_env("DB_NAME", "test"),
            },
        })
    }
}

fn get_env(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(val) if !val.trim().is_empty() => val,
        _ => default.to_string(),
    }
}
