use std::env;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use url::Url;

pub fn load() -> Result<Config, ConfigError> {
    let path = env::var("CONFIG_PATH").unwrap_or("config.toml".to_owned());
    config::Config::builder()
        .add_source(File::with_name(&path))
        .add_source(Environment::default().separator("__"))
        .build()?
        .try_deserialize()
}

pub fn load_database_config() -> Result<Database, ConfigError> {
    Ok(load()?.database)
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database: Database,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub url: Url,
    pub connect_timeout: u64,
    /// Upper bound for the connection pool; the driver default is used when unset.
    #[serde(default)]
    pub max_connections: Option<u32>,
}
