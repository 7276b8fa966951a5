use crate::infrastructure::ViewsTable;
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use std::time::Duration;

pub use config::ConfigError;

/// Older deployments name the store connection string this way
const LEGACY_STORE_URL_KEY: &str = "mongo_uri";

/// Runtime settings, read from defaults, optional config files and the
/// process environment (in increasing precedence).
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Origin every request is forwarded to
    pub cdn_url: String,
    /// Connection string of the view store. `MONGO_URI` is read when
    /// `DATABASE_URL` is unset.
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub request_timeout_ms: u64,
    pub accounting_timeout_ms: u64,
    pub database_max_connections: u32,
    pub views_table: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::build(Environment::default())
    }

    /// Load settings from an explicit variable map instead of the process
    /// environment.
    pub fn load_from(vars: Map<String, String>) -> Result<Self, ConfigError> {
        Self::build(Environment::default().source(Some(vars)))
    }

    fn build(environment: Environment) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("request_timeout_ms", 30_000)?
            .set_default("accounting_timeout_ms", 2_000)?
            .set_default("database_max_connections", 10)?
            .set_default("views_table", "video_views")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment.try_parsing(true).ignore_empty(true))
            .build()?;

        if config.get_string("database_url").is_ok() {
            return config.try_deserialize();
        }

        let legacy_url = config.get_string(LEGACY_STORE_URL_KEY).ok();
        Config::builder()
            .add_source(config)
            .set_override_option("database_url", legacy_url)?
            .build()?
            .try_deserialize()
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn accounting_timeout(&self) -> Duration {
        Duration::from_millis(self.accounting_timeout_ms)
    }

    pub fn views_table(&self) -> Result<ViewsTable, ConfigError> {
        ViewsTable::try_new(self.views_table.clone()).map_err(|_| {
            ConfigError::Message(format!(
                "views_table {:?} is not a valid table name",
                self.views_table
            ))
        })
    }
}
