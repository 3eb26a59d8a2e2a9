use crate::application_port::CountStrategy;
use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub log: Log,
    pub store: Store,
    #[serde(default)]
    pub follow: Follow,
    #[serde(default)]
    pub identity: Identity,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "mysql"
    pub mysql_dsn: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_unique_edges")]
    pub unique_edges: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct Follow {
    #[serde(default)]
    pub count_strategy: CountStrategy,
}

#[derive(Debug, Deserialize)]
pub struct Identity {
    #[serde(default = "default_identity_header")]
    pub header: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            header: default_identity_header(),
        }
    }
}

fn default_collection() -> String {
    "followers".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_unique_edges() -> bool {
    true
}

fn default_identity_header() -> String {
    "x-user-id".to_string()
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
