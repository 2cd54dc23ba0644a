use config::{Config, ConfigError, Environment, File};
use secrecy::Secret;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

use crate::types::MAX_PAGE_SIZE;

/// Field list of the default record collection.
pub const DEFAULT_RECORD_FIELDS: &str = "company1, no1, company, tel0, tel1, tel2, tel3, tel, id3, no, mail1, zip1, zip, address1, URL, XML, longitude, latitude, ido, mail, ID, address, keido, lat, lon, geolocation, active, hp1, map, hp0, hp, id1, id2, hpmail1, hpmail2, hpmail, program1, program, download, com2, com";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub retention: RetentionConfig,
    pub governance: GovernanceConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

/// Which `RecordStore` implementation to build.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    JsonFile,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_dir: PathBuf,
    pub record_class: String,
    /// A list, or one comma separated string.
    #[serde(deserialize_with = "field_list")]
    pub record_fields: Vec<String>,
    pub file_store_class: String,
    pub page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            data_dir: "./data".into(),
            record_class: "DataStore".into(),
            record_fields: parse_field_list(DEFAULT_RECORD_FIELDS),
            file_store_class: "FileStore".into(),
            page_size: MAX_PAGE_SIZE,
        }
    }
}

/// Deployment-wide choice of file sweep strategy.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileSweepKind {
    /// Delete file metadata records through the record store.
    Query,
    /// Delete files directly under `file_store_path`.
    Filesystem,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetentionConfig {
    pub file_sweep: FileSweepKind,
    pub file_store_path: Option<PathBuf>,
    pub file_metadata_class: String,
    pub batch_size: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            file_sweep: FileSweepKind::Query,
            file_store_path: None,
            file_metadata_class: "_FileMetadata".into(),
            batch_size: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GovernanceConfig {
    pub admin_token: Option<Secret<String>>,
    pub audit_log_path: Option<PathBuf>,
    pub json_logs: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("RECORDOPS_ENV").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map APP__SERVER__PORT=3000 to server.port
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

fn field_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::List(fields) => fields,
        Raw::Joined(list) => parse_field_list(&list),
    })
}

/// Split a comma separated field list.
pub fn parse_field_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(String::from)
        .collect()
}
