//! Configuration file handling
//!
//! The configuration lives in `$HOME/.config/o2eb.yml` and is created with
//! defaults on first use. It is loaded once by the caller and passed down
//! explicitly; nothing in the crate keeps it in global state.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::aggregate::CountPolicy;
use crate::error::ConfigError;

/// Configuration file name inside `$HOME/.config`
pub const CONFIG_FILE_NAME: &str = "o2eb.yml";

/// Database dialect of the observation store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Embedded single-file SQLite database (default)
    #[default]
    Sqlite,
    /// Networked MySQL server
    Mysql,
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(Dialect::Sqlite),
            "mysql" => Ok(Dialect::Mysql),
            _ => Err(format!("Invalid dialect: {}. Expected: sqlite, mysql", s)),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::Mysql => write!(f, "mysql"),
        }
    }
}

/// SQLite backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Path of the database file; its stem names the observation table
    pub db: PathBuf,
}

/// MySQL backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MysqlConfig {
    /// Database name, also used as the observation table name
    pub db: String,
    pub host: String,
    #[serde(deserialize_with = "port_from_text_or_number")]
    pub port: u16,
    /// Id of the secret holding the database account
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            db: "observations".to_string(),
            host: "localhost".to_string(),
            port: 3306,
            secret_key: default_secret_key(),
        }
    }
}

/// Section selecting the active backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultSection {
    pub db_dialect: Dialect,
}

/// Reverse geocoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Base URL of a Nominatim-compatible service
    #[serde(default = "default_geocoder_url")]
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            url: default_geocoder_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// Vault credential lookup settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// YAML file holding `db.TOKEN` and `db.VAULT_ADDR`
    #[serde(default = "default_secrets_file")]
    pub secrets_file: PathBuf,
    /// PEM root certificate trusted for the Vault server, used when present
    #[serde(default = "default_ca_cert")]
    pub ca_cert: PathBuf,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            secrets_file: default_secrets_file(),
            ca_cert: default_ca_cert(),
        }
    }
}

/// Export behaviour settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default)]
    pub count_policy: CountPolicy,
}

/// Whole configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub sqlite: SqliteConfig,
    #[serde(default)]
    pub mysql: MysqlConfig,
    #[serde(rename = "default", default)]
    pub defaults: DefaultSection,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub export: ExportOptions,
}

/// The subset of the configuration the storage adapter needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub dialect: Dialect,
    pub sqlite: SqliteConfig,
    pub mysql: MysqlConfig,
}

impl DatabaseConfig {
    /// Configuration for a SQLite store at `path`
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            dialect: Dialect::Sqlite,
            sqlite: SqliteConfig { db: path.into() },
            mysql: MysqlConfig::default(),
        }
    }

    /// Name of the table holding the observation snapshot
    ///
    /// SQLite uses the database file stem, MySQL the database name.
    pub fn table_name(&self) -> Result<String, ConfigError> {
        match self.dialect {
            Dialect::Sqlite => self
                .sqlite
                .db
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.split('.').next().unwrap_or(s).to_string())
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "sqlite.db has no usable file name: {}",
                        self.sqlite.db.display()
                    ))
                }),
            Dialect::Mysql => {
                if self.mysql.db.is_empty() {
                    Err(ConfigError::Invalid("mysql.db is empty".to_string()))
                } else {
                    Ok(self.mysql.db.clone())
                }
            }
        }
    }
}

impl AppConfig {
    /// Default configuration rooted at the given home directory
    pub fn with_home(home: &Path) -> Self {
        Self {
            sqlite: SqliteConfig {
                db: home.join("observations.sqlite"),
            },
            mysql: MysqlConfig::default(),
            defaults: DefaultSection::default(),
            geocoder: GeocoderConfig::default(),
            vault: VaultConfig::default(),
            export: ExportOptions::default(),
        }
    }

    /// `$HOME/.config/o2eb.yml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        home_dir()
            .map(|home| home.join(".config").join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoHomeDirectory)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Yaml {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load a configuration file, writing the defaults first if it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let home = home_dir().ok_or(ConfigError::NoHomeDirectory)?;
            let config = Self::with_home(&home);
            config.save(path)?;
            tracing::info!("Created default configuration at {}", path.display());
            return Ok(config);
        }
        Self::load(path)
    }

    /// Write the configuration, creating the parent directory when needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let yaml = serde_yaml::to_string(self).map_err(|e| ConfigError::Yaml {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, yaml).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Storage settings for the active dialect
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            dialect: self.defaults.db_dialect,
            sqlite: self.sqlite.clone(),
            mysql: self.mysql.clone(),
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

fn default_secret_key() -> String {
    "comptes".to_string()
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    "obs2ebird".to_string()
}

fn default_secrets_file() -> PathBuf {
    PathBuf::from("secrets.yml")
}

fn default_ca_cert() -> PathBuf {
    PathBuf::from("root_ca.pem")
}

// The original file format writes the port as a quoted string.
fn port_from_text_or_number<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port: {text}"))),
    }
}
