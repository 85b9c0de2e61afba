//! Database credential providers
//!
//! Only the MySQL backend needs an account. The default provider fetches it
//! from a HashiCorp Vault KV v2 engine; `StaticCredentials` serves embedders
//! and tests.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::VaultConfig;
use crate::error::CredentialError;

/// Database account
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Source of `(username, password)` pairs
pub trait CredentialProvider {
    /// Look up the account stored under `key`
    fn credentials(&self, key: &str) -> Result<Credentials, CredentialError>;
}

/// Fixed credentials
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self(Credentials {
            username: username.into(),
            password: password.into(),
        })
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self, _key: &str) -> Result<Credentials, CredentialError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct SecretsFile {
    db: VaultAccess,
}

#[derive(Debug, Deserialize)]
struct VaultAccess {
    #[serde(rename = "TOKEN")]
    token: String,
    #[serde(rename = "VAULT_ADDR")]
    vault_addr: String,
}

#[derive(Debug, Deserialize)]
struct KvResponse {
    data: KvData,
}

#[derive(Debug, Deserialize)]
struct KvData {
    data: serde_json::Map<String, serde_json::Value>,
}

/// Credentials read from a Vault KV v2 secret
///
/// The secret's first key/value pair is taken as `(username, password)`.
#[derive(Debug, Clone)]
pub struct VaultCredentialProvider {
    secrets_file: PathBuf,
    ca_cert: PathBuf,
}

impl VaultCredentialProvider {
    pub fn new(config: &VaultConfig) -> Self {
        Self {
            secrets_file: config.secrets_file.clone(),
            ca_cert: config.ca_cert.clone(),
        }
    }

    fn access(&self) -> Result<VaultAccess, CredentialError> {
        let content =
            fs::read_to_string(&self.secrets_file).map_err(|e| CredentialError::SecretsFile {
                path: self.secrets_file.clone(),
                reason: e.to_string(),
            })?;
        let secrets: SecretsFile =
            serde_yaml::from_str(&content).map_err(|e| CredentialError::SecretsFile {
                path: self.secrets_file.clone(),
                reason: e.to_string(),
            })?;
        Ok(secrets.db)
    }

    fn client(&self) -> Result<reqwest::blocking::Client, CredentialError> {
        let mut builder = reqwest::blocking::Client::builder();
        if self.ca_cert.exists() {
            builder = builder.add_root_certificate(load_certificate(&self.ca_cert)?);
        }
        builder
            .build()
            .map_err(|e| CredentialError::Request(e.to_string()))
    }
}

impl CredentialProvider for VaultCredentialProvider {
    fn credentials(&self, key: &str) -> Result<Credentials, CredentialError> {
        let access = self.access()?;
        let url = format!(
            "{}/v1/secret/data/{}",
            access.vault_addr.trim_end_matches('/'),
            key
        );
        tracing::debug!("Fetching database credentials from {}", url);

        let response = self
            .client()?
            .get(&url)
            .header("X-Vault-Token", access.token)
            .send()
            .map_err(|e| CredentialError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CredentialError::Request(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let body: KvResponse = response.json().map_err(|e| CredentialError::Malformed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        credentials_from_secret(key, &body.data.data)
    }
}

fn load_certificate(path: &Path) -> Result<reqwest::Certificate, CredentialError> {
    let pem = fs::read(path).map_err(|e| {
        CredentialError::Request(format!(
            "cannot read CA certificate {}: {e}",
            path.display()
        ))
    })?;
    reqwest::Certificate::from_pem(&pem).map_err(|e| CredentialError::Request(e.to_string()))
}

fn credentials_from_secret(
    key: &str,
    data: &serde_json::Map<String, serde_json::Value>,
) -> Result<Credentials, CredentialError> {
    let (username, password) = data.iter().next().ok_or_else(|| CredentialError::Malformed {
        key: key.to_string(),
        reason: "secret holds no entry".to_string(),
    })?;
    let password = password
        .as_str()
        .ok_or_else(|| CredentialError::Malformed {
            key: key.to_string(),
            reason: "password is not a string".to_string(),
        })?;
    Ok(Credentials {
        username: username.clone(),
        password: password.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_credentials_from_secret_takes_first_pair() {
        let data: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(r#"{"birder": "s3cret"}"#).unwrap();
        let creds = credentials_from_secret("comptes", &data).unwrap();
        assert_eq!(creds.username, "birder");
        assert_eq!(creds.password, "s3cret");
    }

    #[test]
    fn test_credentials_follow_response_order() {
        let data: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(r#"{"zoe": "first", "adam": "second"}"#).unwrap();
        let creds = credentials_from_secret("comptes", &data).unwrap();
        assert_eq!(creds.username, "zoe");
        assert_eq!(creds.password, "first");
    }

    #[test]
    fn test_credentials_from_empty_secret_fails() {
        let data = serde_json::Map::new();
        let result = credentials_from_secret("comptes", &data);
        assert!(matches!(result, Err(CredentialError::Malformed { .. })));
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = StaticCredentials::new("birder", "s3cret")
            .credentials("any")
            .unwrap();
        let printed = format!("{:?}", creds);
        assert!(printed.contains("birder"));
        assert!(!printed.contains("s3cret"));
    }

    #[test]
    fn test_missing_secrets_file() {
        let dir = TempDir::new().unwrap();
        let provider = VaultCredentialProvider::new(&VaultConfig {
            secrets_file: dir.path().join("absent.yml"),
            ca_cert: dir.path().join("absent.pem"),
        });
        let result = provider.credentials("comptes");
        assert!(matches!(result, Err(CredentialError::SecretsFile { .. })));
    }

    #[test]
    fn test_secrets_file_parsing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.yml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "db:\n  TOKEN: abc\n  VAULT_ADDR: https://vault.local:8200").unwrap();

        let provider = VaultCredentialProvider::new(&VaultConfig {
            secrets_file: path,
            ca_cert: dir.path().join("absent.pem"),
        });
        let access = provider.access().unwrap();
        assert_eq!(access.token, "abc");
        assert_eq!(access.vault_addr, "https://vault.local:8200");
    }
}
