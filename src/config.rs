use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Settings for the `identicon` client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_client_database")]
    pub database: PathBuf,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Force the connectivity oracle: `true` = offline, `false` = online.
    /// Unset means probe the server at startup.
    #[serde(default)]
    pub offline: Option<bool>,
}

fn default_server_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_client_database() -> PathBuf {
    PathBuf::from("identicon-client.redb")
}

fn default_probe_timeout_ms() -> u64 {
    2000
}

fn default_request_timeout_ms() -> u64 {
    10000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            database: default_client_database(),
            token: None,
            probe_timeout_ms: default_probe_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            offline: None,
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }
}

/// Public identity-provider settings handed to browser clients at
/// `/auth_config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}

/// Settings for `identicon-server`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_server_database")]
    pub database: PathBuf,
    /// Bearer token -> user id. Stands in for token validation against
    /// the identity provider.
    #[serde(default)]
    pub tokens: HashMap<String, String>,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_port() -> u16 {
    3000
}

fn default_server_database() -> PathBuf {
    PathBuf::from("identicon-server.redb")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            database: default_server_database(),
            tokens: HashMap::new(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }
}
