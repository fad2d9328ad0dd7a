//! Configuration loading and management
//!
//! Configuration is read from a YAML file and then patched from the
//! environment. Every section has defaults, so an empty file (or no file at
//! all) yields a working in-memory setup listening on `0.0.0.0:8002`.
//!
//! ```yaml
//! server:
//!   bind: 0.0.0.0:8002
//! database:
//!   backend: mongodb
//!   url: mongodb://localhost:27017
//!   name: omer
//! objects:
//!   backend: s3
//!   endpoint: http://minio:9000
//!   access_key: minio
//!   secret_key: minio123
//!   bucket: omer
//! balance:
//!   isolation: per_key
//! ```

use crate::balance::Isolation;
use crate::core::error::{TallyError, TallyResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "TALLY_CONFIG";

/// Configuration file used when `TALLY_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "tally.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8002".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseBackend {
    #[default]
    InMemory,
    Mongodb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: Option<String>,
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::InMemory,
            url: None,
            name: "omer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectBackend {
    #[default]
    InMemory,
    S3,
}

/// Object storage for uploads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectsConfig {
    pub backend: ObjectBackend,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: String,
    /// Base of the URLs handed back to clients; defaults to the endpoint
    pub public_base_url: Option<String>,
    pub region: String,
}

impl Default for ObjectsConfig {
    fn default() -> Self {
        Self {
            backend: ObjectBackend::InMemory,
            endpoint: None,
            access_key: None,
            secret_key: None,
            bucket: "omer".to_string(),
            public_base_url: None,
            region: "us-east-1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
    pub max_bytes: usize,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_bytes: 32 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    pub isolation: Isolation,
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub objects: ObjectsConfig,
    pub uploads: UploadsConfig,
    pub cors: CorsConfig,
    pub balance: BalanceConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> TallyResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TallyError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> TallyResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load the file named by `TALLY_CONFIG` (or `tally.yaml`), apply the
    /// environment overrides and validate the result.
    ///
    /// A missing file is not an error: defaults are used instead.
    pub fn load() -> TallyResult<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            tracing::info!(path = %path, "loading configuration");
            Self::from_yaml_file(&path)?
        } else {
            tracing::info!(path = %path, "configuration file not found, using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    ///
    /// `MONGO_URL` selects the mongodb backend and `MINIO_URL` the s3 object
    /// store, matching how the service has always been deployed.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("TALLY_BIND") {
            self.server.bind = bind;
        }
        if let Some(url) = lookup("MONGO_URL") {
            self.database.backend = DatabaseBackend::Mongodb;
            self.database.url = Some(url);
        }
        if let Some(name) = lookup("TALLY_DATABASE") {
            self.database.name = name;
        }
        if let Some(endpoint) = lookup("MINIO_URL") {
            self.objects.backend = ObjectBackend::S3;
            self.objects.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("MINIO_KEY") {
            self.objects.access_key = Some(key);
        }
        if let Some(secret) = lookup("MINIO_SECRET") {
            self.objects.secret_key = Some(secret);
        }
        if let Some(bucket) = lookup("TALLY_BUCKET") {
            self.objects.bucket = bucket;
        }
    }

    /// Check that every selected backend has what it needs to connect
    pub fn validate(&self) -> TallyResult<()> {
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(TallyError::Config(format!(
                "server.bind '{}' is not a socket address",
                self.server.bind
            )));
        }

        if self.database.backend == DatabaseBackend::Mongodb && self.database.url.is_none() {
            return Err(TallyError::Config(
                "database.url (or MONGO_URL) is required for the mongodb backend".into(),
            ));
        }

        if self.objects.backend == ObjectBackend::S3 {
            let required = [
                ("endpoint", &self.objects.endpoint),
                ("access_key", &self.objects.access_key),
                ("secret_key", &self.objects.secret_key),
            ];
            if let Some((name, _)) = required.iter().find(|(_, value)| value.is_none()) {
                return Err(TallyError::Config(format!(
                    "objects.{name} is required for the s3 object store"
                )));
            }
        }

        if self.uploads.max_bytes == 0 {
            return Err(TallyError::Config("uploads.max_bytes must be positive".into()));
        }

        Ok(())
    }
}
