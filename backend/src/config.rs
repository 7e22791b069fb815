use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::storage::connection::{DATABASE_URL, DEFAULT_MAX_CONNECTIONS};

/// Prefix of the environment overrides, e.g. `VETCARE_DATABASE_URL`
pub const ENV_PREFIX: &str = "VETCARE";

/// Optional settings file looked up in the working directory (`vetcare.toml`)
pub const DEFAULT_CONFIG_FILE: &str = "vetcare";

/// Runtime settings for the backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info,sqlx=warn`
    pub log_filter: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            database_url: DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            log_filter: "info".to_string(),
        }
    }
}

impl BackendConfig {
    /// Defaults, then `vetcare.toml` if present, then `VETCARE_*` variables.
    /// `RUST_LOG` stands in for `VETCARE_LOG_FILTER` when only it is set.
    pub fn from_env() -> Result<Self> {
        Self::load(None, None)
    }

    /// Load with an explicit settings file, which must exist
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(Some(path.as_ref()), None)
    }

    /// `vars` replaces the process environment when given
    fn load(path: Option<&Path>, vars: Option<Map<String, String>>) -> Result<Self> {
        let rust_log = match &vars {
            Some(vars) => vars.get("RUST_LOG").cloned(),
            None => std::env::var("RUST_LOG").ok(),
        };

        let mut builder = Config::builder();
        if let Some(filter) = rust_log {
            builder = builder.set_default("log_filter", filter).context("Failed to apply RUST_LOG")?;
        }
        builder = match path {
            Some(path) => {
                info!("Loading config from {}", path.display());
                builder.add_source(File::from(path).required(true))
            }
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true).source(vars))
            .build()
            .context("Failed to build config")?
            .try_deserialize::<Self>()
            .context("Failed to deserialize config")?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn test_defaults() {
        let config = BackendConfig::load(None, vars(&[])).unwrap();
        assert_eq!(config, BackendConfig::default());
        assert_eq!(config.database_url, "sqlite:vetcare.db");
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_environment_overrides() {
        let config = BackendConfig::load(
            None,
            vars(&[
                ("VETCARE_DATABASE_URL", "sqlite:/tmp/clinic.db"),
                ("VETCARE_MAX_CONNECTIONS", "8"),
                ("RUST_LOG", "debug"),
            ]),
        )
        .unwrap();

        assert_eq!(config.database_url, "sqlite:/tmp/clinic.db");
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.log_filter, "debug");

        let config = BackendConfig::load(
            None,
            vars(&[("VETCARE_LOG_FILTER", "vetcare_backend=trace"), ("RUST_LOG", "debug")]),
        )
        .unwrap();
        assert_eq!(config.log_filter, "vetcare_backend=trace");
    }

    #[test]
    fn test_bad_pool_size_is_an_error() {
        let err = BackendConfig::load(None, vars(&[("VETCARE_MAX_CONNECTIONS", "many")])).unwrap_err();
        assert!(err.to_string().contains("Failed to deserialize config"));
    }

    #[test]
    fn test_file_then_environment() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("clinic.toml");
        std::fs::write(&path, "database_url = \"sqlite:file.db\"\nmax_connections = 3\n").unwrap();

        let config = BackendConfig::load(Some(&path), vars(&[("VETCARE_MAX_CONNECTIONS", "9")])).unwrap();
        assert_eq!(config.database_url, "sqlite:file.db");
        assert_eq!(config.max_connections, 9);
        assert_eq!(config.log_filter, "info");

        assert!(BackendConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
