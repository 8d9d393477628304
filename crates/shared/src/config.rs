//! Application configuration management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Structure editor configuration.
    #[serde(default)]
    pub editor: EditorConfig,
    /// Structure store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Structure editor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    /// Trees with more lines than this start fully collapsed.
    #[serde(default = "default_collapse_threshold")]
    pub collapse_threshold: usize,
}

fn default_collapse_threshold() -> usize {
    50
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            collapse_threshold: default_collapse_threshold(),
        }
    }
}

/// Storage backend holding persisted report structures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreProvider {
    /// In-process memory (tests and throwaway sessions).
    #[default]
    Memory,
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
}

impl StoreProvider {
    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Create S3-compatible provider (Cloudflare R2, Supabase, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Get the provider name for log output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::LocalFs { .. } => "local",
            Self::S3 { .. } => "s3",
        }
    }
}

/// Structure store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Storage provider configuration.
    #[serde(default)]
    pub provider: StoreProvider,
    /// Key prefix under which structure documents are written.
    #[serde(default = "default_store_prefix")]
    pub prefix: String,
}

fn default_store_prefix() -> String {
    "structures".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: StoreProvider::default(),
            prefix: default_store_prefix(),
        }
    }
}

impl StoreConfig {
    /// Create a store config for the given provider with the default prefix.
    #[must_use]
    pub fn new(provider: StoreProvider) -> Self {
        Self {
            provider,
            prefix: default_store_prefix(),
        }
    }

    /// Set the key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "reportree=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("REPORTREE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        temp_env::with_vars_unset(
            [
                "REPORTREE__EDITOR__COLLAPSE_THRESHOLD",
                "REPORTREE__STORE__PREFIX",
                "REPORTREE__LOGGING__FILTER",
            ],
            || {
                let config = AppConfig::load().expect("defaults should load");
                assert_eq!(config.editor.collapse_threshold, 50);
                assert_eq!(config.store.provider, StoreProvider::Memory);
                assert_eq!(config.store.prefix, "structures");
                assert_eq!(config.logging.filter, "reportree=info");
            },
        );
    }

    #[test]
    fn test_environment_overrides() {
        temp_env::with_vars(
            [
                ("REPORTREE__EDITOR__COLLAPSE_THRESHOLD", Some("10")),
                ("REPORTREE__STORE__PREFIX", Some("templates")),
                ("REPORTREE__LOGGING__FILTER", Some("reportree=debug")),
            ],
            || {
                let config = AppConfig::load().expect("env config should load");
                assert_eq!(config.editor.collapse_threshold, 10);
                assert_eq!(config.store.prefix, "templates");
                assert_eq!(config.logging.filter, "reportree=debug");
            },
        );
    }

    #[test]
    fn test_store_provider_names() {
        assert_eq!(StoreProvider::Memory.name(), "memory");
        assert_eq!(StoreProvider::local_fs("./data").name(), "local");
        assert_eq!(
            StoreProvider::s3("https://r2.example", "reports", "key", "secret", "auto").name(),
            "s3"
        );
    }

    #[test]
    fn test_store_provider_deserializes_tagged() {
        let provider: StoreProvider =
            serde_json::from_str(r#"{"type":"local_fs","root":"./structures"}"#)
                .expect("valid provider");
        assert_eq!(provider, StoreProvider::local_fs("./structures"));
    }

    #[test]
    fn test_store_config_builder() {
        let config = StoreConfig::new(StoreProvider::Memory).with_prefix("drafts");
        assert_eq!(config.prefix, "drafts");
    }
}
