//! Store configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `vfstore.toml` in the working directory, then `VFSTORE__*` environment
//! variables (`VFSTORE__CREATE_PARENTS=true`).

use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::FsError;

/// Backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one sled database per namespace.
    pub data_dir: PathBuf,
    /// Prepended to the namespace name to form the database directory.
    pub namespace_prefix: String,
    /// Auto-create missing intermediate directories on write, create,
    /// rename, move and copy.
    pub create_parents: bool,
    /// Use a throwaway database that is deleted on drop.
    pub temporary: bool,
    /// Flush the database after every committed write transaction.
    pub flush_on_commit: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            namespace_prefix: "vfs-".to_string(),
            create_parents: false,
            temporary: false,
            flush_on_commit: false,
        }
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "vfstore")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".vfstore"))
}

impl StoreConfig {
    /// Defaults overlaid with `vfstore.toml` and the environment.
    pub fn load() -> Result<Self, FsError> {
        let builder = Config::builder().add_source(File::with_name("vfstore").required(false));
        finish(with_environment(builder))
    }

    /// Parse an inline TOML document over the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, FsError> {
        let builder = Config::builder().add_source(File::from_str(text, FileFormat::Toml));
        finish(builder)
    }

    /// In-memory database, nothing written under `data_dir`.
    pub fn temporary() -> Self {
        Self {
            temporary: true,
            ..Self::default()
        }
    }

    /// Database directory for `namespace`.
    pub fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}{}", self.namespace_prefix, namespace))
    }
}

fn with_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("VFSTORE")
            .separator("__")
            .try_parsing(true),
    )
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<StoreConfig, FsError> {
    builder
        .build()
        .and_then(Config::try_deserialize)
        .map_err(config_error)
}

fn config_error(error: ConfigError) -> FsError {
    FsError::InvalidArgument {
        operation: "config",
        details: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.namespace_prefix, "vfs-");
        assert!(!config.create_parents);
        assert!(!config.temporary);
        assert!(!config.flush_on_commit);
    }

    #[test]
    fn toml_overrides_only_named_fields() {
        let config = StoreConfig::from_toml_str(
            r#"
            create_parents = true
            namespace_prefix = "test-"
            data_dir = "/tmp/vfstore-data"
            "#,
        )
        .unwrap();
        assert!(config.create_parents);
        assert_eq!(config.namespace_prefix, "test-");
        assert!(!config.flush_on_commit);
        assert_eq!(
            config.namespace_dir("notes"),
            PathBuf::from("/tmp/vfstore-data/test-notes")
        );
    }

    #[test]
    fn empty_toml_is_default() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn bad_toml_is_an_invalid_argument() {
        let err = StoreConfig::from_toml_str("create_parents = \"sometimes\"").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }
}
