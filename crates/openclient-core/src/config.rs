//! Configuration management for openclient code generation.
//!
//! This module defines the `Config` struct and related functionality for managing
//! code generation settings. The configuration can be loaded from a YAML or TOML
//! file, created programmatically, or assembled from command-line arguments.
//!
//! # Examples
//!
//! ```no_run
//! use openclient_core::config::Config;
//!
//! # #[tokio::main]
//! # async fn main() -> openclient_core::Result<()> {
//! // Create a new config programmatically
//! let mut config = Config::new("petstore-client", "openapi.yaml", "output");
//! config.exclude_operations.push("deletePet".to_string());
//!
//! // Or load from a config file
//! let config = Config::from_file("openclient.yaml").await?;
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::path::Path;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use tokio::fs;
use url::Url;

use crate::Error;

/// Runtime module generated code imports from, unless configured otherwise
pub const DEFAULT_RUNTIME_CRATE: &str = "openclient_core::runtime";

/// Configuration for client generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Project name, used as the generated package name
    pub project_name: String,

    /// Path or URL of the OpenAPI document
    pub openapi_schema_path: String,

    /// Output directory for generated code
    pub output_dir: String,

    /// Whether to include all operations regardless of `include_operations`
    #[serde(default)]
    pub include_all: bool,

    /// Operations to include; empty means all
    #[serde(default)]
    pub include_operations: Vec<String>,

    /// Operations to exclude
    #[serde(default)]
    pub exclude_operations: Vec<String>,

    /// Base URL that relative server URLs are joined onto
    #[serde(default)]
    pub base_url: Option<Url>,

    /// Path of the runtime module referenced from generated code
    #[serde(default = "default_runtime_crate")]
    pub runtime_crate: String,
}

/// On-disk configuration format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Toml,
}

impl Format {
    fn of(path: &Path) -> crate::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            _ => Err(Error::config(format!(
                "unsupported configuration file '{}': expected .yaml, .yml or .toml",
                path.display()
            ))),
        }
    }
}

impl Config {
    /// Create a new Config with default values
    pub fn new(
        project_name: impl Into<String>,
        openapi_schema_path: impl Into<String>,
        output_dir: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            openapi_schema_path: openapi_schema_path.into(),
            output_dir: output_dir.into(),
            include_all: false,
            include_operations: Vec::new(),
            exclude_operations: Vec::new(),
            base_url: None,
            runtime_crate: default_runtime_crate(),
        }
    }

    /// Load configuration from a YAML or TOML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let format = Format::of(path)?;
        let content = fs::read_to_string(path).await?;
        let config = match format {
            Format::Yaml => serde_yaml::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a YAML or TOML file
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let path = path.as_ref();
        let content = match Format::of(path)? {
            Format::Yaml => serde_yaml::to_string(self)?,
            Format::Toml => toml::to_string(self)?,
        };
        fs::write(path, content).await?;
        Ok(())
    }

    /// Whether the operation `id` is generated.
    ///
    /// Exclusion wins over inclusion; an empty include list includes everything.
    pub fn selects(&self, id: &str) -> bool {
        if self.exclude_operations.iter().any(|op| op == id) {
            return false;
        }
        self.include_all
            || self.include_operations.is_empty()
            || self.include_operations.iter().any(|op| op == id)
    }
}

fn default_runtime_crate() -> String {
    DEFAULT_RUNTIME_CRATE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_config_roundtrip() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("config.yaml");

        let config = Config::new("petstore-client", "openapi.json", "output");
        config.save(&file_path).await?;

        let loaded = Config::from_file(&file_path).await?;
        assert_eq!(loaded, config);
        assert_eq!(loaded.project_name, "petstore-client");
        assert_eq!(loaded.openapi_schema_path, "openapi.json");
        assert_eq!(loaded.output_dir, "output");
        assert_eq!(loaded.runtime_crate, DEFAULT_RUNTIME_CRATE);
        assert!(!loaded.include_all);
        assert_eq!(loaded.include_operations, Vec::<String>::new());
        assert_eq!(loaded.exclude_operations, Vec::<String>::new());
        assert_eq!(loaded.base_url, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_config_toml() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("openclient.toml");
        tokio::fs::write(
            &file_path,
            r#"
project_name = "pets"
openapi_schema_path = "https://example.com/openapi.json"
output_dir = "out"
exclude_operations = ["deletePet"]
base_url = "https://example.com/"
"#,
        )
        .await?;

        let mut config = Config::from_file(&file_path).await?;
        assert_eq!(config.exclude_operations, vec!["deletePet".to_string()]);
        assert_eq!(
            config.base_url.as_ref().map(Url::as_str),
            Some("https://example.com/")
        );

        config.runtime_crate = "my_runtime".to_string();
        config.save(&file_path).await?;
        assert_eq!(Config::from_file(&file_path).await?.runtime_crate, "my_runtime");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_extension() {
        let err = Config::from_file("openclient.json").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_selects() {
        let mut config = Config::new("p", "s", "o");
        assert!(config.selects("listPets"));

        config.include_operations = vec!["listPets".into(), "deletePet".into()];
        config.exclude_operations = vec!["deletePet".into()];
        assert!(config.selects("listPets"));
        assert!(!config.selects("showPetById"));
        assert!(!config.selects("deletePet"));

        config.include_all = true;
        assert!(config.selects("showPetById"));
        assert!(!config.selects("deletePet"));
    }
}
