//! OpenAPI document loading and utilities.
//!
//! This module loads OpenAPI documents from files or URLs (JSON or YAML) into
//! the typed model in [`model`] and [`schema`], and provides accessors for the
//! few document-wide values the generator needs.
//!
//! # Examples
//!
//! ```no_run
//! use openclient_core::openapi::OpenApiContext;
//! use openclient_core::error::Result;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let spec = OpenApiContext::from_file("openapi.json").await?;
//! println!("{} v{}", spec.title(), spec.version());
//! # Ok(())
//! # }
//! ```

pub mod model;
pub mod schema;

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;
use url::Url;

pub use model::{
    Components, HttpMethod, Info, MediaType, OpenApiDocument, Operation, Parameter,
    ParameterLocation, ParameterOrRef, PathItem, RequestBody, Response, SecurityRequirement,
    SecuritySchemeSpec, Server, ServerVariable,
};
pub use schema::{AdditionalProperties, SchemaNode, SchemaType, TypeDecl};

use crate::Error;

static SERVER_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("server variable pattern is valid"));

/// A loaded OpenAPI document
#[derive(Debug, Clone)]
pub struct OpenApiContext {
    document: OpenApiDocument,
}

impl OpenApiContext {
    /// Wrap an already parsed document
    pub fn new(document: OpenApiDocument) -> Self {
        Self { document }
    }

    /// Load a document from a file or URL (supports both YAML and JSON)
    pub async fn from_file_or_url<P: AsRef<str>>(location: P) -> crate::Result<Self> {
        let location = location.as_ref();

        if location.starts_with("http://") || location.starts_with("https://") {
            return Self::from_url(location).await;
        }

        Self::from_file(location).await
    }

    /// Load a document from a file (supports both YAML and JSON)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        Self::parse_content(&content).map_err(|e| {
            Error::openapi(format!(
                "Failed to parse OpenAPI spec at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load a document from a URL (supports both YAML and JSON)
    pub async fn from_url(url: &str) -> crate::Result<Self> {
        let response = reqwest::get(url).await.map_err(|e| {
            Error::openapi(format!("Failed to fetch OpenAPI spec from {}: {}", url, e))
        })?;

        if !response.status().is_success() {
            return Err(Error::openapi(format!(
                "Failed to fetch OpenAPI spec from {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let content = response.text().await.map_err(|e| {
            Error::openapi(format!("Failed to read response from {}: {}", url, e))
        })?;

        Self::parse_content(&content).map_err(|e| {
            Error::openapi(format!("Failed to parse OpenAPI spec from {}: {}", url, e))
        })
    }

    /// Parse content as JSON when it looks like a JSON object, YAML otherwise
    pub fn parse_content(content: &str) -> crate::Result<Self> {
        let document = if content.trim_start().starts_with('{') {
            serde_json::from_str(content)?
        } else {
            serde_yaml::from_str(content)?
        };
        Ok(Self { document })
    }

    /// The typed document
    pub fn document(&self) -> &OpenApiDocument {
        &self.document
    }

    /// Get the title of the API
    pub fn title(&self) -> &str {
        &self.document.info.title
    }

    /// Get the version of the API
    pub fn version(&self) -> &str {
        &self.document.info.version
    }

    /// Resolve the base URL clients should talk to.
    ///
    /// The first server's URL template has each `{variable}` replaced by its
    /// declared default. A relative result is joined onto `base_url` when one
    /// is given; an absolute result must parse as a URL.
    pub fn server_url(&self, base_url: Option<&Url>) -> crate::Result<Option<String>> {
        let Some(server) = self.document.servers.first() else {
            return Ok(base_url.map(Url::to_string));
        };

        let mut missing = None;
        let expanded = SERVER_VARIABLE.replace_all(&server.url, |caps: &regex::Captures<'_>| {
            match server.variables.get(&caps[1]) {
                Some(variable) => variable.default.clone(),
                None => {
                    missing.get_or_insert_with(|| caps[1].to_string());
                    caps[0].to_string()
                }
            }
        });
        if let Some(name) = missing {
            return Err(Error::openapi(format!(
                "server URL '{}' uses undeclared variable '{}'",
                server.url, name
            )));
        }

        if expanded.starts_with("http://") || expanded.starts_with("https://") {
            let parsed = Url::parse(&expanded).map_err(|e| {
                Error::openapi(format!("Invalid server URL '{}': {}", expanded, e))
            })?;
            return Ok(Some(parsed.to_string()));
        }

        match base_url {
            Some(base) => {
                let trimmed = base.as_str().trim_end_matches('/');
                Ok(Some(format!("{}{}", trimmed, expanded)))
            }
            None => {
                log::warn!(
                    "server URL '{}' is relative and no base URL was configured",
                    expanded
                );
                Ok(Some(expanded.into_owned()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_from_file() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("openapi_async.json");
        let json_content = r#"
        {
            "openapi": "3.0.0",
            "info": {
                "title": "Test API Async",
                "version": "2.0.0"
            },
            "servers": [
                {
                    "url": "https://api.example.com/v2"
                }
            ],
            "paths": {}
        }
        "#;
        tokio::fs::write(&file_path, json_content).await?;

        let spec = OpenApiContext::from_file(&file_path).await?;
        assert_eq!(spec.title(), "Test API Async");
        assert_eq!(spec.version(), "2.0.0");
        assert_eq!(
            spec.server_url(None)?,
            Some("https://api.example.com/v2".to_string())
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_from_file_yaml() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("openapi.yaml");
        let yaml_content = "openapi: 3.0.0\ninfo:\n  title: Yaml API\n  version: 1.0.0\npaths:\n  /pets:\n    get:\n      responses:\n        '200':\n          description: ok\n";
        tokio::fs::write(&file_path, yaml_content).await?;

        let spec = OpenApiContext::from_file(&file_path).await?;
        assert_eq!(spec.title(), "Yaml API");
        assert!(spec.document().paths["/pets"].get.is_some());
        Ok(())
    }

    #[test]
    fn test_parse_content_reports_json_errors() {
        let err = OpenApiContext::parse_content("{ not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_server_url_substitutes_variables() -> crate::Result<()> {
        let spec = OpenApiContext::parse_content(
            r#"{
                "servers": [{
                    "url": "https://{region}.example.com/{version}",
                    "variables": {
                        "region": {"default": "eu", "enum": ["eu", "us"]},
                        "version": {"default": "v3"}
                    }
                }],
                "paths": {}
            }"#,
        )?;
        assert_eq!(
            spec.server_url(None)?,
            Some("https://eu.example.com/v3".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_server_url_undeclared_variable() -> crate::Result<()> {
        let spec = OpenApiContext::parse_content(
            r#"{"servers": [{"url": "https://{tenant}.example.com"}], "paths": {}}"#,
        )?;
        assert!(matches!(spec.server_url(None), Err(Error::OpenApi(m)) if m.contains("tenant")));
        Ok(())
    }

    #[test]
    fn test_server_url_relative_joins_base() -> crate::Result<()> {
        let spec = OpenApiContext::parse_content(r#"{"servers": [{"url": "/api/v1"}], "paths": {}}"#)?;
        let base = Url::parse("https://example.com/").unwrap();
        assert_eq!(
            spec.server_url(Some(&base))?,
            Some("https://example.com/api/v1".to_string())
        );
        Ok(())
    }
}
