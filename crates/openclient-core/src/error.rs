//! Error handling for the openclient code generation library.
//!
//! This module defines the main error type `Error` used throughout the generator,
//! along with a convenient `Result` type alias. It uses `thiserror` for easy
//! error handling and implements conversions from common error types.
//!
//! Generation errors are fatal for the unit being generated. Use
//! [`Error::within`] to attach the identifier of the schema, operation or unit
//! that was being processed when the error surfaced.
//!
//! # Examples
//!
//! ```
//! use openclient_core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::MissingTypeName { context: "inline object".into() }.within("schema 'Pet'"))
//! }
//!
//! assert!(might_fail().unwrap_err().to_string().contains("schema 'Pet'"));
//! ```

use thiserror::Error;

/// Result type for openclient generation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for openclient generation operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Template engine error
    #[error("Template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// OpenAPI document error
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A local `$ref` names a schema that was never registered
    #[error("unknown reference '{reference}'")]
    UnknownReference { reference: String },

    /// A `$ref` that is not of the form `#/components/<section>/<name>`
    #[error("unsupported reference '{reference}': only local component references are supported")]
    UnsupportedReference { reference: String },

    /// An array schema without `items`
    #[error("array schema without 'items' in {context}")]
    MissingArrayItemSchema { context: String },

    /// An inline object with properties but neither a title nor a default name
    #[error("cannot name inline object type in {context}: no title and no default name")]
    MissingTypeName { context: String },

    /// A security scheme lacking a field its type requires
    #[error("malformed security scheme '{scheme}': {reason}")]
    MalformedSecurityScheme { scheme: String, reason: String },

    /// A schema name registered twice
    #[error("schema '{0}' is registered more than once")]
    DuplicateSchema(String),

    /// Two operations resolving to the same identifier
    #[error("duplicate operation id '{0}'")]
    DuplicateOperation(String),

    /// A response key that is neither `default` nor three characters of `[0-9x]`
    #[error("invalid status code pattern '{0}'")]
    InvalidStatusPattern(String),

    /// An error raised while generating a specific unit
    #[error("{unit}: {source}")]
    Unit {
        unit: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new OpenAPI error
    pub fn openapi<S: Into<String>>(msg: S) -> Self {
        Self::OpenApi(msg.into())
    }

    /// Attach the identifier of the unit being generated.
    ///
    /// Nested calls keep the innermost unit closest to the cause, so the
    /// message reads outermost first: `service 'pets': operation 'listPets': ...`.
    pub fn within<S: Into<String>>(self, unit: S) -> Self {
        Self::Unit {
            unit: unit.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any unit annotations.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Unit { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Config(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Config(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_prefixes_unit() {
        let err = Error::UnknownReference {
            reference: "#/components/schemas/Missing".into(),
        }
        .within("operation 'getPet'")
        .within("service 'pets'");

        assert_eq!(
            err.to_string(),
            "service 'pets': operation 'getPet': unknown reference '#/components/schemas/Missing'"
        );
        assert!(matches!(
            err.root_cause(),
            Error::UnknownReference { reference } if reference.ends_with("Missing")
        ));
    }

    #[test]
    fn test_from_str_is_config_error() {
        let err: Error = "bad flag".into();
        assert!(matches!(err, Error::Config(ref m) if m == "bad flag"));
    }
}
