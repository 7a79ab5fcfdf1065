//! Authentication schemes to credential configurators.
//!
//! HTTP `basic` and `bearer` schemes and `apiKey` schemes in a header or the
//! query string are supported. Everything else is reported and skipped.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::codegen::emitter::unique_ident;
use crate::openapi::SecuritySchemeSpec;
use crate::runtime::ApiKeyLocation;
use crate::utils::to_rust_ident;
use crate::{Error, Result};

/// What a generated configurator takes and how it applies it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityConfigurator {
    /// Username and password, sent as `Authorization: Basic base64(user:pass)`
    Basic,
    /// Token, sent as `Authorization: Bearer <token>`
    Bearer,
    /// Key sent under `parameter` in a header or query string
    ApiKey {
        location: ApiKeyLocation,
        parameter: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledScheme {
    /// Scheme name as declared
    pub name: String,
    /// Name of the generated configurator function
    pub fn_name: String,
    pub description: Option<String>,
    pub configurator: SecurityConfigurator,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityCompiler;

impl SecurityCompiler {
    /// Compile every supported scheme, in declaration order
    pub fn compile(schemes: &IndexMap<String, SecuritySchemeSpec>) -> Result<Vec<CompiledScheme>> {
        let mut fn_names = HashSet::new();
        let mut compiled = Vec::new();
        for (name, spec) in schemes {
            if let Some(configurator) = Self::configurator(name, spec)? {
                compiled.push(CompiledScheme {
                    name: name.clone(),
                    fn_name: unique_ident(
                        &mut fn_names,
                        &to_rust_ident(&format!("configure_{name}")),
                    ),
                    description: spec.description.clone(),
                    configurator,
                });
            }
        }
        Ok(compiled)
    }

    /// The configurator for one scheme; `None` when the scheme is unsupported
    pub fn configurator(name: &str, spec: &SecuritySchemeSpec) -> Result<Option<SecurityConfigurator>> {
        let malformed = |reason: &str| Error::MalformedSecurityScheme {
            scheme: name.to_string(),
            reason: reason.to_string(),
        };

        match spec.scheme_type.as_str() {
            "http" => {
                let scheme = spec
                    .scheme
                    .as_deref()
                    .ok_or_else(|| malformed("http scheme without 'scheme'"))?;
                match scheme.to_ascii_lowercase().as_str() {
                    "basic" => Ok(Some(SecurityConfigurator::Basic)),
                    "bearer" => Ok(Some(SecurityConfigurator::Bearer)),
                    other => {
                        log::warn!(
                            "Security scheme '{}' uses unsupported http scheme '{}'; no configurator generated",
                            name,
                            other
                        );
                        Ok(None)
                    }
                }
            }
            "apiKey" => {
                let location = spec
                    .location
                    .as_deref()
                    .ok_or_else(|| malformed("apiKey scheme without 'in'"))?;
                let parameter = spec
                    .name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| malformed("apiKey scheme without 'name'"))?;
                let location = match location {
                    "header" => ApiKeyLocation::Header,
                    "query" => ApiKeyLocation::Query,
                    "cookie" => {
                        log::warn!(
                            "Security scheme '{}' sends its key in a cookie, which is unsupported; no configurator generated",
                            name
                        );
                        return Ok(None);
                    }
                    other => return Err(malformed(&format!("unknown apiKey location '{other}'"))),
                };
                Ok(Some(SecurityConfigurator::ApiKey {
                    location,
                    parameter,
                }))
            }
            other => {
                log::warn!(
                    "Security scheme '{}' has unsupported type '{}'; no configurator generated",
                    name,
                    other
                );
                Ok(None)
            }
        }
    }
}
