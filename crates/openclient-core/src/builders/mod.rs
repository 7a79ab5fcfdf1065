//! Context builder traits and adapters for language-specific output.
//!
//! A builder turns compiled declarations, services and schemes into the JSON
//! contexts the templates in [`crate::templates`] render.
pub mod rust;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::codegen::{CompiledScheme, CompiledService, Declaration};

pub use rust::RustContextBuilder;

/// Trait for converting compiled units into a language-specific context.
pub trait ContextBuilder {
    /// Context for the unit declaring one registered schema
    fn model(&self, decl: &Declaration, imports: &[String]) -> crate::Result<JsonValue>;

    /// Context for one service unit
    fn service(&self, service: &CompiledService) -> crate::Result<JsonValue>;

    /// Context for the security configuration unit
    fn security(&self, schemes: &[CompiledScheme]) -> crate::Result<JsonValue>;

    /// Context for the crate-level units: root, module indexes and manifest
    fn crate_root(&self, summary: &CrateSummary) -> crate::Result<JsonValue>;
}

/// One registered schema as listed by the models index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelEntry {
    pub module: String,
    pub name: String,
}

/// Document-wide facts for the crate-level units
#[derive(Debug, Clone, Serialize)]
pub struct CrateSummary {
    pub package_name: String,
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    /// Resolved server URL, if the document declares one
    pub base_url: Option<String>,
    pub models: Vec<ModelEntry>,
    /// Service module names, in grouping order
    pub services: Vec<String>,
}
