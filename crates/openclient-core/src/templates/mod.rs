//! Template system for the generated crate.
//!
//! Templates are embedded in the library and rendered with Tera from the
//! contexts produced by [`crate::builders`].

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tera::{Context, Tera};

use crate::error::Result;

const TEMPLATES: &[(&str, &str)] = &[
    ("macros.rs", include_str!("../../templates/macros.rs.tera")),
    ("model.rs", include_str!("../../templates/model.rs.tera")),
    ("service.rs", include_str!("../../templates/service.rs.tera")),
    ("security.rs", include_str!("../../templates/security.rs.tera")),
    ("lib.rs", include_str!("../../templates/lib.rs.tera")),
    ("models_mod.rs", include_str!("../../templates/models_mod.rs.tera")),
    ("services_mod.rs", include_str!("../../templates/services_mod.rs.tera")),
    ("Cargo.toml", include_str!("../../templates/Cargo.toml.tera")),
];

/// The kinds of unit the generator writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitTemplate {
    Model,
    Service,
    Security,
    Lib,
    ModelsIndex,
    ServicesIndex,
    Manifest,
}

impl UnitTemplate {
    /// Name of the template in the Tera instance
    pub fn name(&self) -> &'static str {
        match self {
            Self::Model => "model.rs",
            Self::Service => "service.rs",
            Self::Security => "security.rs",
            Self::Lib => "lib.rs",
            Self::ModelsIndex => "models_mod.rs",
            Self::ServicesIndex => "services_mod.rs",
            Self::Manifest => "Cargo.toml",
        }
    }
}

/// Renders output units from the embedded templates
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    /// Cached Tera template engine instance
    tera: Arc<Tera>,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    pub fn render(&self, template: UnitTemplate, context: &JsonValue) -> Result<String> {
        log::debug!("Rendering template '{}'", template.name());
        let context = Context::from_value(context.clone())?;
        Ok(self.tera.render(template.name(), &context)?)
    }
}
