//! Registry of top-level named schemas.
//!
//! The registry is filled in a first full pass over `components.schemas`
//! before anything resolves a reference, so forward, backward and cyclic
//! references all succeed. It stores the unexpanded schema nodes and derived
//! names only; a reference always resolves to a name, never to an expansion.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::openapi::{OpenApiDocument, SchemaNode};
use crate::utils::{to_module_name, to_rust_type_name};
use crate::{Error, Result};

/// Prefix of every supported schema reference
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// A registered top-level schema. Immutable once registered.
#[derive(Debug, Clone)]
pub struct NamedSchema {
    /// Registry key, as written in the document
    pub name: String,
    pub node: SchemaNode,
    /// Name of the generated type
    pub target_type_name: String,
    /// Name of the generated module holding the type
    pub target_module: String,
}

/// Write-once, then read-only lookup of named schemas
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, NamedSchema>,
    /// Generated type name -> registry key, to catch names that collide after case normalization
    type_names: HashMap<String, String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every schema in `components.schemas`, in declaration order
    pub fn from_document(document: &OpenApiDocument) -> Result<Self> {
        let mut registry = Self::new();
        for (name, node) in &document.components.schemas {
            registry.register(name, node.clone())?;
        }
        log::debug!("Registered {} named schemas", registry.len());
        Ok(registry)
    }

    /// Store `node` under `name`. Each name may be registered exactly once.
    pub fn register(&mut self, name: &str, node: SchemaNode) -> Result<&NamedSchema> {
        if self.schemas.contains_key(name) {
            return Err(Error::DuplicateSchema(name.to_string()));
        }
        let target_type_name = to_rust_type_name(name);
        if let Some(existing) = self.type_names.get(&target_type_name) {
            return Err(Error::DuplicateSchema(format!(
                "{name} (type name {target_type_name} already used by '{existing}')"
            )));
        }
        self.type_names
            .insert(target_type_name.clone(), name.to_string());

        let named = NamedSchema {
            name: name.to_string(),
            node,
            target_module: to_module_name(&target_type_name),
            target_type_name,
        };
        let entry = self.schemas.entry(name.to_string()).or_insert(named);
        Ok(entry)
    }

    /// Resolve a `$ref` string to its registered schema.
    ///
    /// Anything other than `#/components/schemas/<name>` is an
    /// [`Error::UnsupportedReference`]; a well-formed reference to a name that
    /// was never registered is an [`Error::UnknownReference`].
    pub fn resolve(&self, reference: &str) -> Result<&NamedSchema> {
        let name = parse_schema_reference(reference)?;
        self.schemas
            .get(name.as_str())
            .ok_or_else(|| Error::UnknownReference {
                reference: reference.to_string(),
            })
    }

    /// Look a schema up by registry key
    pub fn get(&self, name: &str) -> Option<&NamedSchema> {
        self.schemas.get(name)
    }

    /// Registered schemas in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &NamedSchema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Extract the schema name from a local reference, undoing JSON-pointer escapes
pub fn parse_schema_reference(reference: &str) -> Result<String> {
    local_component_name(reference, SCHEMA_REF_PREFIX)
}

/// Extract the component name from `#/components/<section>/<name>` given the section prefix
pub(crate) fn local_component_name(reference: &str, prefix: &str) -> Result<String> {
    let unsupported = || Error::UnsupportedReference {
        reference: reference.to_string(),
    };
    let raw = reference.strip_prefix(prefix).ok_or_else(unsupported)?;
    if raw.is_empty() || raw.contains('/') {
        return Err(unsupported());
    }
    Ok(raw.replace("~1", "/").replace("~0", "~"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::SchemaType;

    #[test]
    fn test_register_and_resolve() -> Result<()> {
        let mut registry = SchemaRegistry::new();
        registry.register("pet_owner", SchemaNode::of_type(SchemaType::Object))?;

        let named = registry.resolve("#/components/schemas/pet_owner")?;
        assert_eq!(named.name, "pet_owner");
        assert_eq!(named.target_type_name, "PetOwner");
        assert_eq!(named.target_module, "pet_owner");
        Ok(())
    }

    #[test]
    fn test_register_twice_fails() -> Result<()> {
        let mut registry = SchemaRegistry::new();
        registry.register("Pet", SchemaNode::default())?;
        assert!(matches!(
            registry.register("Pet", SchemaNode::default()),
            Err(Error::DuplicateSchema(name)) if name == "Pet"
        ));
        assert!(matches!(
            registry.register("pet", SchemaNode::default()),
            Err(Error::DuplicateSchema(_))
        ));
        Ok(())
    }

    #[test]
    fn test_unknown_reference() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.resolve("#/components/schemas/Ghost"),
            Err(Error::UnknownReference { reference }) if reference.ends_with("Ghost")
        ));
    }

    #[test]
    fn test_unsupported_references_fail_fast() {
        let registry = SchemaRegistry::new();
        for reference in [
            "https://example.com/schemas.json#/Pet",
            "other.yaml#/components/schemas/Pet",
            "#/components/parameters/Limit",
            "#/components/schemas/Pet/properties/name",
            "#/components/schemas/",
        ] {
            assert!(
                matches!(
                    registry.resolve(reference),
                    Err(Error::UnsupportedReference { .. })
                ),
                "{reference} should be unsupported"
            );
        }
    }

    #[test]
    fn test_pointer_escapes() -> Result<()> {
        assert_eq!(
            parse_schema_reference("#/components/schemas/a~1b~0c")?,
            "a/b~c"
        );
        Ok(())
    }

    #[test]
    fn test_cyclic_schemas_register_without_expansion() -> Result<()> {
        let document: OpenApiDocument = serde_json::from_value(serde_json::json!({
            "paths": {},
            "components": {"schemas": {
                "A": {"type": "object", "properties": {"b": {"$ref": "#/components/schemas/B"}}},
                "B": {"type": "object", "properties": {"a": {"$ref": "#/components/schemas/A"}}}
            }}
        }))?;
        let registry = SchemaRegistry::from_document(&document)?;
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("#/components/schemas/A")?.target_type_name, "A");
        assert_eq!(registry.resolve("#/components/schemas/B")?.target_type_name, "B");
        Ok(())
    }
}
