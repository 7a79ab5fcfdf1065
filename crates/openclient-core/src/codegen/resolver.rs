//! Type inference for a single schema node.
//!
//! Precedence, first match wins:
//!
//! 1. `$ref` resolves through the registry; sibling keywords are ignored.
//! 2. `integer`, `number`, `boolean`, `string` map through the fixed format table.
//! 3. `array` resolves its `items`.
//! 4. `object` becomes a named type, a map, or a freeform value.
//! 5. `anyOf` with exactly one member resolves that member.
//! 6. Anything else is freeform. This step never fails.
//!
//! Single-member `anyOf` is a deliberate weakening of unions to one concrete
//! type. Wider unions, `oneOf` and `allOf` are not modelled and degrade to a
//! freeform value.

use crate::codegen::registry::SchemaRegistry;
use crate::codegen::types::{ModuleRef, PrimitiveKind, TypeDescriptor};
use crate::openapi::{AdditionalProperties, SchemaNode, SchemaType};
use crate::utils::to_rust_type_name;
use crate::{Error, Result};

/// Map an integer `format` to its primitive kind
pub fn integer_kind(format: Option<&str>) -> PrimitiveKind {
    match format {
        Some("int64") | Some("unix-time") => PrimitiveKind::Int64,
        _ => PrimitiveKind::Int32,
    }
}

/// Map a number `format` to its primitive kind
pub fn number_kind(format: Option<&str>) -> PrimitiveKind {
    match format {
        Some("double") => PrimitiveKind::Float64,
        _ => PrimitiveKind::Float32,
    }
}

/// Shape of an object schema, as far as type inference is concerned
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectShape<'a> {
    /// Properties with `additionalProperties` absent or `false`
    Named,
    /// No properties, `additionalProperties` is a schema
    Map(&'a SchemaNode),
    /// Anything without a fixed shape
    Freeform,
}

/// Classify an object schema
pub fn object_shape(node: &SchemaNode) -> ObjectShape<'_> {
    match (&node.properties, &node.additional_properties) {
        (Some(_), None | Some(AdditionalProperties::Closed)) => ObjectShape::Named,
        (None, Some(AdditionalProperties::Typed(value))) => ObjectShape::Map(value),
        _ => ObjectShape::Freeform,
    }
}

/// The name an object type gets: its title when present, else the default
pub fn object_type_name(node: &SchemaNode, default_name: Option<&str>) -> Option<String> {
    node.title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .or(default_name)
        .map(to_rust_type_name)
        .filter(|name| !name.is_empty())
}

/// Maps schema nodes to [`TypeDescriptor`]s against a populated registry
#[derive(Debug, Clone, Copy)]
pub struct SchemaTypeResolver<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> SchemaTypeResolver<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    /// Resolve `node`, naming inline objects in the current module
    pub fn resolve(&self, node: &SchemaNode, default_name: Option<&str>) -> Result<TypeDescriptor> {
        self.resolve_in(node, default_name, &ModuleRef::current())
    }

    /// Resolve `node`, naming inline objects as members of `module`
    pub fn resolve_in(
        &self,
        node: &SchemaNode,
        default_name: Option<&str>,
        module: &ModuleRef,
    ) -> Result<TypeDescriptor> {
        if let Some(reference) = &node.reference {
            return self.resolve_reference(reference);
        }

        match node.primary_type() {
            Some(SchemaType::Integer) => {
                return Ok(TypeDescriptor::Primitive(integer_kind(node.format.as_deref())))
            }
            Some(SchemaType::Number) => {
                return Ok(TypeDescriptor::Primitive(number_kind(node.format.as_deref())))
            }
            Some(SchemaType::Boolean) => return Ok(TypeDescriptor::Primitive(PrimitiveKind::Bool)),
            Some(SchemaType::String) => {
                return Ok(TypeDescriptor::Primitive(PrimitiveKind::String))
            }
            Some(SchemaType::Array) => {
                let items = node.items.as_deref().ok_or_else(|| Error::MissingArrayItemSchema {
                    context: describe(node, default_name),
                })?;
                return Ok(TypeDescriptor::array(
                    self.resolve_in(items, default_name, module)?,
                ));
            }
            Some(SchemaType::Object) => {
                return match object_shape(node) {
                    ObjectShape::Named => {
                        let name = object_type_name(node, default_name).ok_or_else(|| {
                            Error::MissingTypeName {
                                context: describe(node, default_name),
                            }
                        })?;
                        Ok(TypeDescriptor::named(module.clone(), name))
                    }
                    ObjectShape::Map(value) => Ok(TypeDescriptor::map(
                        self.resolve_in(value, default_name, module)?,
                    )),
                    ObjectShape::Freeform => Ok(TypeDescriptor::Freeform),
                };
            }
            Some(SchemaType::Null) | None => {}
        }

        if let [only] = node.any_of.as_slice() {
            return self.resolve_in(only, default_name, module);
        }
        if node.any_of.len() > 1 {
            log::warn!(
                "anyOf with {} members in {} is not modelled; using a freeform value",
                node.any_of.len(),
                describe(node, default_name)
            );
        }

        Ok(TypeDescriptor::Freeform)
    }

    /// A reference always becomes a name, never an expansion
    pub fn resolve_reference(&self, reference: &str) -> Result<TypeDescriptor> {
        let named = self.registry.resolve(reference)?;
        Ok(TypeDescriptor::named(
            ModuleRef::Models,
            named.target_type_name.clone(),
        ))
    }
}

/// A short description of a node for diagnostics
pub(crate) fn describe(node: &SchemaNode, default_name: Option<&str>) -> String {
    match (node.title.as_deref(), default_name) {
        (Some(title), _) => format!("schema titled '{title}'"),
        (None, Some(name)) => format!("schema '{name}'"),
        (None, None) => "anonymous schema".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: serde_json::Value) -> SchemaNode {
        serde_json::from_value(value).unwrap()
    }

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register("Pet", node(json!({"type": "object", "properties": {"id": {"type": "integer"}}})))
            .unwrap();
        registry
    }

    #[test]
    fn test_numeric_format_table() -> Result<()> {
        let registry = SchemaRegistry::new();
        let resolver = SchemaTypeResolver::new(&registry);
        let cases = [
            (json!({"type": "integer"}), PrimitiveKind::Int32),
            (json!({"type": "integer", "format": "int32"}), PrimitiveKind::Int32),
            (json!({"type": "integer", "format": "int64"}), PrimitiveKind::Int64),
            (json!({"type": "integer", "format": "unix-time"}), PrimitiveKind::Int64),
            (json!({"type": "integer", "format": "uint8"}), PrimitiveKind::Int32),
            (json!({"type": "number"}), PrimitiveKind::Float32),
            (json!({"type": "number", "format": "float"}), PrimitiveKind::Float32),
            (json!({"type": "number", "format": "double"}), PrimitiveKind::Float64),
            (json!({"type": "boolean"}), PrimitiveKind::Bool),
            (json!({"type": "string", "format": "date-time"}), PrimitiveKind::String),
        ];
        for (schema, expected) in cases {
            assert_eq!(
                resolver.resolve(&node(schema.clone()), None)?,
                TypeDescriptor::Primitive(expected),
                "{schema}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_reference_ignores_siblings() -> Result<()> {
        let registry = registry();
        let resolver = SchemaTypeResolver::new(&registry);
        let expected = TypeDescriptor::named(ModuleRef::Models, "Pet");

        let plain = node(json!({"$ref": "#/components/schemas/Pet"}));
        assert_eq!(resolver.resolve(&plain, None)?, expected);

        for sibling_type in ["string", "array", "object", "integer"] {
            let mutated = node(json!({
                "$ref": "#/components/schemas/Pet",
                "type": sibling_type,
                "title": "Other",
                "properties": {"x": {"type": "string"}}
            }));
            assert_eq!(resolver.resolve(&mutated, Some("Fallback"))?, expected);
        }
        Ok(())
    }

    #[test]
    fn test_array_requires_items() {
        let registry = SchemaRegistry::new();
        let resolver = SchemaTypeResolver::new(&registry);
        let err = resolver
            .resolve(&node(json!({"type": "array"})), Some("Tags"))
            .unwrap_err();
        assert!(matches!(err, Error::MissingArrayItemSchema { context } if context.contains("Tags")));
    }

    #[test]
    fn test_array_of_references() -> Result<()> {
        let registry = registry();
        let resolver = SchemaTypeResolver::new(&registry);
        let resolved = resolver.resolve(
            &node(json!({"type": "array", "items": {"$ref": "#/components/schemas/Pet"}})),
            None,
        )?;
        assert_eq!(
            resolved,
            TypeDescriptor::array(TypeDescriptor::named(ModuleRef::Models, "Pet"))
        );
        Ok(())
    }

    #[test]
    fn test_object_shapes() -> Result<()> {
        let registry = SchemaRegistry::new();
        let resolver = SchemaTypeResolver::new(&registry);

        assert_eq!(
            resolver.resolve(&node(json!({"type": "object"})), None)?,
            TypeDescriptor::Freeform
        );
        assert_eq!(
            resolver.resolve(&node(json!({"type": "object", "additionalProperties": false})), None)?,
            TypeDescriptor::Freeform
        );
        assert_eq!(
            resolver.resolve(&node(json!({"type": "object", "additionalProperties": true})), None)?,
            TypeDescriptor::Freeform
        );
        assert_eq!(
            resolver.resolve(
                &node(json!({"type": "object", "additionalProperties": {"type": "integer", "format": "int64"}})),
                None
            )?,
            TypeDescriptor::map(TypeDescriptor::Primitive(PrimitiveKind::Int64))
        );
        Ok(())
    }

    #[test]
    fn test_object_naming() -> Result<()> {
        let registry = SchemaRegistry::new();
        let resolver = SchemaTypeResolver::new(&registry);
        let titled = node(json!({"type": "object", "title": "pet owner", "properties": {"a": {"type": "string"}}}));
        assert_eq!(
            resolver.resolve(&titled, Some("Ignored"))?,
            TypeDescriptor::named(ModuleRef::current(), "PetOwner")
        );

        let untitled = node(json!({"type": "object", "properties": {"a": {"type": "string"}}, "additionalProperties": false}));
        assert_eq!(
            resolver.resolve(&untitled, Some("listPetsBody"))?,
            TypeDescriptor::named(ModuleRef::current(), "ListPetsBody")
        );

        assert!(matches!(
            resolver.resolve(&untitled, None),
            Err(Error::MissingTypeName { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_any_of() -> Result<()> {
        let registry = registry();
        let resolver = SchemaTypeResolver::new(&registry);
        let single = node(json!({"anyOf": [{"$ref": "#/components/schemas/Pet"}]}));
        assert_eq!(
            resolver.resolve(&single, None)?,
            TypeDescriptor::named(ModuleRef::Models, "Pet")
        );

        let union = node(json!({"anyOf": [{"type": "string"}, {"type": "integer"}]}));
        assert_eq!(resolver.resolve(&union, None)?, TypeDescriptor::Freeform);
        Ok(())
    }

    #[test]
    fn test_unmatched_shapes_are_freeform() -> Result<()> {
        let registry = SchemaRegistry::new();
        let resolver = SchemaTypeResolver::new(&registry);
        for schema in [
            json!({}),
            json!({"type": "null"}),
            json!({"oneOf": [{"type": "string"}]}),
            json!({"allOf": [{"type": "string"}]}),
            json!({"description": "anything"}),
        ] {
            assert_eq!(resolver.resolve(&node(schema), None)?, TypeDescriptor::Freeform);
        }
        Ok(())
    }

    #[test]
    fn test_resolution_is_idempotent() -> Result<()> {
        let registry = registry();
        let resolver = SchemaTypeResolver::new(&registry);
        let schema = node(json!({
            "type": "array",
            "items": {"type": "object", "properties": {"pet": {"$ref": "#/components/schemas/Pet"}}}
        }));
        let first = resolver.resolve(&schema, Some("Entry"))?;
        let second = resolver.resolve(&schema, Some("Entry"))?;
        assert_eq!(first, second);
        Ok(())
    }
}
