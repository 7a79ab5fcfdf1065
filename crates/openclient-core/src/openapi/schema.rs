//! JSON-Schema-like type definitions as they appear in an OpenAPI document.
//!
//! Only the structural keywords drive type inference. Validation keywords are
//! carried so they can be rendered as documentation; they are never evaluated.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Primitive schema types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    Integer,
    String,
}

/// The `type` keyword: a single type, or the OpenAPI 3.1 list form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeDecl {
    Single(SchemaType),
    Multiple(Vec<SchemaType>),
}

/// `additionalProperties` when present in the document.
///
/// Absence is modelled as `Option::None` on [`SchemaNode`], because an absent
/// keyword and a literal `true` name objects differently.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(from = "RawAdditionalProperties", into = "RawAdditionalProperties")]
pub enum AdditionalProperties {
    /// Literal `true`: any extra member is allowed
    Open,
    /// Literal `false`: no extra members
    Closed,
    /// Extra members must match this schema
    Typed(Box<SchemaNode>),
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(untagged)]
enum RawAdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaNode>),
}

impl From<RawAdditionalProperties> for AdditionalProperties {
    fn from(raw: RawAdditionalProperties) -> Self {
        match raw {
            RawAdditionalProperties::Bool(true) => Self::Open,
            RawAdditionalProperties::Bool(false) => Self::Closed,
            RawAdditionalProperties::Schema(schema) => Self::Typed(schema),
        }
    }
}

impl From<AdditionalProperties> for RawAdditionalProperties {
    fn from(value: AdditionalProperties) -> Self {
        match value {
            AdditionalProperties::Open => Self::Bool(true),
            AdditionalProperties::Closed => Self::Bool(false),
            AdditionalProperties::Typed(schema) => Self::Schema(schema),
        }
    }
}

/// One schema node.
///
/// Exactly one of `$ref`, `type`, the composition keywords, or none of them
/// drives resolution; `$ref` wins over everything else when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_decl: Option<TypeDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,

    /// Declaration order is preserved for output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaNode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaNode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaNode>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    // --- Descriptive metadata, passed through to documentation ---
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<JsonValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl SchemaNode {
    /// A node of the given primitive type, mostly useful in tests.
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            type_decl: Some(TypeDecl::Single(schema_type)),
            ..Self::default()
        }
    }

    /// A `$ref` node pointing at a component schema.
    pub fn reference_to(name: &str) -> Self {
        Self {
            reference: Some(format!("#/components/schemas/{name}")),
            ..Self::default()
        }
    }

    /// The type driving resolution.
    ///
    /// For the list form, the single non-null member is the type. A list with
    /// several non-null members has no single type.
    pub fn primary_type(&self) -> Option<SchemaType> {
        match self.type_decl.as_ref()? {
            TypeDecl::Single(t) => Some(*t),
            TypeDecl::Multiple(types) => {
                let mut non_null = types.iter().filter(|t| **t != SchemaType::Null);
                match (non_null.next(), non_null.next()) {
                    (Some(t), None) => Some(*t),
                    (None, None) if !types.is_empty() => Some(SchemaType::Null),
                    _ => None,
                }
            }
        }
    }

    /// Whether the node admits `null`, via `nullable` or a `null` type member.
    pub fn is_nullable(&self) -> bool {
        self.nullable
            || matches!(
                &self.type_decl,
                Some(TypeDecl::Multiple(types)) if types.contains(&SchemaType::Null)
            )
    }

    /// Whether `name` is listed in this object's `required` set.
    pub fn requires(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Validation keywords rendered as human-readable notes.
    pub fn constraint_notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if let Some(format) = &self.format {
            notes.push(format!("Format: `{format}`"));
        }
        if let Some(pattern) = &self.pattern {
            notes.push(format!("Pattern: `{pattern}`"));
        }
        if let Some(min) = self.min_length {
            notes.push(format!("Minimum length: {min}"));
        }
        if let Some(max) = self.max_length {
            notes.push(format!("Maximum length: {max}"));
        }
        if let Some(min) = self.minimum {
            notes.push(format!("Minimum: {min}"));
        }
        if let Some(max) = self.maximum {
            notes.push(format!("Maximum: {max}"));
        }
        if let Some(step) = self.multiple_of {
            notes.push(format!("Multiple of: {step}"));
        }
        if let Some(values) = &self.enum_values {
            let rendered: Vec<String> = values.iter().map(JsonValue::to_string).collect();
            notes.push(format!("Allowed values: {}", rendered.join(", ")));
        }
        if let Some(default) = &self.default {
            notes.push(format!("Default: {default}"));
        }
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: JsonValue) -> SchemaNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_additional_properties_tri_state() {
        let open = parse(json!({"type": "object", "additionalProperties": true}));
        assert_eq!(open.additional_properties, Some(AdditionalProperties::Open));

        let closed = parse(json!({"type": "object", "additionalProperties": false}));
        assert_eq!(closed.additional_properties, Some(AdditionalProperties::Closed));

        let typed = parse(json!({"type": "object", "additionalProperties": {"type": "string"}}));
        assert_eq!(
            typed.additional_properties,
            Some(AdditionalProperties::Typed(Box::new(SchemaNode::of_type(
                SchemaType::String
            ))))
        );

        let absent = parse(json!({"type": "object"}));
        assert_eq!(absent.additional_properties, None);
    }

    #[test]
    fn test_properties_keep_declaration_order() {
        let node = parse(json!({
            "type": "object",
            "properties": {"zeta": {"type": "string"}, "alpha": {"type": "string"}, "mid": {"type": "string"}}
        }));
        let names: Vec<_> = node.properties.unwrap().keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_type_list_form() {
        let node = parse(json!({"type": ["string", "null"]}));
        assert_eq!(node.primary_type(), Some(SchemaType::String));
        assert!(node.is_nullable());

        let ambiguous = parse(json!({"type": ["string", "integer"]}));
        assert_eq!(ambiguous.primary_type(), None);

        let null_only = parse(json!({"type": "null"}));
        assert_eq!(null_only.primary_type(), Some(SchemaType::Null));
    }

    #[test]
    fn test_reference_field() {
        let node = parse(json!({"$ref": "#/components/schemas/Pet", "type": "string"}));
        assert_eq!(node.reference.as_deref(), Some("#/components/schemas/Pet"));
    }

    #[test]
    fn test_constraint_notes() {
        let node = parse(json!({"type": "string", "pattern": "^a+$", "minLength": 2, "enum": ["a", "aa"]}));
        assert_eq!(
            node.constraint_notes(),
            vec![
                "Pattern: `^a+$`".to_string(),
                "Minimum length: 2".to_string(),
                "Allowed values: \"a\", \"aa\"".to_string(),
            ]
        );
    }
}
