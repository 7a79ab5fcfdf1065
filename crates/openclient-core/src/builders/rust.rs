//! Rust-specific context builder.
//!
//! Declarations are flattened into a list of items: structs and aliases,
//! with `enter`/`leave` markers around the child module holding a
//! declaration's inline types. Each item carries its indentation so the
//! templates stay free of recursion.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value as JsonValue;

use super::{ContextBuilder, CrateSummary};
use crate::codegen::emitter::unique_ident;
use crate::codegen::{
    CompiledOperation, CompiledResponse, CompiledScheme, CompiledService, Declaration,
    FieldDecl, ModuleRef, PrimitiveKind, SecurityConfigurator, TypeDescriptor,
};
use crate::runtime::{QueryStyle, StatusPattern};
use crate::utils::{doc_lines, to_rust_ident, to_upper_camel_case};

const INDENT: &str = "    ";

/// Prelude types generated code names, with the paths used when a
/// declaration in the unit shadows them
const PRELUDE_TYPES: &[(&str, &str)] = &[
    ("Box", "::std::boxed::Box"),
    ("Option", "::std::option::Option"),
    ("String", "::std::string::String"),
    ("Vec", "::std::vec::Vec"),
];

/// How one output unit spells type names.
///
/// A registered schema is written by its imported name, unless a type
/// declared anywhere in the unit has the same name. Then the schema is
/// written as `crate::models::X` and not imported. A schema named like a
/// prelude type is never imported either, and a prelude type shadowed by a
/// declaration is written by its `std` path.
#[derive(Debug, Clone, Default)]
pub struct UnitNames {
    declared: HashSet<String>,
    qualified: HashSet<String>,
}

impl UnitNames {
    /// Names of a unit holding `declarations` plus the `extra` types its
    /// template adds, and importing `imports`. `owner` is the schema a model
    /// unit is named after, which is in scope without an import.
    pub fn new<'a>(
        declarations: impl IntoIterator<Item = &'a Declaration>,
        extra: impl IntoIterator<Item = String>,
        imports: &[String],
        owner: Option<&str>,
    ) -> Self {
        let mut declared: HashSet<String> = extra.into_iter().collect();
        let mut nested = HashSet::new();
        for decl in declarations {
            declared.insert(decl.name().to_string());
            nested_names(decl.inner(), &mut nested);
        }
        declared.extend(nested.iter().cloned());

        let mut qualified: HashSet<String> = imports
            .iter()
            .filter(|name| declared.contains(*name) || prelude_path(name).is_some())
            .cloned()
            .collect();
        if let Some(owner) = owner.filter(|owner| nested.contains(*owner)) {
            qualified.insert(owner.to_string());
        }
        Self {
            declared,
            qualified,
        }
    }

    /// Whether the schema `name` is written as `crate::models::name`
    pub fn is_qualified(&self, name: &str) -> bool {
        self.qualified.contains(name)
    }

    /// The entries of `imports` that are written by their bare name
    pub fn imports(&self, imports: &[String]) -> Vec<String> {
        imports
            .iter()
            .filter(|name| !self.is_qualified(name))
            .cloned()
            .collect()
    }

    fn prelude(&self, name: &'static str) -> &'static str {
        match prelude_path(name) {
            Some(path) if self.declared.contains(name) => path,
            _ => name,
        }
    }
}

fn prelude_path(name: &str) -> Option<&'static str> {
    PRELUDE_TYPES
        .iter()
        .find(|(prelude, _)| *prelude == name)
        .map(|(_, path)| *path)
}

fn nested_names(decls: &[Declaration], names: &mut HashSet<String>) {
    for decl in decls {
        names.insert(decl.name().to_string());
        nested_names(decl.inner(), names);
    }
}

/// Rust type for `ty`, as spelled in the unit described by `names`
pub fn rust_type(ty: &TypeDescriptor, names: &UnitNames) -> String {
    match ty {
        TypeDescriptor::Primitive(PrimitiveKind::String) => names.prelude("String").to_string(),
        TypeDescriptor::Primitive(kind) => primitive(*kind).to_string(),
        TypeDescriptor::NamedReference {
            module: ModuleRef::Models,
            name,
        } => {
            if names.is_qualified(name) {
                format!("crate::models::{name}")
            } else {
                name.clone()
            }
        }
        TypeDescriptor::NamedReference {
            module: ModuleRef::Local(module),
            name,
        } => {
            if module.is_empty() {
                name.clone()
            } else {
                format!("{module}::{name}")
            }
        }
        TypeDescriptor::Array(element) => {
            format!("{}<{}>", names.prelude("Vec"), rust_type(element, names))
        }
        TypeDescriptor::Map(value) => format!(
            "::std::collections::HashMap<{}, {}>",
            names.prelude("String"),
            rust_type(value, names)
        ),
        TypeDescriptor::Freeform => "::serde_json::Value".to_string(),
        TypeDescriptor::Unrepresentable => "()".to_string(),
    }
}

fn primitive(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Int32 => "i32",
        PrimitiveKind::Int64 => "i64",
        PrimitiveKind::Float32 => "f32",
        PrimitiveKind::Float64 => "f64",
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::String => "String",
    }
}

/// A string literal for `value`
fn literal(value: &str) -> String {
    format!("{value:?}")
}

/// `ident` without a raw-identifier prefix, for building derived names
fn bare(ident: &str) -> &str {
    ident.trim_start_matches("r#")
}

/// Rust-specific field info
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RustField {
    pub name: String,
    pub wire_literal: String,
    /// Whether the field needs `#[serde(rename)]`
    pub renamed: bool,
    pub rust_type: String,
    pub optional: bool,
    /// `skip_serializing_if` predicate literal for optional fields
    pub skip_if: String,
    pub docs: Vec<String>,
}

/// One entry of a flattened declaration list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RustItem {
    Struct {
        indent: String,
        /// Indentation of the struct's fields
        field_indent: String,
        name: String,
        docs: Vec<String>,
        fields: Vec<RustField>,
    },
    Alias {
        indent: String,
        name: String,
        docs: Vec<String>,
        target: String,
    },
    /// Opens the child module holding inline types
    Enter { indent: String, module: String },
    Leave { indent: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RustModelContext {
    pub schema_name: String,
    pub imports: Vec<String>,
    pub items: Vec<RustItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RustParameterContext {
    pub field: String,
    pub wire_literal: String,
    pub location: &'static str,
    /// `QueryStyle` expression, used for query parameters
    pub style: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RustBodyContext {
    pub content_type: String,
    pub rust_type: String,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RustResponseContext {
    pub key: String,
    pub variant: String,
    /// `StatusPattern` expression
    pub pattern: String,
    /// Payload type; `None` for a response without content
    pub rust_type: Option<String>,
    pub content_type: Option<String>,
}

// Rust-specific context for one operation
#[derive(Debug, Clone, Serialize)]
pub struct RustOperationContext {
    pub id: String,
    pub fn_name: String,
    pub with_fn: String,
    pub dispatcher_fn: String,
    pub outcome: String,
    pub docs: Vec<String>,
    pub deprecated: bool,
    /// `Method` variant
    pub method: String,
    pub http_method: String,
    pub path: String,
    pub path_literal: String,
    /// Parameter list after `client`, with a leading comma
    pub signature: String,
    /// Argument list after `client`, with a leading comma
    pub arguments: String,
    pub parameters: Vec<RustParameterContext>,
    pub body: Option<RustBodyContext>,
    pub responses: Vec<RustResponseContext>,
    pub requires_auth: bool,
    /// Whether the request is modified after creation
    pub mutates: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RustServiceContext {
    pub module_name: String,
    pub path_root: String,
    pub runtime_crate: String,
    pub imports: Vec<String>,
    pub items: Vec<RustItem>,
    pub operations: Vec<RustOperationContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RustSchemeContext {
    pub name: String,
    pub fn_name: String,
    pub docs: Vec<String>,
    pub arguments: String,
    pub credentials: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RustSecurityContext {
    pub runtime_crate: String,
    pub schemes: Vec<RustSchemeContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RustCrateContext {
    #[serde(flatten)]
    pub summary: CrateSummary,
    pub runtime_crate: String,
    pub core_version: String,
    pub description_docs: Vec<String>,
    /// Manifest description
    pub description_literal: String,
    pub base_url_literal: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RustContextBuilder {
    runtime_crate: String,
}

impl RustContextBuilder {
    /// `runtime_crate` is the path generated units import runtime items from
    pub fn new(runtime_crate: impl Into<String>) -> Self {
        Self {
            runtime_crate: runtime_crate.into(),
        }
    }

    /// Flatten `decl` and its inline types, innermost modules last
    pub fn items(&self, decl: &Declaration, names: &UnitNames) -> Vec<RustItem> {
        let mut items = Vec::new();
        flatten(decl, 0, names, &mut items);
        items
    }

    fn operation(&self, op: &CompiledOperation, names: &UnitNames) -> RustOperationContext {
        let descriptor = &op.descriptor;
        let fn_name = to_rust_ident(&descriptor.id);
        let outcome = outcome_name(&descriptor.id);

        let mut signature = String::new();
        let mut arguments = String::new();
        if let Some(params_type) = &op.params_type {
            signature.push_str(&format!(", params: &{params_type}"));
            arguments.push_str(", params");
        }
        let body = op.body.as_ref().map(|body| {
            let ty = rust_type(&body.ty, names);
            if body.required {
                signature.push_str(&format!(", body: &{ty}"));
            } else {
                signature.push_str(&format!(", body: {}<&{ty}>", names.prelude("Option")));
            }
            arguments.push_str(", body");
            RustBodyContext {
                content_type: literal(&body.content_type),
                rust_type: ty,
                required: body.required,
            }
        });

        let parameters: Vec<_> = op
            .parameters
            .iter()
            .map(|p| RustParameterContext {
                field: p.field_name.clone(),
                wire_literal: literal(&p.wire_name),
                location: p.location.as_str(),
                style: query_style(p.style),
            })
            .collect();

        let mut variants = HashSet::new();
        let responses = op
            .responses
            .iter()
            .map(|response| self.response(response, &mut variants, names))
            .collect();

        let mut docs = Vec::new();
        for text in [&descriptor.summary, &descriptor.description].into_iter().flatten() {
            if !docs.is_empty() {
                docs.push(String::new());
            }
            docs.extend(doc_lines(text));
        }
        if !docs.is_empty() {
            docs.push(String::new());
        }
        docs.push(format!("`{} {}`", descriptor.method, descriptor.path));

        let requires_auth = descriptor.requires_auth();
        RustOperationContext {
            id: descriptor.id.clone(),
            with_fn: format!("{}_with", bare(&fn_name)),
            dispatcher_fn: format!("{}_dispatcher", bare(&fn_name)),
            fn_name,
            outcome,
            docs,
            deprecated: descriptor.deprecated,
            method: format!("{:?}", descriptor.method),
            http_method: descriptor.method.to_string(),
            path: descriptor.path.clone(),
            path_literal: literal(&descriptor.path),
            signature,
            arguments,
            mutates: !parameters.is_empty() || body.is_some() || requires_auth,
            parameters,
            body,
            responses,
            requires_auth,
        }
    }

    fn response(
        &self,
        response: &CompiledResponse,
        variants: &mut HashSet<String>,
        names: &UnitNames,
    ) -> RustResponseContext {
        let base = match response.pattern {
            StatusPattern::Default => "Default".to_string(),
            StatusPattern::Range { .. } => {
                to_upper_camel_case(&format!("status_{}", response.key.to_ascii_lowercase()))
            }
        };
        let pattern = match response.pattern {
            StatusPattern::Range { min, max } if min == max => {
                format!("rt::StatusPattern::exact({min})")
            }
            StatusPattern::Range { min, max } => {
                format!("rt::StatusPattern::Range {{ min: {min}, max: {max} }}")
            }
            StatusPattern::Default => "rt::StatusPattern::Default".to_string(),
        };
        let rust_type = match &response.ty {
            TypeDescriptor::Unrepresentable => None,
            ty => Some(rust_type(ty, names)),
        };
        RustResponseContext {
            key: response.key.clone(),
            variant: unique_ident(variants, &base),
            pattern,
            rust_type,
            content_type: response.content_type.as_deref().map(literal),
        }
    }

    fn scheme(&self, scheme: &CompiledScheme) -> RustSchemeContext {
        let (arguments, credentials, summary) = match &scheme.configurator {
            SecurityConfigurator::Basic => (
                "username: impl Into<String>, password: impl Into<String>".to_string(),
                "Credentials::basic(username, password)".to_string(),
                "HTTP Basic credentials",
            ),
            SecurityConfigurator::Bearer => (
                "token: impl Into<String>".to_string(),
                "Credentials::bearer(token)".to_string(),
                "a bearer token",
            ),
            SecurityConfigurator::ApiKey {
                location,
                parameter,
            } => (
                "key: impl Into<String>".to_string(),
                format!(
                    "Credentials::api_key(ApiKeyLocation::{location:?}, {}, key)",
                    literal(parameter)
                ),
                "an API key",
            ),
        };

        let mut docs = vec![format!("Authenticate with {summary} (`{}`).", scheme.name)];
        if let Some(description) = &scheme.description {
            docs.push(String::new());
            docs.extend(doc_lines(description));
        }
        RustSchemeContext {
            name: scheme.name.clone(),
            fn_name: scheme.fn_name.clone(),
            docs,
            arguments,
            credentials,
        }
    }
}

impl ContextBuilder for RustContextBuilder {
    fn model(&self, decl: &Declaration, imports: &[String]) -> crate::Result<JsonValue> {
        let names = UnitNames::new([decl], std::iter::empty(), imports, Some(decl.name()));
        report_shadowed(&format!("Model '{}'", decl.name()), imports, &names);

        let context = RustModelContext {
            schema_name: decl.name().to_string(),
            imports: names.imports(imports),
            items: self.items(decl, &names),
        };
        Ok(serde_json::to_value(&context)?)
    }

    fn service(&self, service: &CompiledService) -> crate::Result<JsonValue> {
        let outcomes = service
            .operations
            .iter()
            .map(|op| outcome_name(&op.descriptor.id));
        let names = UnitNames::new(&service.declarations, outcomes, &service.imports, None);
        report_shadowed(
            &format!("Service '{}'", service.module_name),
            &service.imports,
            &names,
        );

        let items = service
            .declarations
            .iter()
            .flat_map(|decl| self.items(decl, &names))
            .collect();
        let operations = service
            .operations
            .iter()
            .map(|op| self.operation(op, &names))
            .collect();

        let context = RustServiceContext {
            module_name: service.module_name.clone(),
            path_root: service.path_root.clone(),
            runtime_crate: self.runtime_crate.clone(),
            imports: names.imports(&service.imports),
            items,
            operations,
        };
        Ok(serde_json::to_value(&context)?)
    }

    fn security(&self, schemes: &[CompiledScheme]) -> crate::Result<JsonValue> {
        let context = RustSecurityContext {
            runtime_crate: self.runtime_crate.clone(),
            schemes: schemes.iter().map(|s| self.scheme(s)).collect(),
        };
        Ok(serde_json::to_value(&context)?)
    }

    fn crate_root(&self, summary: &CrateSummary) -> crate::Result<JsonValue> {
        let context = RustCrateContext {
            summary: summary.clone(),
            runtime_crate: self.runtime_crate.clone(),
            core_version: env!("CARGO_PKG_VERSION").to_string(),
            description_docs: summary
                .description
                .as_deref()
                .map(doc_lines)
                .unwrap_or_default(),
            description_literal: literal(&format!("Client for {}", summary.title)),
            base_url_literal: summary.base_url.as_deref().map(literal),
        };
        Ok(serde_json::to_value(&context)?)
    }
}

fn outcome_name(operation_id: &str) -> String {
    format!("{}Outcome", crate::utils::to_rust_type_name(operation_id))
}

fn report_shadowed(unit: &str, imports: &[String], names: &UnitNames) {
    for name in imports.iter().filter(|name| names.is_qualified(name)) {
        log::warn!(
            "{} has a name clash with schema '{}'; referring to the schema by path",
            unit,
            name
        );
    }
}

fn query_style(style: QueryStyle) -> String {
    match style {
        QueryStyle::Form { explode } => format!("rt::QueryStyle::Form {{ explode: {explode} }}"),
        QueryStyle::DeepObject => "rt::QueryStyle::DeepObject".to_string(),
    }
}

fn flatten(decl: &Declaration, depth: usize, names: &UnitNames, items: &mut Vec<RustItem>) {
    let indent = INDENT.repeat(depth);
    match decl {
        Declaration::Struct(s) => items.push(RustItem::Struct {
            indent: indent.clone(),
            field_indent: INDENT.repeat(depth + 1),
            name: s.name.clone(),
            docs: s.description.as_deref().map(doc_lines).unwrap_or_default(),
            fields: s.fields.iter().map(|f| field(f, names)).collect(),
        }),
        Declaration::Alias(a) => items.push(RustItem::Alias {
            indent: indent.clone(),
            name: a.name.clone(),
            docs: a.description.as_deref().map(doc_lines).unwrap_or_default(),
            target: rust_type(&a.target, names),
        }),
    }

    let inner = decl.inner();
    if inner.is_empty() {
        return;
    }
    items.push(RustItem::Enter {
        indent: indent.clone(),
        module: crate::utils::to_module_name(decl.name()),
    });
    for child in inner {
        flatten(child, depth + 1, names, items);
    }
    items.push(RustItem::Leave { indent });
}

fn field(field: &FieldDecl, names: &UnitNames) -> RustField {
    let mut rust_type = rust_type(&field.ty, names);
    if field.boxed {
        rust_type = format!("{}<{rust_type}>", names.prelude("Box"));
    }
    if field.is_optional() {
        rust_type = format!("{}<{rust_type}>", names.prelude("Option"));
    }

    let mut docs = field.description.as_deref().map(doc_lines).unwrap_or_default();
    for (i, note) in field.notes.iter().enumerate() {
        if i == 0 && !docs.is_empty() {
            docs.push(String::new());
        }
        docs.push(note.clone());
    }
    if field.deprecated {
        if !docs.is_empty() {
            docs.push(String::new());
        }
        docs.push("Deprecated.".to_string());
    }

    RustField {
        renamed: bare(&field.field_name) != field.wire_name,
        name: field.field_name.clone(),
        wire_literal: literal(&field.wire_name),
        rust_type,
        optional: field.is_optional(),
        skip_if: literal(&format!("{}::is_none", names.prelude("Option"))),
        docs,
    }
}
