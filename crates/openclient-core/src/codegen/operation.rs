//! From HTTP operations to typed callable units.
//!
//! [`OperationDescriptor::from_document`] flattens the document's paths into
//! one read-only descriptor per path and method. [`OperationCompiler`] then
//! types each descriptor: a parameter struct, an optional body type, and one
//! response type per declared status pattern.
//!
//! Where the document offers several content types for a body or response,
//! the first declared one is used and the rest are ignored.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::codegen::emitter::{unique_ident, InnerTypeEmitter, NamingScope};
use crate::codegen::registry::{local_component_name, SchemaRegistry};
use crate::codegen::types::{Declaration, FieldDecl, StructDecl, TypeDescriptor};
use crate::openapi::{
    Components, HttpMethod, OpenApiDocument, Operation, Parameter, ParameterLocation,
    ParameterOrRef, PathItem, SchemaNode, SchemaType, SecurityRequirement,
};
use crate::runtime::{QueryStyle, StatusPattern};
use crate::utils::{to_rust_ident, to_rust_type_name, to_snake_case, to_upper_camel_case};
use crate::{Error, Result};

/// Prefix of every supported parameter reference
pub const PARAMETER_REF_PREFIX: &str = "#/components/parameters/";

/// One parameter after `$ref` resolution and path-level merging
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub location: ParameterLocation,
    pub schema: Option<SchemaNode>,
    /// Always true for path parameters
    pub required: bool,
    pub description: Option<String>,
    pub deprecated: bool,
    pub style: QueryStyle,
}

impl ParameterDescriptor {
    fn from_parameter(parameter: &Parameter) -> Self {
        let style = if parameter.is_deep_object() {
            QueryStyle::DeepObject
        } else {
            QueryStyle::Form {
                explode: parameter.explode.unwrap_or(true),
            }
        };
        Self {
            name: parameter.name.clone(),
            location: parameter.location,
            schema: parameter.schema.clone(),
            required: parameter.required || parameter.location == ParameterLocation::Path,
            description: parameter.description.clone(),
            deprecated: parameter.deprecated,
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyDescriptor {
    pub required: bool,
    pub description: Option<String>,
    /// Content type to schema, in declaration order
    pub content: IndexMap<String, SchemaNode>,
}

/// Everything the compiler needs to know about one operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub id: String,
    pub method: HttpMethod,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    pub parameters: Vec<ParameterDescriptor>,
    pub request_body: Option<BodyDescriptor>,
    /// Status pattern to (content type to schema), both in declaration order
    pub responses: IndexMap<String, IndexMap<String, SchemaNode>>,
    /// Operation-level security, overriding the document default when set
    pub security_override: Option<Vec<SecurityRequirement>>,
}

impl OperationDescriptor {
    /// Every operation in the document, in path then method-slot order.
    ///
    /// Two operations whose identifiers normalize to the same function name
    /// are a [`Error::DuplicateOperation`].
    pub fn from_document(document: &OpenApiDocument) -> Result<Vec<Self>> {
        let mut seen = HashSet::new();
        let mut operations = Vec::new();
        for (path, item) in &document.paths {
            for (method, operation) in item.operations() {
                let descriptor = Self::derive(path, method, item, operation, &document.components)
                    .map_err(|e| e.within(format!("operation '{method} {path}'")))?;
                if !seen.insert(to_snake_case(&descriptor.id)) {
                    return Err(Error::DuplicateOperation(descriptor.id));
                }
                operations.push(descriptor);
            }
        }
        log::debug!("Collected {} operations", operations.len());
        Ok(operations)
    }

    fn derive(
        path: &str,
        method: HttpMethod,
        item: &PathItem,
        operation: &Operation,
        components: &Components,
    ) -> Result<Self> {
        // Operation-level parameters replace path-level ones with the same name and location
        let mut parameters: Vec<ParameterDescriptor> = Vec::new();
        for entry in item.parameters.iter().chain(&operation.parameters) {
            let parameter = ParameterDescriptor::from_parameter(resolve_parameter(entry, components)?);
            match parameters
                .iter_mut()
                .find(|p| p.name == parameter.name && p.location == parameter.location)
            {
                Some(existing) => *existing = parameter,
                None => parameters.push(parameter),
            }
        }

        let request_body = operation.request_body.as_ref().map(|body| BodyDescriptor {
            required: body.required,
            description: body.description.clone(),
            content: body
                .content
                .iter()
                .map(|(ct, media)| (ct.clone(), media.schema.clone().unwrap_or_default()))
                .collect(),
        });

        let responses = operation
            .responses
            .iter()
            .map(|(pattern, response)| {
                let content = response
                    .content
                    .iter()
                    .map(|(ct, media)| (ct.clone(), media.schema.clone().unwrap_or_default()))
                    .collect();
                (pattern.clone(), content)
            })
            .collect();

        Ok(Self {
            id: operation
                .operation_id
                .clone()
                .unwrap_or_else(|| derive_operation_id(method, path)),
            method,
            path: path.to_string(),
            summary: operation.summary.clone(),
            description: operation.description.clone(),
            deprecated: operation.deprecated,
            parameters,
            request_body,
            responses,
            security_override: operation.security.clone(),
        })
    }

    /// False only when the operation explicitly opts out with `security: []`
    pub fn requires_auth(&self) -> bool {
        !matches!(&self.security_override, Some(requirements) if requirements.is_empty())
    }

    /// Schemas the compiled operation depends on: parameter schemas and the
    /// first content type of the body and of each response
    pub fn schema_nodes(&self) -> Vec<&SchemaNode> {
        let parameters = self.parameters.iter().filter_map(|p| p.schema.as_ref());
        let body = self
            .request_body
            .iter()
            .filter_map(|b| b.content.values().next());
        let responses = self
            .responses
            .values()
            .filter_map(|content| content.values().next());
        parameters.chain(body).chain(responses).collect()
    }
}

/// Identifier for an operation without `operationId`: `get /pets/{id}` becomes `get_pets_id`
pub fn derive_operation_id(method: HttpMethod, path: &str) -> String {
    to_snake_case(&format!("{} {}", method.as_str().to_ascii_lowercase(), path))
}

fn resolve_parameter<'a>(entry: &'a ParameterOrRef, components: &'a Components) -> Result<&'a Parameter> {
    match entry {
        ParameterOrRef::Item(parameter) => Ok(parameter),
        ParameterOrRef::Reference { reference } => {
            let name = local_component_name(reference, PARAMETER_REF_PREFIX)?;
            components
                .parameters
                .get(&name)
                .ok_or_else(|| Error::UnknownReference {
                    reference: reference.clone(),
                })
        }
    }
}

/// A parameter as the generated call site uses it
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledParameter {
    pub wire_name: String,
    pub field_name: String,
    pub location: ParameterLocation,
    pub style: QueryStyle,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBody {
    pub content_type: String,
    pub ty: TypeDescriptor,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledResponse {
    /// Response key as declared, such as `4xx`
    pub key: String,
    pub pattern: StatusPattern,
    /// `None` for a response without content
    pub content_type: Option<String>,
    /// [`TypeDescriptor::Unrepresentable`] for a response without content
    pub ty: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledOperation {
    pub descriptor: OperationDescriptor,
    /// Name of the parameter struct, when the operation has parameters
    pub params_type: Option<String>,
    pub parameters: Vec<CompiledParameter>,
    pub body: Option<CompiledBody>,
    /// One entry per declared status pattern, in declaration order
    pub responses: Vec<CompiledResponse>,
    /// Parameter struct and inline body and response types
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, Copy)]
pub struct OperationCompiler<'a> {
    emitter: InnerTypeEmitter<'a>,
}

impl<'a> OperationCompiler<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            emitter: InnerTypeEmitter::new(registry),
        }
    }

    /// Type one operation. Named types go into `scope`, which the caller
    /// shares between all operations of one output unit.
    pub fn compile(&self, op: &OperationDescriptor, scope: &mut NamingScope) -> Result<CompiledOperation> {
        self.compile_inner(op, scope)
            .map_err(|e| e.within(format!("operation '{}'", op.id)))
    }

    fn compile_inner(&self, op: &OperationDescriptor, scope: &mut NamingScope) -> Result<CompiledOperation> {
        let base_name = to_rust_type_name(&op.id);
        let mut declarations = Vec::new();

        let (params_type, parameters) = if op.parameters.is_empty() {
            (None, Vec::new())
        } else {
            let name = format!("{base_name}Params");
            let (decl, parameters) = self.params_struct(op, &name)?;
            if scope.insert(&name) {
                declarations.push(Declaration::Struct(decl));
            } else {
                log::warn!("Type '{}' already emitted in this unit; reusing it", name);
            }
            (Some(name), parameters)
        };

        let body = match &op.request_body {
            Some(body) => match first_content(&op.id, "request body", &body.content) {
                Some((content_type, schema)) => {
                    let default_name = format!("{base_name}Body");
                    let emitted = self.emitter.emit(schema, scope, Some(&default_name))?;
                    declarations.extend(emitted.declarations);
                    Some(CompiledBody {
                        content_type: content_type.clone(),
                        ty: emitted.ty,
                        required: body.required,
                    })
                }
                None => None,
            },
            None => None,
        };

        let mut responses = Vec::new();
        for (key, content) in &op.responses {
            let pattern: StatusPattern = key.parse()?;
            let label = format!("response '{key}'");
            let (content_type, ty) = match first_content(&op.id, &label, content) {
                Some((content_type, schema)) => {
                    let default_name = format!(
                        "{base_name}Response{}",
                        to_upper_camel_case(&key.to_ascii_lowercase())
                    );
                    let emitted = self
                        .emitter
                        .emit(schema, scope, Some(&default_name))
                        .map_err(|e| e.within(label.clone()))?;
                    declarations.extend(emitted.declarations);
                    (Some(content_type.clone()), emitted.ty)
                }
                None => (None, TypeDescriptor::Unrepresentable),
            };
            responses.push(CompiledResponse {
                key: key.clone(),
                pattern,
                content_type,
                ty,
            });
        }

        Ok(CompiledOperation {
            descriptor: op.clone(),
            params_type,
            parameters,
            body,
            responses,
            declarations,
        })
    }

    /// The parameter struct: one field per parameter, in a scope of its own
    fn params_struct(
        &self,
        op: &OperationDescriptor,
        name: &str,
    ) -> Result<(StructDecl, Vec<CompiledParameter>)> {
        let mut scope = NamingScope::for_type(name);
        let mut taken = HashSet::new();
        let mut fields = Vec::new();
        let mut inner = Vec::new();
        let mut parameters = Vec::new();

        for parameter in &op.parameters {
            let emitted = match &parameter.schema {
                Some(schema) => self
                    .emitter
                    .emit(schema, &mut scope, Some(&to_rust_type_name(&parameter.name)))
                    .map_err(|e| e.within(format!("parameter '{}'", parameter.name)))?,
                None => self.emitter.emit(
                    &SchemaNode::of_type(SchemaType::String),
                    &mut scope,
                    None,
                )?,
            };
            inner.extend(emitted.declarations);

            let field_name = unique_ident(&mut taken, &to_rust_ident(&parameter.name));
            let schema = parameter.schema.as_ref();
            fields.push(FieldDecl {
                wire_name: parameter.name.clone(),
                field_name: field_name.clone(),
                ty: emitted.ty,
                required: parameter.required,
                nullable: schema.map_or(false, SchemaNode::is_nullable),
                description: parameter.description.clone(),
                notes: schema.map(SchemaNode::constraint_notes).unwrap_or_default(),
                deprecated: parameter.deprecated,
                boxed: false,
            });
            parameters.push(CompiledParameter {
                wire_name: parameter.name.clone(),
                field_name,
                location: parameter.location,
                style: parameter.style,
                required: parameter.required,
            });
        }

        let decl = StructDecl {
            name: name.to_string(),
            description: Some(format!("Parameters of `{}`", op.id)),
            fields,
            inner,
        };
        Ok((decl, parameters))
    }
}

/// The first declared content entry; later ones are reported and ignored
fn first_content<'c>(
    operation: &str,
    what: &str,
    content: &'c IndexMap<String, SchemaNode>,
) -> Option<(&'c String, &'c SchemaNode)> {
    if content.len() > 1 {
        log::warn!(
            "Operation '{}' declares {} content types for its {}; using '{}'",
            operation,
            content.len(),
            what,
            content.keys().next().map(String::as_str).unwrap_or_default()
        );
    }
    content.first()
}
