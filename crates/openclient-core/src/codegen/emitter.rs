//! Materialization of anonymous types.
//!
//! [`InnerTypeEmitter`] follows the same rules as the resolver but also
//! produces a declaration for every inline object it names. Naming is scoped:
//! each object boundary opens a fresh [`NamingScope`] for its own properties,
//! while arrays, maps and single-member `anyOf` share the caller's scope. Only
//! same-level siblings can therefore collide, and when they do the second one
//! reuses the first declaration instead of emitting another.

use std::collections::HashSet;

use crate::codegen::registry::{NamedSchema, SchemaRegistry};
use crate::codegen::resolver::{
    describe, object_shape, object_type_name, ObjectShape, SchemaTypeResolver,
};
use crate::codegen::types::{AliasDecl, Declaration, FieldDecl, ModuleRef, StructDecl, TypeDescriptor};
use crate::openapi::{SchemaNode, SchemaType};
use crate::utils::{to_module_name, to_rust_ident, to_rust_type_name};
use crate::{Error, Result};

/// Names already emitted at one nesting level
#[derive(Debug, Clone, Default)]
pub struct NamingScope {
    /// Module holding this level's declarations, relative to the enclosing one
    module: String,
    names: HashSet<String>,
}

impl NamingScope {
    /// The outermost scope of an output unit
    pub fn root() -> Self {
        Self::default()
    }

    /// The scope for the members of the type `owner`
    pub fn for_type(owner: &str) -> Self {
        Self {
            module: to_module_name(owner),
            names: HashSet::new(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Claim `name`; false when it was already taken
    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    fn module_ref(&self) -> ModuleRef {
        ModuleRef::Local(self.module.clone())
    }
}

/// Declarations produced for one schema node, plus its resolved type
#[derive(Debug, Clone, PartialEq)]
pub struct Emitted {
    pub declarations: Vec<Declaration>,
    pub ty: TypeDescriptor,
}

impl Emitted {
    fn bare(ty: TypeDescriptor) -> Self {
        Self {
            declarations: Vec::new(),
            ty,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InnerTypeEmitter<'a> {
    resolver: SchemaTypeResolver<'a>,
}

impl<'a> InnerTypeEmitter<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            resolver: SchemaTypeResolver::new(registry),
        }
    }

    pub fn resolver(&self) -> &SchemaTypeResolver<'a> {
        &self.resolver
    }

    /// Resolve `node` within `scope`, emitting declarations for any inline
    /// object types it introduces.
    pub fn emit(
        &self,
        node: &SchemaNode,
        scope: &mut NamingScope,
        default_name: Option<&str>,
    ) -> Result<Emitted> {
        if node.reference.is_some() {
            return Ok(Emitted::bare(self.resolver.resolve_in(
                node,
                default_name,
                &scope.module_ref(),
            )?));
        }

        match node.primary_type() {
            Some(SchemaType::Array) => {
                let items = node.items.as_deref().ok_or_else(|| Error::MissingArrayItemSchema {
                    context: describe(node, default_name),
                })?;
                let element = self.emit(items, scope, default_name)?;
                Ok(Emitted {
                    declarations: element.declarations,
                    ty: TypeDescriptor::array(element.ty),
                })
            }
            Some(SchemaType::Object) => match object_shape(node) {
                ObjectShape::Named => {
                    let name = object_type_name(node, default_name).ok_or_else(|| {
                        Error::MissingTypeName {
                            context: describe(node, default_name),
                        }
                    })?;
                    let ty = TypeDescriptor::named(scope.module_ref(), name.clone());
                    if !scope.insert(&name) {
                        log::debug!(
                            "Type '{}' already emitted in this scope; reusing it",
                            name
                        );
                        return Ok(Emitted::bare(ty));
                    }
                    let decl = self.emit_struct(node, &name)?;
                    Ok(Emitted {
                        declarations: vec![Declaration::Struct(decl)],
                        ty,
                    })
                }
                ObjectShape::Map(value) => {
                    let value = self.emit(value, scope, default_name)?;
                    Ok(Emitted {
                        declarations: value.declarations,
                        ty: TypeDescriptor::map(value.ty),
                    })
                }
                ObjectShape::Freeform => Ok(Emitted::bare(TypeDescriptor::Freeform)),
            },
            Some(SchemaType::Null) | None => match node.any_of.as_slice() {
                [only] => self.emit(only, scope, default_name),
                _ => Ok(Emitted::bare(self.resolver.resolve_in(
                    node,
                    default_name,
                    &scope.module_ref(),
                )?)),
            },
            Some(_) => Ok(Emitted::bare(self.resolver.resolve_in(
                node,
                default_name,
                &scope.module_ref(),
            )?)),
        }
    }

    /// Build the struct for an object with properties.
    ///
    /// The struct's members get their own scope, so nested anonymous types
    /// never collide with types named outside it.
    pub fn emit_struct(&self, node: &SchemaNode, name: &str) -> Result<StructDecl> {
        let mut scope = NamingScope::for_type(name);
        let mut field_names = HashSet::new();
        let mut fields = Vec::new();
        let mut inner = Vec::new();

        for (key, property) in node.properties.iter().flatten() {
            let default_name = to_rust_type_name(key);
            let emitted = self
                .emit(property, &mut scope, Some(&default_name))
                .map_err(|e| e.within(format!("property '{key}' of '{name}'")))?;
            inner.extend(emitted.declarations);
            fields.push(FieldDecl {
                wire_name: key.clone(),
                field_name: unique_ident(&mut field_names, &to_rust_ident(key)),
                ty: emitted.ty,
                required: node.requires(key),
                nullable: property.is_nullable(),
                description: property.description.clone(),
                notes: property.constraint_notes(),
                deprecated: property.deprecated,
                boxed: false,
            });
        }

        Ok(StructDecl {
            name: name.to_string(),
            description: node.description.clone(),
            fields,
            inner,
        })
    }

    /// Declaration for a registered schema, named after its registry key.
    ///
    /// Objects with properties become structs; every other shape becomes an
    /// alias whose inline types live in the alias' own module.
    pub fn emit_named(&self, named: &NamedSchema) -> Result<Declaration> {
        let node = &named.node;
        let name = &named.target_type_name;

        let is_struct = node.reference.is_none()
            && node.primary_type() == Some(SchemaType::Object)
            && object_shape(node) == ObjectShape::Named;
        if is_struct {
            return Ok(Declaration::Struct(self.emit_struct(node, name)?));
        }

        let mut scope = NamingScope::for_type(name);
        let element_name = format!("{name}Item");
        let emitted = self.emit(node, &mut scope, Some(&element_name))?;
        Ok(Declaration::Alias(AliasDecl {
            name: name.clone(),
            description: node.description.clone(),
            target: emitted.ty,
            inner: emitted.declarations,
        }))
    }
}

/// `base`, or `base` with the smallest numeric suffix not yet in `taken`
pub(crate) fn unique_ident(taken: &mut HashSet<String>, base: &str) -> String {
    let mut candidate = base.to_string();
    let mut counter = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{}_{}", base.trim_start_matches("r#"), counter);
        counter += 1;
    }
    candidate
}
