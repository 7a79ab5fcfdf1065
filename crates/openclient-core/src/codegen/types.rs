//! Target-language-neutral type descriptors and declarations.
//!
//! The resolver and emitters produce these; the builders in
//! [`crate::builders`] turn them into source text.

use serde::Serialize;

/// Width-specific primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PrimitiveKind {
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    Bool,
    String,
}

/// Where a named type lives, relative to the unit referencing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ModuleRef {
    /// The shared models module holding every registered schema
    Models,
    /// A module path relative to the referencing declaration's parent module;
    /// empty for a type declared alongside it
    Local(String),
}

impl ModuleRef {
    /// The module of the declaration being referenced from
    pub fn current() -> Self {
        Self::Local(String::new())
    }
}

/// Resolved output of type inference.
///
/// Produced fresh per call and never cached, because the same schema can be
/// visited under different naming contexts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    NamedReference { module: ModuleRef, name: String },
    Array(Box<TypeDescriptor>),
    Map(Box<TypeDescriptor>),
    /// Arbitrary untyped value
    Freeform,
    /// No value at all, such as a response without content
    Unrepresentable,
}

impl TypeDescriptor {
    pub fn named(module: ModuleRef, name: impl Into<String>) -> Self {
        Self::NamedReference {
            module,
            name: name.into(),
        }
    }

    pub fn array(element: TypeDescriptor) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn map(value: TypeDescriptor) -> Self {
        Self::Map(Box::new(value))
    }

    /// The registered schema this descriptor names directly, if any
    pub fn model_name(&self) -> Option<&str> {
        match self {
            Self::NamedReference {
                module: ModuleRef::Models,
                name,
            } => Some(name),
            _ => None,
        }
    }
}

/// One field of a synthesized struct
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDecl {
    /// Name as it appears on the wire
    pub wire_name: String,
    /// Rust identifier, unique within the struct
    pub field_name: String,
    pub ty: TypeDescriptor,
    pub required: bool,
    pub nullable: bool,
    pub description: Option<String>,
    /// Pass-through validation keywords, rendered as documentation
    pub notes: Vec<String>,
    pub deprecated: bool,
    /// Set for references that close a cycle back to the owning schema
    pub boxed: bool,
}

impl FieldDecl {
    /// Fields that may be missing or `null` become optional in the output
    pub fn is_optional(&self) -> bool {
        !self.required || self.nullable
    }
}

/// A synthesized struct and the anonymous types nested inside it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDecl {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDecl>,
    /// Declarations for anonymous types first seen inside this struct
    pub inner: Vec<Declaration>,
}

/// A named alias for a non-struct type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AliasDecl {
    pub name: String,
    pub description: Option<String>,
    pub target: TypeDescriptor,
    /// Declarations for anonymous types inside the target
    pub inner: Vec<Declaration>,
}

/// A type declaration produced by generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Declaration {
    Struct(StructDecl),
    Alias(AliasDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Self::Struct(s) => &s.name,
            Self::Alias(a) => &a.name,
        }
    }

    pub fn inner(&self) -> &[Declaration] {
        match self {
            Self::Struct(s) => &s.inner,
            Self::Alias(a) => &a.inner,
        }
    }
}
