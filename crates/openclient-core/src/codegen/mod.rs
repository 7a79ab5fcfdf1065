//! The generation engine.
//!
//! Generation runs in two passes over an already parsed document:
//!
//! 1. Registration: every schema under `components.schemas` is added to a
//!    [`SchemaRegistry`]. Nothing else runs until this pass is complete, so
//!    the registry is read-only for the rest of the run.
//! 2. Emission: registered schemas, operations and security schemes are
//!    turned into declarations. References between schemas are kept as
//!    names, which is what makes cyclic schema graphs safe to process.
//!
//! Errors in either pass are fatal for the unit being generated and name it
//! through [`Error::within`](crate::Error::within).

pub mod emitter;
pub mod operation;
pub mod references;
pub mod registry;
pub mod resolver;
pub mod security;
pub mod service;
pub mod types;

pub use emitter::{Emitted, InnerTypeEmitter, NamingScope};
pub use operation::{
    derive_operation_id, BodyDescriptor, CompiledBody, CompiledOperation, CompiledParameter,
    CompiledResponse, OperationCompiler, OperationDescriptor, ParameterDescriptor,
};
pub use references::{ReferenceCollector, ReferenceGraph};
pub use registry::{parse_schema_reference, NamedSchema, SchemaRegistry};
pub use resolver::{object_shape, ObjectShape, SchemaTypeResolver};
pub use security::{CompiledScheme, SecurityCompiler, SecurityConfigurator};
pub use service::{path_root, CompiledService, ServiceGroup, ServiceGrouper};
pub use types::{
    AliasDecl, Declaration, FieldDecl, ModuleRef, PrimitiveKind, StructDecl, TypeDescriptor,
};
