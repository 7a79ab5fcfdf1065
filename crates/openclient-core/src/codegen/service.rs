//! Partitioning of operations into service units.
//!
//! Operations are grouped by the literal path prefix that precedes the first
//! path parameter, so `/v1/items`, `/v1/items/{id}` and `/v1/items/{id}/tags`
//! share one unit. Deeper grouping would give smaller units at the cost of
//! splitting one resource over several of them.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::codegen::emitter::{unique_ident, NamingScope};
use crate::codegen::operation::{CompiledOperation, OperationCompiler, OperationDescriptor};
use crate::codegen::references::ReferenceCollector;
use crate::codegen::registry::SchemaRegistry;
use crate::codegen::types::Declaration;
use crate::utils::to_module_name;
use crate::Result;

/// The part of `path` before its first placeholder, without a trailing `/`
pub fn path_root(path: &str) -> &str {
    let prefix = match path.find('{') {
        Some(index) => &path[..index],
        None => path,
    };
    prefix.trim_end_matches('/')
}

/// Operations sharing one path root
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceGroup {
    pub path_root: String,
    /// Output module; `root` for operations directly under `/`
    pub module_name: String,
    pub operations: Vec<OperationDescriptor>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceGrouper;

impl ServiceGrouper {
    /// Groups in order of first appearance, operations in their original order
    pub fn group(operations: impl IntoIterator<Item = OperationDescriptor>) -> Vec<ServiceGroup> {
        let mut groups: IndexMap<String, Vec<OperationDescriptor>> = IndexMap::new();
        for op in operations {
            groups
                .entry(path_root(&op.path).to_string())
                .or_default()
                .push(op);
        }

        let mut modules = HashSet::new();
        groups
            .into_iter()
            .map(|(root, operations)| ServiceGroup {
                module_name: unique_ident(&mut modules, &to_module_name(&root)),
                path_root: root,
                operations,
            })
            .collect()
    }
}

/// A compiled service unit
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledService {
    pub path_root: String,
    pub module_name: String,
    pub operations: Vec<CompiledOperation>,
    /// Types declared by the unit's operations, in operation order
    pub declarations: Vec<Declaration>,
    /// Registered schemas the unit refers to, sorted
    pub imports: Vec<String>,
}

impl ServiceGroup {
    /// Compile every operation of the group against one shared naming scope
    pub fn compile(&self, registry: &SchemaRegistry) -> Result<CompiledService> {
        let compiler = OperationCompiler::new(registry);
        let mut scope = NamingScope::root();
        let mut operations = Vec::with_capacity(self.operations.len());
        let mut declarations = Vec::new();

        for op in &self.operations {
            let compiled = compiler
                .compile(op, &mut scope)
                .map_err(|e| e.within(format!("service '{}'", self.module_name)))?;
            declarations.extend(compiled.declarations.iter().cloned());
            operations.push(compiled);
        }

        let imports = ReferenceCollector::new(registry)
            .imports(self.operations.iter().flat_map(|op| op.schema_nodes()), None)?;

        Ok(CompiledService {
            path_root: self.path_root.clone(),
            module_name: self.module_name.clone(),
            operations,
            declarations,
            imports,
        })
    }
}
