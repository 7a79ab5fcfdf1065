//! Dependency discovery between schemas.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::codegen::registry::SchemaRegistry;
use crate::codegen::types::Declaration;
use crate::openapi::{AdditionalProperties, SchemaNode};
use crate::Result;

/// Collects the registered schemas a subtree refers to.
///
/// The walk stops at every reference, so cyclic schemas terminate.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceCollector<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> ReferenceCollector<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Generated type names referenced anywhere under `node`, sorted
    pub fn collect(&self, node: &SchemaNode) -> Result<BTreeSet<String>> {
        let mut found = BTreeSet::new();
        self.walk(node, &mut found)?;
        Ok(found)
    }

    /// Like [`collect`](Self::collect) over several nodes, without `owner`
    pub fn imports<'n>(
        &self,
        nodes: impl IntoIterator<Item = &'n SchemaNode>,
        owner: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut found = BTreeSet::new();
        for node in nodes {
            self.walk(node, &mut found)?;
        }
        if let Some(owner) = owner {
            found.remove(owner);
        }
        Ok(found.into_iter().collect())
    }

    fn walk(&self, node: &SchemaNode, found: &mut BTreeSet<String>) -> Result<()> {
        if let Some(reference) = &node.reference {
            let named = self.registry.resolve(reference)?;
            found.insert(named.target_type_name.clone());
            return Ok(());
        }
        if let Some(items) = &node.items {
            self.walk(items, found)?;
        }
        for property in node.properties.iter().flat_map(|p| p.values()) {
            self.walk(property, found)?;
        }
        if let Some(AdditionalProperties::Typed(value)) = &node.additional_properties {
            self.walk(value, found)?;
        }
        for member in node.any_of.iter().chain(&node.all_of) {
            self.walk(member, found)?;
        }
        Ok(())
    }
}

/// Which registered schemas refer to which, by generated type name
#[derive(Debug, Clone, Default)]
pub struct ReferenceGraph {
    edges: HashMap<String, BTreeSet<String>>,
}

impl ReferenceGraph {
    pub fn from_registry(registry: &SchemaRegistry) -> Result<Self> {
        let collector = ReferenceCollector::new(registry);
        let mut edges = HashMap::new();
        for named in registry.iter() {
            edges.insert(
                named.target_type_name.clone(),
                collector
                    .collect(&named.node)
                    .map_err(|e| e.within(format!("schema '{}'", named.name)))?,
            );
        }
        Ok(Self { edges })
    }

    pub fn references(&self, name: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(name)
            .into_iter()
            .flat_map(|targets| targets.iter().map(String::as_str))
    }

    /// Whether a path of one or more references leads from `from` to `to`
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<&str> = self.references(from).collect();
        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            if visited.insert(current) {
                queue.extend(self.references(current));
            }
        }
        false
    }

    /// Whether a direct reference from `owner` to `target` closes a cycle
    pub fn closes_cycle(&self, owner: &str, target: &str) -> bool {
        owner == target || self.reaches(target, owner)
    }

    /// Box every direct field reference in `decl` (and its inline types)
    /// that leads back to `owner`.
    ///
    /// References inside arrays and maps are already behind an indirection
    /// and stay as they are.
    pub fn box_cycles(&self, owner: &str, decl: &mut Declaration) {
        match decl {
            Declaration::Struct(s) => {
                for field in &mut s.fields {
                    if let Some(target) = field.ty.model_name() {
                        field.boxed = self.closes_cycle(owner, target);
                    }
                }
                for inner in &mut s.inner {
                    self.box_cycles(owner, inner);
                }
            }
            Declaration::Alias(a) => {
                for inner in &mut a.inner {
                    self.box_cycles(owner, inner);
                }
            }
        }
    }
}
