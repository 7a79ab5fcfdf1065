//! Code generation entry points.
//!
//! [`generate_units`] runs both passes in memory and renders every output
//! unit; [`generate`] loads the document named by a [`Config`] and writes the
//! units below its output directory.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::{
    builders::{ContextBuilder, CrateSummary, ModelEntry, RustContextBuilder},
    codegen::{
        InnerTypeEmitter, OperationDescriptor, ReferenceCollector, ReferenceGraph,
        SchemaRegistry, SecurityCompiler, ServiceGrouper,
    },
    config::Config,
    error::Result,
    openapi::OpenApiContext,
    templates::{TemplateRenderer, UnitTemplate},
    utils::to_snake_case,
};

/// One rendered output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    /// Path relative to the output directory
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedUnit {
    fn new(path: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }
}

/// Main entry point for code generation. Returns the paths written.
pub async fn generate(config: &Config) -> Result<Vec<PathBuf>> {
    // 1. Load OpenAPI document
    let spec = OpenApiContext::from_file_or_url(&config.openapi_schema_path).await?;

    // 2. Run both passes and render
    let units = generate_units(&spec, config)?;

    // 3. Write everything out
    write_units(Path::new(&config.output_dir), &units).await
}

/// Render every output unit for `spec`
pub fn generate_units(spec: &OpenApiContext, config: &Config) -> Result<Vec<GeneratedUnit>> {
    let document = spec.document();

    // Registration pass: the registry is complete and read-only from here on
    let registry = SchemaRegistry::from_document(document)?;
    let graph = ReferenceGraph::from_registry(&registry)?;

    let builder = RustContextBuilder::new(config.runtime_crate.clone());
    let renderer = TemplateRenderer::new()?;
    let emitter = InnerTypeEmitter::new(&registry);
    let collector = ReferenceCollector::new(&registry);
    let mut units = Vec::new();

    let mut models = Vec::with_capacity(registry.len());
    for named in registry.iter() {
        let mut decl = emitter
            .emit_named(named)
            .map_err(|e| e.within(format!("schema '{}'", named.name)))?;
        graph.box_cycles(&named.target_type_name, &mut decl);
        let imports = collector.imports([&named.node], Some(&named.target_type_name))?;

        let context = builder.model(&decl, &imports)?;
        units.push(GeneratedUnit::new(
            format!("src/models/{}.rs", file_stem(&named.target_module)),
            renderer.render(UnitTemplate::Model, &context)?,
        ));
        models.push(ModelEntry {
            module: named.target_module.clone(),
            name: named.target_type_name.clone(),
        });
    }

    let operations: Vec<_> = OperationDescriptor::from_document(document)?
        .into_iter()
        .filter(|op| {
            let selected = config.selects(&op.id);
            if !selected {
                log::debug!("Skipping operation '{}'", op.id);
            }
            selected
        })
        .collect();
    log::info!(
        "Generating {} models and {} operations",
        models.len(),
        operations.len()
    );

    let mut services = Vec::new();
    for group in ServiceGrouper::group(operations) {
        let service = group.compile(&registry)?;
        let context = builder.service(&service)?;
        units.push(GeneratedUnit::new(
            format!("src/services/{}.rs", file_stem(&service.module_name)),
            renderer.render(UnitTemplate::Service, &context)?,
        ));
        services.push(service.module_name);
    }

    let schemes = SecurityCompiler::compile(&document.components.security_schemes)?;
    let context = builder.security(&schemes)?;
    units.push(GeneratedUnit::new(
        "src/security.rs",
        renderer.render(UnitTemplate::Security, &context)?,
    ));

    let summary = CrateSummary {
        package_name: package_name(&config.project_name),
        title: spec.title().to_string(),
        version: spec.version().to_string(),
        description: document.info.description.clone(),
        base_url: spec.server_url(config.base_url.as_ref())?,
        models,
        services,
    };
    let context = builder.crate_root(&summary)?;
    for (path, template) in [
        ("src/lib.rs", UnitTemplate::Lib),
        ("src/models/mod.rs", UnitTemplate::ModelsIndex),
        ("src/services/mod.rs", UnitTemplate::ServicesIndex),
        ("Cargo.toml", UnitTemplate::Manifest),
    ] {
        units.push(GeneratedUnit::new(path, renderer.render(template, &context)?));
    }

    Ok(units)
}

/// Write `units` below `root`, creating directories as needed
pub async fn write_units(root: &Path, units: &[GeneratedUnit]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(units.len());
    for unit in units {
        let path = root.join(&unit.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &unit.contents).await?;
        log::debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// File name for a module, which may be a raw identifier
fn file_stem(module: &str) -> &str {
    module.trim_start_matches("r#")
}

/// Cargo package name for `project_name`
fn package_name(project_name: &str) -> String {
    let name = to_snake_case(project_name).replace('_', "-");
    if name.is_empty() {
        "openclient-generated".to_string()
    } else {
        name
    }
}
