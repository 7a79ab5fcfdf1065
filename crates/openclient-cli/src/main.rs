//! openclient CLI entrypoint
//! Parses command-line arguments and dispatches to the core generator.

// Internal imports (std, crate)
use std::path::PathBuf;

// External imports (alphabetized)
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use openclient_core::{generate_units, Config, OpenApiContext};
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_PROJECT_NAME: &str = "openclient_generated";

#[derive(Parser)]
#[command(name = "openclient")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the document comes from and what to generate from it
#[derive(Args, Debug, Clone)]
struct SourceArgs {
    /// Path or URL to the OpenAPI document (YAML or JSON)
    ///
    /// Example: --schema-path path/to/openapi.yaml
    /// Example: --schema-path https://example.com/openapi.json
    #[arg(long)]
    schema_path: Option<String>,
    /// Configuration file (.yaml, .yml or .toml); flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Project name, used as the generated package name
    #[arg(long)]
    project_name: Option<String>,
    /// Base URL that relative server URLs are joined onto
    #[arg(long)]
    base_url: Option<Url>,
    /// Generate only this operation; repeatable
    #[arg(long = "include", value_name = "OPERATION_ID")]
    include_operations: Vec<String>,
    /// Skip this operation; repeatable
    #[arg(long = "exclude", value_name = "OPERATION_ID")]
    exclude_operations: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a client crate from an OpenAPI document
    Generate {
        #[command(flatten)]
        source: SourceArgs,
        /// Output directory for generated code (default: the project name)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run generation in memory and list the files it would write
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
}

impl SourceArgs {
    /// The configuration file, if any, with command-line overrides applied
    async fn resolve(&self, output_dir: Option<&PathBuf>) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .await
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => {
                let schema_path = self
                    .schema_path
                    .clone()
                    .context("--schema-path is required when no --config is given")?;
                let project_name = self
                    .project_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());
                Config::new(project_name.clone(), schema_path, project_name)
            }
        };

        if let Some(schema_path) = &self.schema_path {
            config.openapi_schema_path = schema_path.clone();
        }
        if let Some(project_name) = &self.project_name {
            config.project_name = project_name.clone();
        }
        if let Some(output_dir) = output_dir {
            config.output_dir = output_dir.to_string_lossy().into_owned();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }
        if !self.include_operations.is_empty() {
            config.include_operations = self.include_operations.clone();
        }
        config
            .exclude_operations
            .extend(self.exclude_operations.iter().cloned());
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Generate { source, output_dir } => {
            let config = source.resolve(output_dir.as_ref()).await?;
            tracing::info!(
                schema = %config.openapi_schema_path,
                output = %config.output_dir,
                "Generating client"
            );

            let written = openclient_core::generate(&config)
                .await
                .with_context(|| format!("Failed to generate client from {}", config.openapi_schema_path))?;

            println!(
                "Generated {} files in: {}",
                written.len(),
                config.output_dir
            );
        }
        Commands::Check { source } => {
            let config = source.resolve(None).await?;
            let spec = OpenApiContext::from_file_or_url(&config.openapi_schema_path)
                .await
                .with_context(|| format!("Failed to load OpenAPI document {}", config.openapi_schema_path))?;
            tracing::info!(title = spec.title(), version = spec.version(), "Checking document");

            let units = generate_units(&spec, &config).context("Generation failed")?;
            for unit in &units {
                println!("{} ({} bytes)", unit.path.display(), unit.contents.len());
            }
        }
    }
    Ok(())
}
