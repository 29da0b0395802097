//! apifactory CLI entrypoint
//! Parses command-line arguments and drives an API registry.
#![deny(unsafe_code)]

use std::path::PathBuf;

// External imports (alphabetized)
use anyhow::Context;
use apifactory::{ApiRegistry, ClientOptions, Endpoint, RegistryOptions};
use clap::Parser;
use serde_json::Value as JsonValue;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "apifactory")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Registry configuration file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory overriding the embedded API documents
    #[arg(long, global = true)]
    apis_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// List registered API names
    List,
    /// List versions available for a bundled API
    Versions {
        /// API name, e.g. drive
        api: String,
    },
    /// Build a client for a bundled API version
    Load {
        /// API name, e.g. drive
        api: String,
        /// Version identifier, e.g. v3
        version: String,
        /// Extra client options as a JSON object
        #[arg(long)]
        options: Option<String>,
    },
    /// Register every API listed in a discovery index
    Discover {
        /// URL or path of the discovery index
        index: String,
    },
    /// Build a client straight from one discovery document
    Inspect {
        /// URL or path of the discovery document
        source: String,
        /// Override the API root URL
        #[arg(long)]
        root_url: Option<Url>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with default level WARN, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = build_registry(cli.config.as_ref(), cli.apis_dir.as_ref())?;

    match &cli.command {
        Commands::List => run_list(&registry),
        Commands::Versions { api } => run_versions(&registry, api)?,
        Commands::Load {
            api,
            version,
            options,
        } => run_load(&registry, api, version, options.as_deref())?,
        Commands::Discover { index } => run_discover(&registry, index).await?,
        Commands::Inspect { source, root_url } => {
            run_inspect(&registry, source, root_url.as_ref()).await?
        }
    }
    Ok(())
}

fn build_registry(
    config: Option<&PathBuf>,
    apis_dir: Option<&PathBuf>,
) -> anyhow::Result<ApiRegistry> {
    let mut options = match config {
        Some(path) => RegistryOptions::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RegistryOptions::default(),
    };
    if let Some(dir) = apis_dir {
        options.apis_dir = Some(dir.clone());
    }
    match options.apis_dir() {
        Some(dir) => info!(apis_dir = %dir.display(), "Creating API registry"),
        None => info!("Creating API registry from embedded API documents"),
    }
    ApiRegistry::with_options(options).context("Failed to create API registry")
}

fn run_list(registry: &ApiRegistry) {
    for name in registry.api_names() {
        println!("{name}");
    }
}

fn run_versions(registry: &ApiRegistry, api: &str) -> anyhow::Result<()> {
    let handle = registry
        .api(api)
        .with_context(|| format!("Unknown API '{api}'"))?;
    let versions = handle.versions();
    if versions.is_empty() {
        println!("No versions of {api} available.");
    }
    for version in versions {
        println!("{version}");
    }
    Ok(())
}

fn run_load(
    registry: &ApiRegistry,
    api: &str,
    version: &str,
    options: Option<&str>,
) -> anyhow::Result<()> {
    let handle = registry
        .api(api)
        .with_context(|| format!("Unknown API '{api}'"))?;

    let endpoint = match options {
        Some(json) => {
            let mut value: JsonValue =
                serde_json::from_str(json).context("Failed to parse JSON options")?;
            let map = value
                .as_object_mut()
                .context("Options must be a JSON object")?;
            map.insert("version".to_string(), JsonValue::from(version));
            handle.call_value(value)?
        }
        None => handle.call(version)?,
    };

    print_endpoint(&endpoint);
    Ok(())
}

async fn run_discover(registry: &ApiRegistry, index: &str) -> anyhow::Result<()> {
    let names = registry
        .discover_all(index)
        .await
        .with_context(|| format!("Failed to discover APIs from {index}"))?;

    for name in &names {
        let versions = registry
            .api(name)
            .map(|handle| handle.versions().join(", "))
            .unwrap_or_default();
        println!("{name}: {versions}");
    }
    println!("\nRegistered {} API(s)", names.len());
    Ok(())
}

async fn run_inspect(
    registry: &ApiRegistry,
    source: &str,
    root_url: Option<&Url>,
) -> anyhow::Result<()> {
    let mut options = ClientOptions::new();
    if let Some(root) = root_url {
        options.insert("rootUrl", root.as_str());
    }

    let endpoint = registry
        .discover_api_with(source, options)
        .await
        .with_context(|| format!("Failed to build client from {source}"))?;

    print_endpoint(&endpoint);
    Ok(())
}

fn print_endpoint(endpoint: &Endpoint) {
    println!("API: {}", endpoint.name());
    println!("Version: {}", endpoint.version());
    if let Some(title) = &endpoint.descriptor().title {
        println!("Title: {title}");
    }
    println!("Base URL: {}", endpoint.base_url());

    let methods = endpoint.method_ids();
    println!("Methods ({}):", methods.len());
    for id in methods {
        println!("  {id}");
    }
}
