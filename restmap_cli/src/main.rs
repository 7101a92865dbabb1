mod commands;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use restmap::{Client, ClientConfig, MappingRegistry};

#[derive(Parser)]
#[command(name = "restmap")]
#[command(about = "Fetch and decode JSON REST resources through declarative mappings")]
struct Cli {
    /// API base URL (overrides RESTMAP_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Default results per page (overrides RESTMAP_PAGE_SIZE)
    #[arg(long, global = true)]
    page_size: Option<u64>,

    /// Log every request and response at info level
    #[arg(long, global = true)]
    debug: bool,

    /// YAML file with entity mapping declarations
    #[arg(long, global = true)]
    mappings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Raw GET of an endpoint, decoded without an entity type
    Get(commands::get::GetArgs),
    /// Fetch a single entity by id
    Fetch(commands::fetch::FetchArgs),
    /// List one page of entities
    List(commands::list::ListArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("restmap=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = resolve_config(&cli)?;
    let registry = match &cli.mappings {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading mappings from {}", path.display()))?;
            MappingRegistry::from_yaml(&content)?
        }
        None => MappingRegistry::new(),
    };
    let client = Client::new(config, registry)?;

    match &cli.command {
        Commands::Get(args) => commands::get::run(args, &client).await?,
        Commands::Fetch(args) => commands::fetch::run(args, &client).await?,
        Commands::List(args) => commands::list::run(args, &client).await?,
    }

    Ok(())
}

/// Environment configuration with command-line overrides applied.
fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match (&cli.base_url, ClientConfig::from_env()) {
        (Some(base_url), Ok(env)) => ClientConfig {
            base_url: ClientConfig::new(base_url).base_url,
            ..env
        },
        (Some(base_url), Err(_)) => ClientConfig::new(base_url),
        (None, env) => env.context("no base URL given")?,
    };
    if let Some(page_size) = cli.page_size {
        config = config.with_page_size(page_size);
    }
    if cli.debug {
        config = config.with_debug(true);
    }
    Ok(config)
}
