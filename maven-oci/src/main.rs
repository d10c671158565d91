//! Command line interface for publishing and resolving Maven artifacts.

use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use eyre::{eyre, WrapErr};
use maven_oci::{bundler, MavenCoordinate, Publisher, RegistryConfig, Resolver};
use registry::StorageRegistry;
use serde::Deserialize;
use storage::StorageConfig;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "maven-oci.toml")]
    config: Utf8PathBuf,

    /// Registry URL, overriding the configuration file
    #[arg(long, global = true)]
    registry: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the registry reference for a coordinate
    Reference {
        /// groupId:artifactId:version
        coordinate: MavenCoordinate,
    },

    /// Publish files under a coordinate
    Publish {
        /// groupId:artifactId:version
        coordinate: MavenCoordinate,

        /// Artifact files: jars, the POM, sources and javadoc
        #[arg(required = true)]
        files: Vec<Utf8PathBuf>,
    },

    /// Exit successfully when a coordinate is published
    Exists {
        /// groupId:artifactId:version
        coordinate: MavenCoordinate,
    },

    /// Download a coordinate into a directory
    Resolve {
        /// groupId:artifactId:version
        coordinate: MavenCoordinate,

        /// Destination directory
        #[arg(short, long, default_value = ".")]
        dest: Utf8PathBuf,
    },
}

fn default_bucket() -> String {
    "registry".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Config {
    registry: RegistryConfig,

    storage: StorageConfig,

    #[serde(default = "default_bucket")]
    bucket: String,
}

impl Config {
    async fn load(path: &Utf8Path) -> eyre::Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .wrap_err_with(|| format!("reading configuration {path}"))?;
        toml_edit::de::from_str(&text).wrap_err_with(|| format!("parsing configuration {path}"))
    }

    async fn client(&self) -> eyre::Result<StorageRegistry> {
        let storage = self
            .storage
            .clone()
            .build()
            .await
            .wrap_err("opening registry storage")?;
        Ok(StorageRegistry::new(storage, self.bucket.clone()))
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_error::ErrorLayer::default())
        .init();
}

async fn run(cli: Cli) -> eyre::Result<ExitCode> {
    let mut config = Config::load(&cli.config).await?;
    if let Some(url) = cli.registry {
        config.registry.url = url;
    }

    match cli.command {
        Command::Reference { coordinate } => {
            println!("{}", config.registry.reference(&coordinate)?);
        }
        Command::Publish { coordinate, files } => {
            let reference = config.registry.reference(&coordinate)?;
            let bundle = bundler::bundle(&files, &coordinate).await?;
            let published = Publisher::new(config.client().await?)
                .publish(&coordinate, &bundle, &reference)
                .await?;
            println!("{}@{}", published.reference, published.digest);
        }
        Command::Exists { coordinate } => {
            let resolver = Resolver::new(config.client().await?);
            let exists = resolver.exists(&coordinate, &config.registry).await;
            println!("{exists}");
            if !exists {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Resolve { coordinate, dest } => {
            let resolver = Resolver::new(config.client().await?);
            if !resolver.resolve(&coordinate, &config.registry, &dest).await {
                return Err(eyre!("could not resolve {coordinate}"));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    init_tracing();
    run(Cli::parse()).await
}
