use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use drift_assets::assets::{Blob, Folder, Text, Texture};
use drift_assets::{Asset, ProviderEvent, Resource};
use drift_remote::{
    DirectoryStore, HttpStore, LoaderConfig, RemoteId, RemoteLoaderFactory, RemoteProvider,
    RemoteStore,
};

#[derive(Parser, Debug)]
#[command(name = "drift", about = "Loads resources from a remote store through a disk cache")]
struct Cli {
    /// JSON loader configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Serve a local directory tree as the remote store
    #[arg(long, global = true, conflicts_with = "http")]
    store_dir: Option<PathBuf>,
    /// Base URL of an HTTP store
    #[arg(long, global = true)]
    http: Option<String>,
    /// Overrides the configured cache directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    #[arg(long, global = true, value_enum, default_value_t = Kind::Text)]
    kind: Kind,
    #[arg(long, global = true, default_value_t = Level::INFO)]
    log_level: Level,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Loads each path and reports whether it became valid
    Load {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Loads everything directly below a prefix
    Batch { prefix: String },
    /// Prints the path cached for a remote file id
    Index { id: String },
}

#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
enum Kind {
    Text,
    Blob,
    Texture,
    Folder,
}

/// One line summary of a loaded asset
trait Describe {
    fn describe(&self) -> String;
}

impl Describe for Text {
    fn describe(&self) -> String {
        format!("{} bytes of text", self.len())
    }
}

impl Describe for Blob {
    fn describe(&self) -> String {
        format!("{} bytes of {}", self.data.len(), self.mime_type)
    }
}

impl Describe for Texture {
    fn describe(&self) -> String {
        format!("{}x{} texture", self.width, self.height)
    }
}

impl Describe for Folder {
    fn describe(&self) -> String {
        "folder".to_string()
    }
}

fn report<T: Describe>(resource: &Resource<T>) -> bool {
    match resource.value() {
        Some(value) => {
            println!("{}: {}", resource.path(), value.describe());
            true
        }
        None => {
            println!("{}: failed", resource.path());
            false
        }
    }
}

fn log_progress(provider: &RemoteProvider) {
    for event in provider.get_events() {
        match event {
            ProviderEvent::Progress(progress) => {
                tracing::debug!("Progress {:.1}%", progress * 100.0)
            }
            ProviderEvent::Completed { path, outcome } => {
                tracing::trace!("{path} completed: {outcome:?}")
            }
        }
    }
}

/// Runs `command`, returning how many resources failed to load
async fn run<T: Asset + Describe>(
    provider: &RemoteProvider,
    command: &Command,
) -> anyhow::Result<usize> {
    let resources = match command {
        Command::Load { paths } => {
            let mut handles = Vec::with_capacity(paths.len());
            for path in paths {
                handles.push(provider.load_resource::<T>(path)?);
            }
            let mut resources = Vec::with_capacity(handles.len());
            for handle in handles {
                resources.push(handle.await);
            }
            resources
        }
        Command::Batch { prefix } => {
            let batch = provider.load_resources::<T>(prefix).await?;
            tracing::info!("Found {} resources below {prefix}", batch.len());
            batch.completed().await
        }
        Command::Index { .. } => Vec::new(),
    };
    log_progress(provider);
    Ok(resources.iter().filter(|resource| !report(resource)).count())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => LoaderConfig::from_json_file(path)?,
        None => LoaderConfig::default(),
    };
    if let Some(cache_dir) = &cli.cache_dir {
        config.cache_dir = cache_dir.clone();
    }

    if let Command::Index { id } = &cli.command {
        let index = config.open_index()?;
        match index.path_for(&RemoteId::new(id.as_str())) {
            Some(path) => println!("{id}: {path}"),
            None => println!("{id}: not cached"),
        }
        return Ok(());
    }

    let store: Arc<dyn RemoteStore> = match (&cli.store_dir, &cli.http) {
        (Some(dir), _) => Arc::new(DirectoryStore::new(dir)),
        (None, Some(base)) => Arc::new(HttpStore::new(base.as_str())),
        (None, None) => anyhow::bail!("Either --store-dir or --http is required"),
    };
    let context = config
        .build_context(store)
        .context("Failed to prepare the loader")?;
    let provider = RemoteProvider::new(RemoteLoaderFactory::new(context))?;

    let failed = match cli.kind {
        Kind::Text => run::<Text>(&provider, &cli.command).await?,
        Kind::Blob => run::<Blob>(&provider, &cli.command).await?,
        Kind::Texture => run::<Texture>(&provider, &cli.command).await?,
        Kind::Folder => run::<Folder>(&provider, &cli.command).await?,
    };
    anyhow::ensure!(failed == 0, "{failed} resource(s) failed to load");
    Ok(())
}
