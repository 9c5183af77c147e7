//! gopkgdoc - print the documentation of a Go package in a remote repository

mod output;

use std::path::PathBuf;

use clap::Parser;
use gopkgdoc::{DocCache, DocsError};
use libgopkgdoc_core::{load_config, DocsConfig, VcsBackend};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "gopkgdoc", about = "Extract documentation from a Go package repository", version)]
pub struct Cli {
    /// Import path of the package (e.g. github.com/user/pkg)
    import_path: String,

    /// Location to clone the repository from
    clone_location: String,

    /// Print the documentation model as JSON
    #[arg(long)]
    json: bool,

    /// Config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding working copies
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Seconds between refreshes of one working copy
    #[arg(long)]
    cooldown: Option<u64>,

    /// VCS backend (command, libgit2)
    #[arg(long)]
    backend: Option<VcsBackend>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(&cli) {
        output::output_error(&cli, &e);
        std::process::exit(e.exit_code());
    }
}

fn resolve_config(cli: &Cli) -> Result<DocsConfig, DocsError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?
            .ok_or_else(|| DocsError::InvalidArgs(format!("config file not found: {}", path.display())))?,
        None => DocsConfig::default(),
    };
    if let Some(dir) = &cli.scratch_dir {
        config.scratch_dir = Some(dir.clone());
    }
    if let Some(secs) = cli.cooldown {
        config.refresh_cooldown_secs = Some(secs);
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), DocsError> {
    let config = resolve_config(cli)?;
    info!(scratch_dir = %config.scratch_dir().display(), backend = ?config.backend, "loading documentation");

    let cache = DocCache::from_config(&config);
    let pkg = cache.load_docs(&cli.import_path, &cli.clone_location)?;
    output::output_package(cli, &pkg);
    Ok(())
}
