//! Datagrab: grab bytes from wherever they live.
//!
//! A key such as `/data/file.csv`, `https://example.com/x.json` or
//! `hf://org/dataset` is dispatched on its scheme to a handler that returns the
//! raw bytes (or a lazy directory mapping). For Our World in Data charts, the
//! [`owid`] module acquires the metadata + CSV pair of a slug, falling back to
//! the chart's zip bundle when direct downloads are blocked.
//!
//! # Modules
//!
//! - [`resolve`]: Scheme registry and the built-in handlers
//! - [`owid`]: Chart artifact templating and resilient acquisition
//! - [`download`]: Single-file download capability and failure classification
//! - [`archive`]: Member-addressable archives and temporary archive cleanup
//! - [`config`]: Application data directory layout
//! - [`error`]: Error types for datagrab operations

pub mod archive;
pub mod config;
pub mod download;
pub mod error;
pub mod owid;
pub mod resolve;

#[cfg(test)]
mod test_http;

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use config::Settings;
pub use download::{classify_failure, DownloadError, Downloader, FailureKind, HttpDownloader};
pub use error::GrabError;
pub use owid::{Acquirer, Acquisition, ArtifactKind, OwidSource};
pub use resolve::{Content, FileTree, Resolver};

/// The datagrab CLI application.
#[derive(Parser)]
#[command(name = "datagrab")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding caches and downloads.
    #[arg(long, global = true, env = config::APP_DATA_DIR_ENV)]
    app_data_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set (e.g. 'info', 'datagrab=debug').
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Resolve a key and output its content.
    Grab(GrabArgs),
    /// List the registered schemes.
    Schemes,
    /// Acquire metadata and CSV files for Our World in Data chart slugs.
    Owid(OwidArgs),
    /// Show the URL and cache path of one chart artifact.
    OwidUrl(OwidUrlArgs),
}

/// Arguments for the grab subcommand.
#[derive(clap::Args)]
struct GrabArgs {
    /// Key to resolve ('/path', 'file://', 'hf://', 'http(s)://').
    key: String,

    /// Write bytes to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Arguments for the owid subcommand.
#[derive(clap::Args)]
struct OwidArgs {
    /// Chart slugs (e.g. 'life-expectancy').
    #[arg(required = true)]
    slugs: Vec<String>,

    /// Download again even when cached copies exist.
    #[arg(long)]
    refresh: bool,
}

/// Arguments for the owid-url subcommand.
#[derive(clap::Args)]
struct OwidUrlArgs {
    slug: String,

    /// Artifact kind ('json', 'csv', 'zip', or 'html').
    #[arg(long, default_value = "json")]
    kind: String,
}

/// Run the datagrab CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), GrabError> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    let settings = Settings::resolve(cli.app_data_dir);

    match cli.command {
        Some(Commands::Grab(args)) => run_grab(&settings, args),
        Some(Commands::Schemes) => run_schemes(&settings),
        Some(Commands::Owid(args)) => run_owid(&settings, args),
        Some(Commands::OwidUrl(args)) => run_owid_url(&settings, args),
        None => {
            println!("datagrab {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Grab bytes from files, dataset hubs and the web.");
            println!();
            println!("Run 'datagrab --help' for usage information.");
            Ok(())
        }
    }
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Ignore the error: a subscriber may already be installed by an embedder.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_grab(settings: &Settings, args: GrabArgs) -> Result<(), GrabError> {
    let resolver = Resolver::with_defaults(settings)?;

    match resolver.resolve(&args.key)? {
        Content::Bytes(bytes) => match args.output {
            Some(path) => fs::write(&path, &bytes)?,
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&bytes)?;
                stdout.flush()?;
            }
        },
        Content::Files(tree) => {
            for key in tree.keys()? {
                println!("{key}");
            }
        }
    }
    Ok(())
}

fn run_schemes(settings: &Settings) -> Result<(), GrabError> {
    let resolver = Resolver::with_defaults(settings)?;
    for scheme in resolver.schemes() {
        println!("{scheme}");
    }
    Ok(())
}

fn run_owid(settings: &Settings, args: OwidArgs) -> Result<(), GrabError> {
    for slug in &args.slugs {
        owid::validate_slug(slug)?;
    }
    let source = OwidSource::from_settings(settings)?;
    let acquirer = Acquirer::new(source, HttpDownloader::default());

    let results = acquirer.acquire_all(args.slugs.iter().map(String::as_str), args.refresh);
    for (slug, acquisition) in results {
        println!(
            "{}\t{}\t{}",
            slug,
            display_path(acquisition.metadata.as_ref()),
            display_path(acquisition.data.as_ref())
        );
    }
    Ok(())
}

fn run_owid_url(settings: &Settings, args: OwidUrlArgs) -> Result<(), GrabError> {
    let kind: ArtifactKind = args.kind.parse()?;
    owid::validate_slug(&args.slug)?;
    let source = OwidSource::from_settings(settings)?;
    let location = source.location(&args.slug, kind);
    println!("{}", location.url);
    println!("{}", location.path.display());
    Ok(())
}

fn display_path(path: Option<&PathBuf>) -> String {
    path.map(|path| path.display().to_string())
        .unwrap_or_else(|| "-".to_string())
}
