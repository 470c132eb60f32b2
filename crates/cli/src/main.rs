mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use photoalbum_core::Library;
use tracing_subscriber::EnvFilter;

/// Photo album organizer — groups uploaded photos into albums by date
#[derive(Parser)]
#[command(name = "photoalbum", version, about)]
struct Cli {
    /// Path to the catalog database
    #[arg(long, env = "PHOTOALBUM_CATALOG", default_value_t = default_catalog_path())]
    catalog: String,

    /// Log progress details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload photos (files or directories) into date albums
    Upload {
        /// Files or directories to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List albums in display order
    Albums {
        /// Print albums as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the photos of an album
    Photos {
        /// Album ID
        album: i64,
    },
    /// Set the album display order, first ID first
    Reorder {
        /// Every album ID to place, in the new order
        #[arg(required = true)]
        albums: Vec<i64>,
    },
    /// Delete a photo
    Rm {
        /// Photo ID
        photo: i64,
    },
}

fn default_catalog_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".photoalbum")
        .join("catalog.db")
        .to_string_lossy()
        .to_string()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info,photoalbum_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let library = Library::open(&PathBuf::from(&cli.catalog))?;

    match cli.command {
        Commands::Upload { paths } => commands::upload::run(&library, &paths)?,
        Commands::Albums { json } => commands::albums::list(&library, json)?,
        Commands::Photos { album } => commands::albums::photos(&library, album)?,
        Commands::Reorder { albums } => commands::albums::reorder(&library, &albums)?,
        Commands::Rm { photo } => commands::albums::remove_photo(&library, photo)?,
    }

    Ok(())
}
