use clap::{Parser, Subcommand};
use stagehand_common::MediaType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(author, version, about = "Classify media uploads and keep a catalog of them")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile the catalog with the upload directories
    Scan {
        /// Only scan this media type (movies, shows, music)
        #[arg(short = 't', long = "type")]
        media_type: Option<MediaType>,
    },

    /// Classify a single file and show every candidate
    Classify {
        /// File to classify
        #[arg(required = true)]
        file: PathBuf,

        /// Directory the file's relative path is taken from
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List catalog entries for a media type
    Catalog {
        /// Media type to list (movies, shows, music)
        #[arg(short = 't', long = "type", required = true)]
        media_type: MediaType,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
