//! Command line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "mediaswap",
    version,
    about = "Converts HEIC/HEIF photos to JPEG and MOV videos to MP4, in place"
)]
pub struct Cli {
    /// Configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Print the batch report as JSON
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert every file under a folder, replacing originals
    Folder {
        /// Folder to convert
        dir: PathBuf,
    },
    /// Convert picked files, keeping their names
    Files {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert a mix of files and folders, as if dropped together
    Drop {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List what a drop would convert without touching anything
    Scan {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}
