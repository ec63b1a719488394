use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "avmerge")]
#[command(author, version, about = "Pair video files with audio tracks by name and merge them")]
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
    /// List the video and audio files in a directory
    Scan {
        /// Directory to scan (config or a guessed media folder if omitted)
        dir: Option<PathBuf>,

        /// Include subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Show how videos would be paired with audio files
    Match {
        /// Directory to scan
        dir: Option<PathBuf>,

        /// Include subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Minimum similarity for fuzzy matches (0.0 - 1.0)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Merge every matched pair into one output file
    Merge {
        /// Directory to scan
        dir: Option<PathBuf>,

        /// Include subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Write outputs here instead of next to each video
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Suffix added to output file names
        #[arg(long)]
        suffix: Option<String>,

        /// Minimum similarity for fuzzy matches (0.0 - 1.0)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Number of merges to run at once
        #[arg(short, long)]
        workers: Option<usize>,

        /// Replace existing output files
        #[arg(long)]
        overwrite: bool,

        /// Path to the ffmpeg executable
        #[arg(long)]
        tool: Option<PathBuf>,

        /// Show what would be merged without running anything
        #[arg(long)]
        dry_run: bool,

        /// Remember these settings in the config file
        #[arg(long)]
        save: bool,
    },

    /// Check that the merge tool is available
    CheckTool {
        /// Tool to check (configured or discovered ffmpeg if omitted)
        path: Option<PathBuf>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
