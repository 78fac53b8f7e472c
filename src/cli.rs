use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate one or more media files into a set of target languages
    Translate {
        /// Input media files
        #[arg(short, long, required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Source language code ("auto" to let the engine detect it)
        #[arg(short, long, default_value = "auto")]
        source_lang: String,

        /// Target languages for translation (comma-separated)
        #[arg(short, long)]
        target_langs: String,
    },

    /// Translate all media files found in a directory
    Batch {
        /// Input directory containing media files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Source language code ("auto" to let the engine detect it)
        #[arg(short, long, default_value = "auto")]
        source_lang: String,

        /// Target languages for translation (comma-separated)
        #[arg(short, long)]
        target_langs: String,
    },

    /// List the supported language catalog
    Languages,

    /// Write a default configuration file
    Init {
        /// Destination path for the configuration file
        #[arg(short, long, default_value = "config.toml")]
        path: PathBuf,
    },
}
