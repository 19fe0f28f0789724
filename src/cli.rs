use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ampstory")]
#[command(author, version, about = "Import and serve the media referenced by AMP stories")]
pub struct Cli {
    /// Path to config file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "AMPSTORY_CONFIG")]
    pub config: Option<PathBuf>,

    /// More logging; repeat for trace output. Ignored when RUST_LOG is set
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save a story and import every remote image and video it references
    Import {
        /// Story file, JSON or TOML
        #[arg(required = true)]
        story: PathBuf,
    },

    /// Print the AMP document for a saved story
    Render {
        /// Slug of the saved story
        slug: String,
    },

    /// List the media references in an HTML fragment
    Scan {
        /// HTML file to scan
        #[arg(required = true)]
        file: PathBuf,
    },
}
