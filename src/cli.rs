use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "conform")]
#[command(about = "Schema-driven connector configuration forms in the terminal", long_about = None)]
pub struct Cli {
    /// Field path prefix (overrides `root` from config.toml)
    #[arg(long, global = true)]
    pub root: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the normalized field list as JSON
    Fields { spec: PathBuf },
    /// Print the widgets a form would mount, as JSON
    Render {
        spec: PathBuf,
        /// Saved configuration to populate the form with
        #[arg(long)]
        values: Option<PathBuf>,
    },
    /// Validate a saved configuration against a specification
    Check { spec: PathBuf, values: PathBuf },
    /// Print the configuration produced by defaults alone
    Defaults { spec: PathBuf },
    /// Set the editor theme in config.toml (default, dark or light)
    Theme { name: String },
    /// Edit a configuration interactively
    Edit {
        spec: PathBuf,
        #[arg(long)]
        values: Option<PathBuf>,
        /// Where Ctrl-S writes the configuration (defaults to --values)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
