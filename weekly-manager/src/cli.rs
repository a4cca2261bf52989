use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "weekly-manager")]
#[command(about = "Manage weekly meeting notes, projects and todos of supervised students")]
pub struct Cli {
    /// Document to open instead of the configured data file
    pub file: Option<PathBuf>,

    /// Disable saving after every change
    #[arg(long)]
    pub no_autosave: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print students, projects with progress and weekly counts
    Summary,
    /// Print open todos of the whole document
    Todos,
    /// Load the document, migrate it to the current format and write it back
    Migrate,
    /// Read JSON commands from stdin, one per line, and answer each with a JSON state line
    Run,
    /// Print config path and create default file if missing
    ConfigPath,
}
