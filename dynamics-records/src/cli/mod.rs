pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::records::{CreateArgs, DeleteArgs, ListArgs, LookupArgs, ShowArgs, UpdateArgs};

#[derive(Parser)]
#[command(name = "dynamics-records", version)]
#[command(about = "Browse and edit records of a JSON record store")]
pub struct Cli {
    /// Record store fixture file
    #[arg(long, global = true, default_value = "records.json")]
    pub store: PathBuf,

    /// Configuration file (defaults to <config dir>/dynamics-records/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List records of an object type
    List(ListArgs),
    /// Show one record as its edit form
    Show(ShowArgs),
    /// Create a record
    Create(CreateArgs),
    /// Update fields of a record
    Update(UpdateArgs),
    /// Delete a record
    Delete(DeleteArgs),
    /// Search lookup candidates for a field
    Lookup(LookupArgs),
}
