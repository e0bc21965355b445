//! Record commands

pub mod handler;

use clap::{Args, ValueEnum};

pub use handler::{CommandContext, handle_create, handle_delete, handle_list, handle_lookup, handle_show, handle_update};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Object type, e.g. Account
    pub object_type: String,

    /// Only records containing this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Sort by this column
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    #[arg(short, long, default_value_t = 1)]
    pub page: usize,

    #[arg(long)]
    pub page_size: Option<usize>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub object_type: String,
    pub id: String,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    pub object_type: String,

    /// Field assignment, repeatable
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub assignments: Vec<String>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub object_type: String,
    pub id: String,

    /// Field assignment, repeatable; an empty value clears the field
    #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
    pub assignments: Vec<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub object_type: String,
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct LookupArgs {
    pub object_type: String,

    /// Lookup field, e.g. ParentAccountId
    pub field: String,

    pub term: String,

    /// Search from the edit form of this record instead of the create form
    #[arg(long)]
    pub record: Option<String>,
}
