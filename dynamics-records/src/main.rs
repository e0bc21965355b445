mod cli;

use anyhow::{Context, Result};
use clap::Parser;

use cli::commands::records::{self, CommandContext};
use cli::{Cli, Commands};
use dynamics_records::BrowserConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = BrowserConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    log::debug!("Using store {}", cli.store.display());
    let context = CommandContext::new(cli.store, config);

    match cli.command {
        Commands::List(args) => records::handle_list(&context, args).await,
        Commands::Show(args) => records::handle_show(&context, args).await,
        Commands::Create(args) => records::handle_create(&context, args).await,
        Commands::Update(args) => records::handle_update(&context, args).await,
        Commands::Delete(args) => records::handle_delete(&context, args).await,
        Commands::Lookup(args) => records::handle_lookup(&context, args).await,
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug for this crate with `--verbose`
fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose && std::env::var_os("RUST_LOG").is_none() {
        builder.filter_module("dynamics_records", log::LevelFilter::Debug);
    }
    builder.init();
}
