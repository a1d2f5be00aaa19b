//! krepo - Kodi add-on repository builder CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use krepo_cli::cmd;
use krepo_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flags
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let root = cli.root.as_path();
    match cli.command {
        Commands::Generate { json } => cmd::generate::generate(root, json, cli.quiet),
        Commands::Update {
            sources,
            token,
            generate,
        } => cmd::update::update(root, sources.as_deref(), token, generate, cli.quiet).await,
        Commands::Verify => cmd::verify::verify(root),
        Commands::Platforms => {
            cmd::platforms::platforms();
            Ok(())
        }
    }
}
