//! # Airlift
//!
//! Command-line client for an over-the-air update server for hybrid apps.
//! It keeps app/platform/channel records mirrored between the project
//! configuration file and the server, and publishes incremental releases:
//! the local web-asset tree is fingerprinted file by file, the server is
//! asked which of those fingerprints it is missing, and only the changed
//! files are packaged into a zip and uploaded alongside a release manifest.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

use clap::Parser;
use commands::{Cli, Commands};

/// Update archive construction utilities.
mod archiver;

/// HTTP client for the update server API.
mod client;

/// CLI subcommands.
mod commands;

/// CLI-specific configuration (authentication, project).
mod config;

/// `--extra.*` manifest value parsing.
mod extras;

/// Asset tree fingerprinting.
mod filemap;

/// Release publishing pipeline.
mod pipeline;

/// Shared test helpers.
#[cfg(test)]
mod testing;

/// CLI entrypoint.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => commands::init(args)?,
        Commands::Login(args) => commands::login(args).await?,
        Commands::Logout => commands::logout().await?,
        Commands::App(args) => commands::app(args).await?,
        Commands::Platform(args) => commands::platform(args).await?,
        Commands::Channel(args) => commands::channel(args).await?,
        Commands::Deploy(args) => commands::deploy(args).await?,
    }

    Ok(())
}
