// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! BridgeOS - a translated-messaging relay between managers and workers.
//!
//! Binary entry point. One process per bot slot (`bridgeos serve` with
//! `BOT_ID=bot1`..`bot5`) plus one webhook receiver (`bridgeos webhook`),
//! all sharing one PostgreSQL database.

mod serve;
mod webhook;

use clap::{Parser, Subcommand};

/// BridgeOS - a translated-messaging relay.
#[derive(Parser, Debug)]
#[command(name = "bridgeos", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one bot front-end for the slot named by BOT_ID.
    Serve,
    /// Run the billing webhook receiver.
    Webhook,
    /// Apply schema migrations and exit.
    Migrate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve => serve::run_serve().await,
        Commands::Webhook => webhook::run_webhook().await,
        Commands::Migrate => serve::run_migrate().await,
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
