//! CLI for operating the stakelock collateral protocol.

mod cli;
mod handlers;

use anyhow::{Error, Result};
use clap::Parser;
use stakelock_common::logging::{self, LoggerConfig};

use crate::handlers::{identity, query, reclaim, stake};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = dotenvy::dotenv();

    let mut logger_config = LoggerConfig::for_service("stakelock-cli");
    if let Some(otlp_url) = logging::otlp_url_from_env() {
        logger_config = logger_config.with_otlp_url(otlp_url);
    }
    logging::init(logger_config);

    let cli = cli::Cli::parse();
    match cli.command {
        cli::Commands::Deposit(args) => stake::handle_deposit(args).await,
        cli::Commands::Slash(args) => stake::handle_slash(args).await,
        cli::Commands::Reclaim(args) => reclaim::handle_reclaim(args).await,
        cli::Commands::Deny(args) => reclaim::handle_deny(args).await,
        cli::Commands::Finalize(args) => reclaim::handle_finalize(args).await,
        cli::Commands::MapHotkey(args) => identity::handle_map_hotkey(args).await,
        cli::Commands::HotkeyAddress(args) => identity::handle_hotkey_address(args).await,
        cli::Commands::TransferSs58(args) => identity::handle_transfer_ss58(args).await,
        cli::Commands::Balance(args) => query::handle_balance(args).await,
        cli::Commands::EligibleExecutors(args) => query::handle_eligible_executors(args).await,
        cli::Commands::Events(args) => query::handle_events(args).await,
    }
}
