//! Handlers for the deposit and slash commands.

use alloy::primitives::utils::format_ether;
use anyhow::Result;
use tracing::info;

use crate::cli::{DepositArgs, SlashArgs};

pub(crate) async fn handle_deposit(args: DepositArgs) -> Result<()> {
    let coordinator = super::coordinator(&args.conn, &args.signer)?;
    let amount = super::parse_amount(&args.amount)?;
    info!(account = %coordinator.sender(), "using account");

    let confirmed = coordinator
        .deposit(args.executor, amount, args.trustee)
        .await?;

    println!(
        "Deposited {} for executor {}",
        format_ether(confirmed.event.amount),
        confirmed.event.executor
    );
    println!("Transaction: {}", confirmed.tx_hash);
    println!("Gas used: {}", confirmed.gas_used);

    Ok(())
}

pub(crate) async fn handle_slash(args: SlashArgs) -> Result<()> {
    let coordinator = super::coordinator(&args.conn, &args.signer)?;
    let amount = super::parse_amount(&args.amount)?;

    let confirmed = coordinator
        .slash(args.miner, args.executor, amount, &args.url)
        .await?;

    println!(
        "Slashed {} from miner {} (executor {})",
        format_ether(confirmed.event.amount),
        confirmed.event.account,
        confirmed.event.executor
    );
    println!("Justification: {} ({})", confirmed.event.url, confirmed.event.checksum);
    println!("Transaction: {}", confirmed.tx_hash);

    Ok(())
}
