//! Handlers for the reclaim lifecycle commands.

use alloy::{primitives::utils::format_ether, providers::Provider};
use anyhow::{Context, Result};
use stakelock_coordinator::CollateralCoordinator;

use crate::cli::{DenyArgs, FinalizeArgs, ReclaimArgs};

pub(crate) async fn handle_reclaim(args: ReclaimArgs) -> Result<()> {
    let coordinator = super::coordinator(&args.conn, &args.signer)?;
    let amount = super::parse_amount(&args.amount)?;

    let confirmed = coordinator
        .reclaim(amount, args.executor, &args.url)
        .await?;

    println!(
        "Reclaim request {} opened for {}",
        confirmed.event.reclaim_request_id,
        format_ether(confirmed.event.amount)
    );
    println!(
        "Deny window closes at unix time {}",
        confirmed.event.expiration_time
    );
    println!("Transaction: {}", confirmed.tx_hash);

    Ok(())
}

pub(crate) async fn handle_deny(args: DenyArgs) -> Result<()> {
    let coordinator = super::coordinator(&args.conn, &args.signer)?;
    sync_view(&coordinator, args.sync_from).await?;

    let confirmed = coordinator.deny(args.request_id, &args.url).await?;

    println!("Denied reclaim request {}", confirmed.event.reclaim_request_id);
    println!("Transaction: {}", confirmed.tx_hash);

    Ok(())
}

pub(crate) async fn handle_finalize(args: FinalizeArgs) -> Result<()> {
    let coordinator = super::coordinator(&args.conn, &args.signer)?;
    sync_view(&coordinator, args.sync_from).await?;

    let confirmed = coordinator.finalize(args.request_id).await?;

    println!(
        "Finalized reclaim request {}: {} released to {}",
        confirmed.event.reclaim_request_id,
        format_ether(confirmed.event.amount),
        confirmed.event.account
    );
    println!("Transaction: {}", confirmed.tx_hash);

    Ok(())
}

/// Folds the reclaim lifecycle from `sync_from` up to the chain head into
/// the coordinator's local view, so pre-flight checks have something to
/// check against.
async fn sync_view(coordinator: &CollateralCoordinator, sync_from: Option<u64>) -> Result<()> {
    let Some(from_block) = sync_from else {
        return Ok(());
    };

    let head = coordinator
        .client()
        .provider()
        .get_block_number()
        .await
        .context("read chain head")?;
    coordinator
        .sync_reclaims(from_block, head)
        .await
        .context("sync reclaim view")?;

    Ok(())
}
