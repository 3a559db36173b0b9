//! Handlers for read-only queries and event listing.

use alloy::primitives::utils::format_ether;
use anyhow::{bail, Result};
use stakelock_client::EventReconciler;
use stakelock_contract::EventKind;

use crate::cli::{BalanceArgs, EligibleExecutorsArgs, EventsArgs};

pub(crate) async fn handle_balance(args: BalanceArgs) -> Result<()> {
    let client = super::chain_client(&args.conn)?;

    let balance = client.balance_of(args.miner, args.executor).await?;

    println!(
        "Collateral for miner {} / executor {}: {}",
        args.miner,
        args.executor,
        format_ether(balance)
    );

    Ok(())
}

pub(crate) async fn handle_eligible_executors(args: EligibleExecutorsArgs) -> Result<()> {
    let client = super::chain_client(&args.conn)?;

    let executors = client.eligible_executors(args.miner).await?;

    if executors.is_empty() {
        println!("No eligible executors for miner {}", args.miner);
    } else {
        println!("Eligible executors for miner {}:", args.miner);
        for executor in executors {
            println!("  {executor}");
        }
    }

    Ok(())
}

pub(crate) async fn handle_events(args: EventsArgs) -> Result<()> {
    let client = super::chain_client(&args.conn)?;
    let reconciler = EventReconciler::new(client);

    let kinds = match args.kind.as_deref() {
        Some(kind) => vec![parse_kind(kind)?],
        None => vec![
            EventKind::Deposit,
            EventKind::Slashed,
            EventKind::ReclaimProcessStarted,
            EventKind::Denied,
            EventKind::Reclaimed,
        ],
    };

    let events = reconciler
        .events_in_range(&kinds, args.from_block, args.to_block)
        .await?;

    println!("{}", serde_json::to_string_pretty(&events)?);

    Ok(())
}

fn parse_kind(kind: &str) -> Result<EventKind> {
    Ok(match kind {
        "deposit" => EventKind::Deposit,
        "slashed" => EventKind::Slashed,
        "reclaim-started" => EventKind::ReclaimProcessStarted,
        "denied" => EventKind::Denied,
        "reclaimed" => EventKind::Reclaimed,
        other => bail!("unknown event kind: {other}"),
    })
}
