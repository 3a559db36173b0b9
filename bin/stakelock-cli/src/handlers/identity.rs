//! Handlers for identity mapping and native transfers.

use anyhow::Result;
use stakelock_primitives::address_to_ss58;

use crate::cli::{HotkeyAddressArgs, MapHotkeyArgs, TransferSs58Args};

pub(crate) async fn handle_map_hotkey(args: MapHotkeyArgs) -> Result<()> {
    let coordinator = super::coordinator(&args.conn, &args.signer)?;

    let tx_hash = coordinator.map_hotkey(args.hotkey, args.address).await?;

    println!("Mapped hotkey {} to {}", args.hotkey, args.address);
    println!("Transaction: {tx_hash}");

    Ok(())
}

pub(crate) async fn handle_hotkey_address(args: HotkeyAddressArgs) -> Result<()> {
    let client = super::chain_client(&args.conn)?;

    match client.hotkey_to_address(args.hotkey).await? {
        Some(address) => {
            let format = client.params().ss58_format;
            println!("Settlement address for hotkey {}: {address}", args.hotkey);
            println!("Native account: {}", address_to_ss58(address, format));
        }
        None => println!("No settlement address mapped to hotkey {}", args.hotkey),
    }

    Ok(())
}

pub(crate) async fn handle_transfer_ss58(args: TransferSs58Args) -> Result<()> {
    let coordinator = super::coordinator(&args.conn, &args.signer)?;
    let amount = super::parse_amount(&args.amount)?;

    let tx_hash = coordinator
        .transfer_to_ss58(&args.recipient, amount)
        .await?;

    println!("Sent {} to {}", args.amount, args.recipient);
    println!("Transaction: {tx_hash}");

    Ok(())
}
