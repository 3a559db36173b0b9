//! This crate provides test-utilities for the stakelock workspace.
//!
//! These utilities generate arbitrary identities, ledger coordinates and raw
//! logs so that decoding and state-machine tests do not need a running chain.

use alloy::{
    primitives::{Address, LogData, TxHash, U256},
    rpc::types::Log,
};
use rand::{rngs::OsRng, Rng};
use stakelock_primitives::{ExecutorId, Hotkey, Md5Checksum};
use uuid::Uuid;

/// Generates a random settlement-layer address.
pub fn generate_address() -> Address {
    let mut raw = [0u8; 20];
    OsRng.fill(&mut raw);
    Address::from(raw)
}

/// Generates a random executor identifier.
pub fn generate_executor_id() -> ExecutorId {
    let mut raw = [0u8; 16];
    OsRng.fill(&mut raw);
    ExecutorId(Uuid::from_bytes(raw))
}

/// Generates a random consensus-layer hotkey.
pub fn generate_hotkey() -> Hotkey {
    let mut raw = [0u8; 32];
    OsRng.fill(&mut raw);
    Hotkey(raw)
}

/// Generates a random justification checksum.
pub fn generate_checksum() -> Md5Checksum {
    let mut raw = [0u8; 16];
    OsRng.fill(&mut raw);
    Md5Checksum(raw.into())
}

/// Generates a random transaction hash.
pub fn generate_tx_hash() -> TxHash {
    let mut raw = [0u8; 32];
    OsRng.fill(&mut raw);
    TxHash::from(raw)
}

/// Generates a random reclaim request id.
pub fn generate_request_id() -> U256 {
    U256::from(OsRng.gen::<u64>())
}

/// Wraps raw event data into an RPC log pinned to the given ledger
/// coordinates.
pub fn log_with_coordinates(
    address: Address,
    data: LogData,
    block_number: u64,
    log_index: u64,
) -> Log {
    Log {
        inner: alloy::primitives::Log { address, data },
        block_number: Some(block_number),
        log_index: Some(log_index),
        transaction_hash: Some(generate_tx_hash()),
        ..Default::default()
    }
}
