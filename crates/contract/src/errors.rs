//! Error types for event reconciliation.

use alloy::primitives::{TxHash, B256};
use thiserror::Error;

/// Unified error type for decoding ledger logs into domain events.
///
/// A confirmed receipt that lacks its expected event, or a log whose topic
/// does not match the queried signature, signals a protocol-version bug and
/// is always surfaced, never skipped.
#[derive(Debug, Error)]
pub enum EventError {
    /// The log's first topic did not match the queried event's signature
    /// hash.
    #[error("log signature mismatch: expected {expected}, got {actual}")]
    SignatureMismatch {
        /// Signature hash of the event kind that was queried.
        expected: B256,

        /// Topic actually present on the log.
        actual: B256,
    },

    /// The log carried no topics at all.
    #[error("log has no event signature topic")]
    MissingTopic,

    /// The log payload did not decode against the declared event structure.
    #[error("failed to decode event payload: {0}")]
    Decode(#[from] alloy::sol_types::Error),

    /// The node returned a log without the metadata needed to order it.
    #[error("log is missing metadata field: {0}")]
    MissingMetadata(&'static str),

    /// A confirmed receipt did not contain the expected event.
    #[error("no {event} event found in receipt of transaction {tx_hash}")]
    NotInReceipt {
        /// Solidity signature of the expected event.
        event: &'static str,

        /// The confirmed transaction whose receipt was scanned.
        tx_hash: TxHash,
    },
}
