//! Error types for chain interaction.

use std::time::Duration;

use alloy::{
    primitives::{Address, TxHash},
    transports::{RpcError, TransportError},
};
use stakelock_contract::EventError;
use thiserror::Error;

/// Unified error type for transaction submission, confirmation and event
/// reconciliation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The RPC endpoint could not be reached at all.
    #[error("rpc endpoint unreachable: {0}")]
    Connection(String),

    /// The RPC endpoint answered with a failure that is not a revert.
    #[error("rpc request failed: {0}")]
    Rpc(String),

    /// The ledger rejected the transaction's nonce, which means another
    /// transaction from the same signer is already in flight.
    #[error("nonce conflict for sender {sender}: {message}")]
    NonceConflict {
        /// The signer whose nonce sequence collided.
        sender: Address,

        /// The ledger's own description of the collision.
        message: String,
    },

    /// The ledger included the transaction and rejected it.
    #[error("transaction {tx_hash} reverted: {reason}")]
    Reverted {
        /// The rejected transaction.
        tx_hash: TxHash,

        /// Revert reason replayed from the failing block, or "unknown".
        reason: String,
    },

    /// No receipt appeared within the configured deadline. The transaction
    /// may still confirm later; the outcome is unknown, not failed.
    #[error("no receipt for transaction {tx_hash} within {timeout:?}, outcome unknown")]
    ConfirmationTimeout {
        /// The broadcast transaction to re-query before assuming anything.
        tx_hash: TxHash,

        /// How long the submitter polled before giving up.
        timeout: Duration,
    },

    /// The transaction could not be assembled or signed locally.
    #[error("could not build transaction: {0}")]
    IncompleteTransaction(String),

    /// A confirmed receipt or queried log failed event reconciliation.
    #[error(transparent)]
    Event(#[from] EventError),
}

/// Error type for read-only ledger queries.
///
/// Queries are never retried here; a transient failure is the caller's to
/// see and to act on.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The RPC call itself failed.
    #[error("{query} query failed: {message}")]
    Rpc {
        /// Name of the contract read that failed.
        query: &'static str,

        /// Underlying transport or ledger failure.
        message: String,
    },

    /// The ledger answered with bytes that do not decode as the declared
    /// return type.
    #[error("{query} query returned undecodable data: {source}")]
    Decode {
        /// Name of the contract read that failed.
        query: &'static str,

        /// The decoding failure.
        source: alloy::sol_types::Error,
    },
}

/// Splits a transport error into unreachable-endpoint and everything-else.
pub(crate) fn map_transport(err: TransportError) -> ClientError {
    match &err {
        RpcError::Transport(_) => ClientError::Connection(err.to_string()),
        _ => ClientError::Rpc(err.to_string()),
    }
}

/// Maps a broadcast failure, picking out nonce collisions from the ledger's
/// error text.
pub(crate) fn map_broadcast(sender: Address, err: TransportError) -> ClientError {
    if let Some(payload) = err.as_error_resp() {
        let message = payload.message.to_lowercase();
        if message.contains("nonce too low")
            || message.contains("already known")
            || message.contains("replacement transaction underpriced")
        {
            return ClientError::NonceConflict {
                sender,
                message: payload.message.to_string(),
            };
        }
    }
    map_transport(err)
}

#[cfg(test)]
mod tests {
    use alloy::rpc::json_rpc::ErrorPayload;
    use stakelock_test_utils::generate_address;

    use super::*;

    fn ledger_error(message: &str) -> TransportError {
        RpcError::ErrorResp(ErrorPayload {
            code: -32000,
            message: message.to_owned().into(),
            data: None,
        })
    }

    #[test]
    fn test_nonce_collision_detected() {
        let sender = generate_address();
        let err = map_broadcast(sender, ledger_error("nonce too low: next nonce 7, tx nonce 6"));
        assert!(
            matches!(err, ClientError::NonceConflict { sender: s, .. } if s == sender),
            "nonce collisions must map to NonceConflict"
        );

        let err = map_broadcast(sender, ledger_error("already known"));
        assert!(matches!(err, ClientError::NonceConflict { .. }));
    }

    #[test]
    fn test_other_ledger_errors_stay_rpc() {
        let err = map_broadcast(generate_address(), ledger_error("insufficient funds for gas"));
        assert!(
            matches!(err, ClientError::Rpc(_)),
            "non-nonce failures must not be misreported as conflicts"
        );
    }
}
