//! Error types for the lifecycle coordinator.

use alloy::primitives::{Address, U256};
use stakelock_client::{ClientError, QueryError};
use stakelock_contract::EventError;
use stakelock_primitives::IdentityError;
use thiserror::Error;

use crate::state::TransitionError;

/// Unified error type for everything that can happen while coordinating a
/// collateral operation.
///
/// Pre-flight failures (`Identity`, `InvalidAmount`, `InsufficientCollateral`,
/// `UnauthorizedCaller`, `TrusteeMismatch`, `Transition`) are raised before
/// any gas is spent. Everything else carries the underlying chain failure.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A malformed identity was rejected before any network call.
    #[error("invalid identity: {0}")]
    Identity(#[from] IdentityError),

    /// A malformed amount was rejected before any network call.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The amount is below the ledger's configured minimum increase.
    #[error("deposit of {amount} is below the minimum collateral increase of {minimum}")]
    InsufficientCollateral {
        /// The offered amount.
        amount: U256,

        /// The ledger's configured minimum.
        minimum: U256,
    },

    /// A trustee-only operation was attempted by someone else.
    #[error("caller {caller} is not the configured trustee {trustee}")]
    UnauthorizedCaller {
        /// The signer that attempted the operation.
        caller: Address,

        /// The authority the ledger is configured with.
        trustee: Address,
    },

    /// The trustee the depositor expected is not the one the ledger names.
    #[error("ledger names trustee {actual}, expected {expected}")]
    TrusteeMismatch {
        /// The trustee the caller intended to deposit under.
        expected: Address,

        /// The trustee the ledger is configured with.
        actual: Address,
    },

    /// A reclaim transition that the local view already knows is illegal.
    #[error("invalid reclaim transition: {0}")]
    Transition(#[from] TransitionError),

    /// The justification content could not be fetched for checksumming.
    #[error("failed to fetch justification {url}: {source}")]
    Justification {
        /// The justification URL that was being fetched.
        url: String,

        /// The underlying HTTP failure.
        source: reqwest::Error,
    },

    /// Submission, confirmation or reconciliation failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A read-only ledger query failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A confirmed receipt lacked its expected event.
    #[error(transparent)]
    Event(#[from] EventError),
}
