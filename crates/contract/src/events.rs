//! Typed domain events reconciled from the ledger's logs.
//!
//! Each event kind has exactly one decoding rule, fixed by the protocol
//! declaration in the crate root: the reclaim request id is the integer value
//! of its 32-byte topic word, indexed addresses are the low-order 20 bytes of
//! theirs, and amounts, expiration times, URLs and checksums come out of the
//! data segment. A log whose signature topic does not match the queried kind
//! is a hard decode error.

use alloy::{
    primitives::{Address, U256},
    rpc::types::{Log, TransactionReceipt},
    sol_types::SolEvent,
};
use serde::{Deserialize, Serialize};
use stakelock_primitives::{ExecutorId, Md5Checksum};

use crate::{errors::EventError, Collateral};

/// The event kinds emitted by the collateral program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Collateral added to an executor's account.
    Deposit,

    /// Collateral seized by the trustee.
    Slashed,

    /// A reclaim request was opened and its deny window started.
    ReclaimProcessStarted,

    /// A reclaim request was denied by the trustee inside its window.
    Denied,

    /// A reclaim request settled and the funds left the account.
    Reclaimed,
}

impl EventKind {
    /// The keccak-256 hash of the event's declared signature, as found in
    /// topic zero of every matching log.
    pub const fn signature_hash(&self) -> alloy::primitives::B256 {
        match self {
            Self::Deposit => Collateral::Deposit::SIGNATURE_HASH,
            Self::Slashed => Collateral::Slashed::SIGNATURE_HASH,
            Self::ReclaimProcessStarted => Collateral::ReclaimProcessStarted::SIGNATURE_HASH,
            Self::Denied => Collateral::Denied::SIGNATURE_HASH,
            Self::Reclaimed => Collateral::Reclaimed::SIGNATURE_HASH,
        }
    }
}

/// Collateral added to an executor's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEvent {
    /// The depositing miner.
    pub account: Address,

    /// The executor the deposit is bound to.
    pub executor: ExecutorId,

    /// Deposited amount in the smallest unit.
    pub amount: U256,
}

/// Collateral seized by the trustee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashedEvent {
    /// The slashed miner.
    pub account: Address,

    /// The executor whose account was debited.
    pub executor: ExecutorId,

    /// Seized amount; the ledger caps it at the live balance.
    pub amount: U256,

    /// Justification URL published by the trustee.
    pub url: String,

    /// Integrity digest of the justification content.
    pub checksum: Md5Checksum,
}

/// A reclaim request was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclaimStartedEvent {
    /// Ledger-assigned monotonic request id.
    pub reclaim_request_id: U256,

    /// The requesting depositor.
    pub account: Address,

    /// Amount to be released at finalization.
    pub amount: U256,

    /// Unix time after which the request becomes finalizable.
    pub expiration_time: u64,

    /// Justification URL published by the requester.
    pub url: String,

    /// Integrity digest of the justification content.
    pub checksum: Md5Checksum,
}

/// A reclaim request was denied inside its window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeniedEvent {
    /// The denied request.
    pub reclaim_request_id: U256,

    /// Justification URL published by the trustee.
    pub url: String,

    /// Integrity digest of the justification content.
    pub checksum: Md5Checksum,
}

/// A reclaim request settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclaimedEvent {
    /// The finalized request.
    pub reclaim_request_id: U256,

    /// The depositor whose account was debited.
    pub account: Address,

    /// Released amount.
    pub amount: U256,
}

/// Payload of one decoded ledger event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    /// See [`DepositEvent`].
    Deposit(DepositEvent),

    /// See [`SlashedEvent`].
    Slashed(SlashedEvent),

    /// See [`ReclaimStartedEvent`].
    ReclaimProcessStarted(ReclaimStartedEvent),

    /// See [`DeniedEvent`].
    Denied(DeniedEvent),

    /// See [`ReclaimedEvent`].
    Reclaimed(ReclaimedEvent),
}

/// One decoded event with the ledger coordinates needed to order it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralEvent {
    /// Block the event was emitted in.
    pub block_number: u64,

    /// Position of the log within its block.
    pub log_index: u64,

    /// The decoded payload.
    pub payload: EventPayload,
}

impl CollateralEvent {
    /// Total order of events on the ledger: ascending block, then log index.
    pub const fn ordering_key(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }
}

impl From<Collateral::Deposit> for DepositEvent {
    fn from(ev: Collateral::Deposit) -> Self {
        Self {
            account: ev.account,
            executor: ev.executorId.into(),
            amount: ev.amount,
        }
    }
}

impl From<Collateral::Slashed> for SlashedEvent {
    fn from(ev: Collateral::Slashed) -> Self {
        Self {
            account: ev.account,
            executor: ev.executorId.into(),
            amount: ev.amount,
            url: ev.url,
            checksum: ev.urlContentMd5Checksum.into(),
        }
    }
}

impl From<Collateral::ReclaimProcessStarted> for ReclaimStartedEvent {
    fn from(ev: Collateral::ReclaimProcessStarted) -> Self {
        Self {
            reclaim_request_id: ev.reclaimRequestId,
            account: ev.account,
            amount: ev.amount,
            expiration_time: ev.expirationTime,
            url: ev.url,
            checksum: ev.urlContentMd5Checksum.into(),
        }
    }
}

impl From<Collateral::Denied> for DeniedEvent {
    fn from(ev: Collateral::Denied) -> Self {
        Self {
            reclaim_request_id: ev.reclaimRequestId,
            url: ev.url,
            checksum: ev.urlContentMd5Checksum.into(),
        }
    }
}

impl From<Collateral::Reclaimed> for ReclaimedEvent {
    fn from(ev: Collateral::Reclaimed) -> Self {
        Self {
            reclaim_request_id: ev.reclaimRequestId,
            account: ev.account,
            amount: ev.amount,
        }
    }
}

/// Decodes a raw log as the given event kind.
///
/// The log's signature topic must match the kind being queried; anything
/// else is a decode error, never a silent skip.
pub fn decode_log(kind: EventKind, log: &Log) -> Result<CollateralEvent, EventError> {
    let topic = log.topic0().ok_or(EventError::MissingTopic)?;
    let expected = kind.signature_hash();
    if *topic != expected {
        return Err(EventError::SignatureMismatch {
            expected,
            actual: *topic,
        });
    }

    let payload = match kind {
        EventKind::Deposit => {
            EventPayload::Deposit(Collateral::Deposit::decode_log(&log.inner)?.data.into())
        }
        EventKind::Slashed => {
            EventPayload::Slashed(Collateral::Slashed::decode_log(&log.inner)?.data.into())
        }
        EventKind::ReclaimProcessStarted => EventPayload::ReclaimProcessStarted(
            Collateral::ReclaimProcessStarted::decode_log(&log.inner)?
                .data
                .into(),
        ),
        EventKind::Denied => {
            EventPayload::Denied(Collateral::Denied::decode_log(&log.inner)?.data.into())
        }
        EventKind::Reclaimed => {
            EventPayload::Reclaimed(Collateral::Reclaimed::decode_log(&log.inner)?.data.into())
        }
    };

    Ok(CollateralEvent {
        block_number: log
            .block_number
            .ok_or(EventError::MissingMetadata("block_number"))?,
        log_index: log
            .log_index
            .ok_or(EventError::MissingMetadata("log_index"))?,
        payload,
    })
}

/// Extracts the expected event from a confirmed receipt's logs.
///
/// Used after every state-changing operation: a success receipt without its
/// event means the client and the deployed program disagree about the
/// protocol, which is fatal.
pub fn event_from_receipt<E: SolEvent>(receipt: &TransactionReceipt) -> Result<E, EventError> {
    for log in receipt.inner.logs() {
        if log.topic0() == Some(&E::SIGNATURE_HASH) {
            return Ok(E::decode_log(&log.inner)?.data);
        }
    }

    Err(EventError::NotInReceipt {
        event: E::SIGNATURE,
        tx_hash: receipt.transaction_hash,
    })
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;
    use stakelock_test_utils::{
        generate_address, generate_checksum, generate_executor_id, log_with_coordinates,
    };

    use super::*;

    #[test]
    fn test_decode_deposit_log() {
        let account = generate_address();
        let executor = generate_executor_id();

        let raw = Collateral::Deposit {
            account,
            executorId: executor.into(),
            amount: U256::from(10_000_000_000_000_000u64),
        };
        let log = log_with_coordinates(generate_address(), raw.encode_log_data(), 123_456, 7);

        let event = decode_log(EventKind::Deposit, &log).expect("deposit log must decode");
        assert_eq!(event.block_number, 123_456);
        assert_eq!(event.log_index, 7);
        assert_eq!(
            event.payload,
            EventPayload::Deposit(DepositEvent {
                account,
                executor,
                amount: U256::from(10_000_000_000_000_000u64),
            })
        );
    }

    #[test]
    fn test_decode_reclaim_started_log() {
        let account = generate_address();
        let checksum = generate_checksum();

        let raw = Collateral::ReclaimProcessStarted {
            reclaimRequestId: U256::from(18),
            account,
            amount: U256::from(5_000u64),
            expirationTime: 17_234_567,
            url: "https://example.com/reclaim".to_owned(),
            urlContentMd5Checksum: checksum.into(),
        };
        let log = log_with_coordinates(generate_address(), raw.encode_log_data(), 123_456, 0);

        let event =
            decode_log(EventKind::ReclaimProcessStarted, &log).expect("reclaim log must decode");
        let EventPayload::ReclaimProcessStarted(started) = event.payload else {
            panic!("decoded payload must be a reclaim start");
        };
        assert_eq!(started.reclaim_request_id, U256::from(18));
        assert_eq!(started.account, account);
        assert_eq!(started.amount, U256::from(5_000u64));
        assert_eq!(started.expiration_time, 17_234_567);
        assert_eq!(started.url, "https://example.com/reclaim");
        assert_eq!(started.checksum, checksum);
    }

    #[test]
    fn test_signature_mismatch_is_a_hard_error() {
        let raw = Collateral::Deposit {
            account: generate_address(),
            executorId: generate_executor_id().into(),
            amount: U256::from(1u64),
        };
        let log = log_with_coordinates(generate_address(), raw.encode_log_data(), 1, 0);

        let err = decode_log(EventKind::Slashed, &log).expect_err("wrong kind must not decode");
        assert!(
            matches!(err, EventError::SignatureMismatch { expected, actual }
                if expected == EventKind::Slashed.signature_hash()
                    && actual == EventKind::Deposit.signature_hash()),
            "mismatch must name both signatures"
        );
    }

    #[test]
    fn test_decode_is_idempotent() {
        let raw = Collateral::Denied {
            reclaimRequestId: U256::from(42),
            url: "https://example.com/deny".to_owned(),
            urlContentMd5Checksum: generate_checksum().into(),
        };
        let log = log_with_coordinates(generate_address(), raw.encode_log_data(), 99, 3);

        let first = decode_log(EventKind::Denied, &log).unwrap();
        let second = decode_log(EventKind::Denied, &log).unwrap();
        assert_eq!(first, second, "same log must decode identically");
    }
}
