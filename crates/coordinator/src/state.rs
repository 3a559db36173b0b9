//! Local views of the ledger's state, folded from reconciled events.
//!
//! These views exist to fail obviously-doomed operations before gas is spent
//! and to answer listing queries without a contract call per row. They are
//! transient and re-derivable; the ledger alone decides authorization and
//! balances, and a view that has not seen an event simply declines to
//! pre-judge.

use std::collections::BTreeMap;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use stakelock_contract::{events::EventPayload, CollateralEvent};
use stakelock_primitives::{ExecutorId, Md5Checksum};
use thiserror::Error;

/// Lifecycle state of a reclaim request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReclaimState {
    /// Open; the trustee may still deny it.
    Requested,

    /// Denied by the trustee. Terminal.
    Denied,

    /// Settled; the funds have left the account. Terminal.
    Finalized,
}

/// One reclaim request as reconstructed from its lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclaimRequest {
    /// Ledger-assigned monotonic id.
    pub id: U256,

    /// The depositor that opened the request.
    pub requester: Address,

    /// Amount to be released at finalization.
    pub amount: U256,

    /// Justification URL given at request time.
    pub url: String,

    /// Integrity digest of the justification content.
    pub checksum: Md5Checksum,

    /// Unix time after which the request becomes finalizable.
    pub expiration_time: u64,

    /// Current lifecycle state.
    pub state: ReclaimState,

    /// Block in which the request was opened.
    pub created_block: u64,
}

/// A reclaim transition that the ledger would reject.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The event references a request this view has never seen.
    #[error("unknown reclaim request {0}")]
    UnknownRequest(U256),

    /// The request is already in a terminal state.
    #[error("reclaim request {id} is already {state:?}")]
    AlreadyResolved {
        /// The request being transitioned.
        id: U256,

        /// Its terminal state.
        state: ReclaimState,
    },

    /// The deny window has already closed.
    #[error("deny window for request {id} closed at {expired_at}, now {now}")]
    WindowExpired {
        /// The request being denied.
        id: U256,

        /// When its window closed.
        expired_at: u64,

        /// The clock the check ran against.
        now: u64,
    },

    /// The deny window is still open, so the request cannot settle yet.
    #[error("request {id} is finalizable only after {expires_at}, now {now}")]
    WindowStillOpen {
        /// The request being finalized.
        id: U256,

        /// When its window closes.
        expires_at: u64,

        /// The clock the check ran against.
        now: u64,
    },
}

/// All reclaim requests this client has observed, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclaimLedger {
    requests: BTreeMap<U256, ReclaimRequest>,
}

impl ReclaimLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one reconciled event into the view.
    ///
    /// Re-applying an event the view has already seen is a no-op, so
    /// replaying an overlapping block range is safe. A deny or settle for an
    /// unknown request, or a transition out of a terminal state, is an
    /// error: the first can be fixed by syncing the range that contains the
    /// request start, the second means the caller's range was inconsistent.
    pub fn observe(&mut self, event: &CollateralEvent) -> Result<(), TransitionError> {
        match &event.payload {
            EventPayload::ReclaimProcessStarted(started) => {
                self.requests
                    .entry(started.reclaim_request_id)
                    .or_insert_with(|| ReclaimRequest {
                        id: started.reclaim_request_id,
                        requester: started.account,
                        amount: started.amount,
                        url: started.url.clone(),
                        checksum: started.checksum,
                        expiration_time: started.expiration_time,
                        state: ReclaimState::Requested,
                        created_block: event.block_number,
                    });
                Ok(())
            }
            EventPayload::Denied(denied) => {
                self.transition(denied.reclaim_request_id, ReclaimState::Denied)
            }
            EventPayload::Reclaimed(reclaimed) => {
                self.transition(reclaimed.reclaim_request_id, ReclaimState::Finalized)
            }
            EventPayload::Deposit(_) | EventPayload::Slashed(_) => Ok(()),
        }
    }

    fn transition(&mut self, id: U256, next: ReclaimState) -> Result<(), TransitionError> {
        let request = self
            .requests
            .get_mut(&id)
            .ok_or(TransitionError::UnknownRequest(id))?;

        match request.state {
            ReclaimState::Requested => {
                request.state = next;
                Ok(())
            }
            // Replaying the event that put us here is fine; crossing from
            // one terminal state to the other never is.
            state if state == next => Ok(()),
            state => Err(TransitionError::AlreadyResolved { id, state }),
        }
    }

    /// The request with the given id, if observed.
    pub fn get(&self, id: U256) -> Option<&ReclaimRequest> {
        self.requests.get(&id)
    }

    /// All observed requests, ascending by id.
    pub fn requests(&self) -> impl Iterator<Item = &ReclaimRequest> {
        self.requests.values()
    }

    /// Checks that a deny of the given request could still succeed at time
    /// `now`.
    ///
    /// An unknown request passes: the view cannot pre-judge what it has not
    /// seen, and the ledger will enforce its own rules.
    pub fn ensure_deniable(&self, id: U256, now: u64) -> Result<(), TransitionError> {
        let Some(request) = self.requests.get(&id) else {
            return Ok(());
        };

        match request.state {
            ReclaimState::Requested if now < request.expiration_time => Ok(()),
            ReclaimState::Requested => Err(TransitionError::WindowExpired {
                id,
                expired_at: request.expiration_time,
                now,
            }),
            state => Err(TransitionError::AlreadyResolved { id, state }),
        }
    }

    /// Checks that a finalize of the given request could still succeed at
    /// time `now`. Unknown requests pass, as with [`Self::ensure_deniable`].
    pub fn ensure_finalizable(&self, id: U256, now: u64) -> Result<(), TransitionError> {
        let Some(request) = self.requests.get(&id) else {
            return Ok(());
        };

        match request.state {
            ReclaimState::Requested if now >= request.expiration_time => Ok(()),
            ReclaimState::Requested => Err(TransitionError::WindowStillOpen {
                id,
                expires_at: request.expiration_time,
                now,
            }),
            state => Err(TransitionError::AlreadyResolved { id, state }),
        }
    }
}

/// One executor's collateral account as seen through events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorAccount {
    /// Running balance: deposits minus effective slashes.
    pub balance: U256,

    /// Whether the account was slashed down to exactly zero after its most
    /// recent deposit.
    pub slashed_to_zero: bool,
}

/// Per-(miner, executor) balances folded from deposit and slash events.
///
/// Settlements (`Reclaimed`) are not attributed here: the ledger's reclaim
/// events do not name an executor, and authoritative balances always come
/// from the `collaterals` query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollateralView {
    accounts: BTreeMap<(Address, ExecutorId), ExecutorAccount>,
}

impl CollateralView {
    /// Creates an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one reconciled event into the view.
    pub fn observe(&mut self, event: &CollateralEvent) {
        match &event.payload {
            EventPayload::Deposit(deposit) => {
                let account = self
                    .accounts
                    .entry((deposit.account, deposit.executor))
                    .or_insert(ExecutorAccount {
                        balance: U256::ZERO,
                        slashed_to_zero: false,
                    });
                account.balance += deposit.amount;
                account.slashed_to_zero = false;
            }
            EventPayload::Slashed(slashed) => {
                if let Some(account) = self
                    .accounts
                    .get_mut(&(slashed.account, slashed.executor))
                {
                    // The ledger caps the effective slash at the live
                    // balance; mirror that so the view never goes negative.
                    let effective = slashed.amount.min(account.balance);
                    account.balance -= effective;
                    if account.balance.is_zero() {
                        account.slashed_to_zero = true;
                    }
                }
            }
            EventPayload::ReclaimProcessStarted(_)
            | EventPayload::Denied(_)
            | EventPayload::Reclaimed(_) => {}
        }
    }

    /// The account for a `(miner, executor)` pair, if any deposit has been
    /// observed for it.
    pub fn account(&self, miner: Address, executor: ExecutorId) -> Option<&ExecutorAccount> {
        self.accounts.get(&(miner, executor))
    }

    /// Whether an executor currently holds usable collateral: a strictly
    /// positive balance and no slash-to-zero since its last deposit.
    pub fn is_eligible(&self, miner: Address, executor: ExecutorId) -> bool {
        self.account(miner, executor)
            .is_some_and(|account| !account.balance.is_zero() && !account.slashed_to_zero)
    }

    /// The eligible executors of one miner, ascending.
    pub fn eligible_executors(&self, miner: Address) -> Vec<ExecutorId> {
        self.accounts
            .iter()
            .filter(|((owner, executor), _)| {
                *owner == miner && self.is_eligible(miner, *executor)
            })
            .map(|((_, executor), _)| *executor)
            .collect()
    }

    /// All observed accounts, ascending by (miner, executor).
    pub fn accounts(&self) -> impl Iterator<Item = (&(Address, ExecutorId), &ExecutorAccount)> {
        self.accounts.iter()
    }
}

#[cfg(test)]
mod tests {
    use stakelock_contract::events::{
        DeniedEvent, DepositEvent, EventPayload, ReclaimStartedEvent, ReclaimedEvent, SlashedEvent,
    };
    use stakelock_test_utils::{generate_address, generate_checksum, generate_executor_id};

    use super::*;

    fn at(block_number: u64, log_index: u64, payload: EventPayload) -> CollateralEvent {
        CollateralEvent {
            block_number,
            log_index,
            payload,
        }
    }

    fn started(id: u64, requester: Address, expiration_time: u64) -> CollateralEvent {
        at(
            10,
            0,
            EventPayload::ReclaimProcessStarted(ReclaimStartedEvent {
                reclaim_request_id: U256::from(id),
                account: requester,
                amount: U256::from(3_000u64),
                expiration_time,
                url: "https://example.com/reclaim".to_owned(),
                checksum: generate_checksum(),
            }),
        )
    }

    fn denied(id: u64) -> CollateralEvent {
        at(
            11,
            0,
            EventPayload::Denied(DeniedEvent {
                reclaim_request_id: U256::from(id),
                url: "https://example.com/deny".to_owned(),
                checksum: generate_checksum(),
            }),
        )
    }

    fn reclaimed(id: u64, requester: Address) -> CollateralEvent {
        at(
            12,
            0,
            EventPayload::Reclaimed(ReclaimedEvent {
                reclaim_request_id: U256::from(id),
                account: requester,
                amount: U256::from(3_000u64),
            }),
        )
    }

    #[test]
    fn test_reclaim_request_reconstruction() {
        let requester = generate_address();
        let mut ledger = ReclaimLedger::new();
        ledger.observe(&started(42, requester, 1_000)).unwrap();

        let request = ledger.get(U256::from(42)).expect("request must be known");
        assert_eq!(request.requester, requester);
        assert_eq!(request.state, ReclaimState::Requested);
        assert_eq!(request.expiration_time, 1_000);
        assert_eq!(request.created_block, 10);
    }

    #[test]
    fn test_deny_then_finalize_is_rejected() {
        let requester = generate_address();
        let mut ledger = ReclaimLedger::new();
        ledger.observe(&started(1, requester, 1_000)).unwrap();
        ledger.observe(&denied(1)).unwrap();

        let err = ledger
            .observe(&reclaimed(1, requester))
            .expect_err("a denied request must never settle");
        assert_eq!(
            err,
            TransitionError::AlreadyResolved {
                id: U256::from(1),
                state: ReclaimState::Denied,
            }
        );
    }

    #[test]
    fn test_finalize_then_deny_is_rejected() {
        let requester = generate_address();
        let mut ledger = ReclaimLedger::new();
        ledger.observe(&started(1, requester, 1_000)).unwrap();
        ledger.observe(&reclaimed(1, requester)).unwrap();

        let err = ledger
            .observe(&denied(1))
            .expect_err("a settled request must never be denied");
        assert_eq!(
            err,
            TransitionError::AlreadyResolved {
                id: U256::from(1),
                state: ReclaimState::Finalized,
            }
        );
    }

    #[test]
    fn test_event_application_is_idempotent() {
        let requester = generate_address();
        let mut ledger = ReclaimLedger::new();
        ledger.observe(&started(1, requester, 1_000)).unwrap();
        ledger.observe(&denied(1)).unwrap();

        // Replaying an overlapping range delivers the same events again.
        ledger.observe(&started(1, requester, 1_000)).unwrap();
        ledger.observe(&denied(1)).unwrap();

        assert_eq!(
            ledger.get(U256::from(1)).unwrap().state,
            ReclaimState::Denied
        );
        assert_eq!(ledger.requests().count(), 1);
    }

    #[test]
    fn test_lifecycle_event_for_unknown_request() {
        let mut ledger = ReclaimLedger::new();
        let err = ledger.observe(&denied(7)).expect_err("unknown id must error");
        assert_eq!(err, TransitionError::UnknownRequest(U256::from(7)));
    }

    #[test]
    fn test_deny_window_timing() {
        // Deny timeout of 120s starting at t=0.
        let requester = generate_address();
        let mut ledger = ReclaimLedger::new();
        ledger.observe(&started(1, requester, 120)).unwrap();
        let id = U256::from(1);

        assert!(ledger.ensure_deniable(id, 50).is_ok(), "t=50 is inside the window");
        assert_eq!(
            ledger.ensure_deniable(id, 121),
            Err(TransitionError::WindowExpired {
                id,
                expired_at: 120,
                now: 121,
            })
        );
    }

    #[test]
    fn test_finalize_window_timing() {
        let requester = generate_address();
        let mut ledger = ReclaimLedger::new();
        ledger.observe(&started(1, requester, 120)).unwrap();
        let id = U256::from(1);

        assert_eq!(
            ledger.ensure_finalizable(id, 60),
            Err(TransitionError::WindowStillOpen {
                id,
                expires_at: 120,
                now: 60,
            })
        );
        assert!(
            ledger.ensure_finalizable(id, 121).is_ok(),
            "t=121 is past the deny window"
        );
    }

    #[test]
    fn test_terminal_states_block_both_checks() {
        let requester = generate_address();
        let mut ledger = ReclaimLedger::new();
        ledger.observe(&started(1, requester, 120)).unwrap();
        ledger.observe(&denied(1)).unwrap();
        let id = U256::from(1);

        assert!(matches!(
            ledger.ensure_finalizable(id, 500),
            Err(TransitionError::AlreadyResolved { .. })
        ));
        assert!(matches!(
            ledger.ensure_deniable(id, 50),
            Err(TransitionError::AlreadyResolved { .. })
        ));
    }

    #[test]
    fn test_unknown_request_is_not_pre_judged() {
        let ledger = ReclaimLedger::new();
        assert!(ledger.ensure_deniable(U256::from(9), 0).is_ok());
        assert!(ledger.ensure_finalizable(U256::from(9), 0).is_ok());
    }

    fn deposit(miner: Address, executor: ExecutorId, amount: u64) -> CollateralEvent {
        at(
            1,
            0,
            EventPayload::Deposit(DepositEvent {
                account: miner,
                executor,
                amount: U256::from(amount),
            }),
        )
    }

    fn slashed(miner: Address, executor: ExecutorId, amount: u64) -> CollateralEvent {
        at(
            2,
            0,
            EventPayload::Slashed(SlashedEvent {
                account: miner,
                executor,
                amount: U256::from(amount),
                url: "https://example.com/slash".to_owned(),
                checksum: generate_checksum(),
            }),
        )
    }

    #[test]
    fn test_deposit_into_empty_account() {
        let miner = generate_address();
        let executor = generate_executor_id();
        let mut view = CollateralView::new();

        view.observe(&deposit(miner, executor, 10_000));

        let account = view.account(miner, executor).unwrap();
        assert_eq!(
            account.balance,
            U256::from(10_000u64),
            "post-deposit balance must equal the deposit exactly"
        );
        assert!(view.is_eligible(miner, executor));
    }

    #[test]
    fn test_slash_is_capped_at_balance() {
        let miner = generate_address();
        let executor = generate_executor_id();
        let mut view = CollateralView::new();

        view.observe(&deposit(miner, executor, 100));
        view.observe(&slashed(miner, executor, 250));

        let account = view.account(miner, executor).unwrap();
        assert_eq!(account.balance, U256::ZERO, "balance must never go negative");
        assert!(account.slashed_to_zero);
        assert!(!view.is_eligible(miner, executor));
    }

    #[test]
    fn test_new_deposit_restores_eligibility() {
        let miner = generate_address();
        let executor = generate_executor_id();
        let mut view = CollateralView::new();

        view.observe(&deposit(miner, executor, 100));
        view.observe(&slashed(miner, executor, 100));
        assert!(!view.is_eligible(miner, executor));

        view.observe(&deposit(miner, executor, 50));
        assert!(
            view.is_eligible(miner, executor),
            "a fresh deposit must clear the slashed-to-zero mark"
        );
    }

    #[test]
    fn test_eligible_executors_filters_by_miner() {
        let miner = generate_address();
        let other = generate_address();
        let healthy = generate_executor_id();
        let drained = generate_executor_id();
        let mut view = CollateralView::new();

        view.observe(&deposit(miner, healthy, 100));
        view.observe(&deposit(miner, drained, 100));
        view.observe(&slashed(miner, drained, 100));
        view.observe(&deposit(other, generate_executor_id(), 100));

        assert_eq!(view.eligible_executors(miner), vec![healthy]);
    }
}
