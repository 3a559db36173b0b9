//! Coordinates the collateral lifecycle against the ledger.
//!
//! Every state-changing operation follows the same path: validate locally
//! (for free), submit through the transaction submitter, wait for the
//! on-ledger outcome, and decode the operation's event out of the confirmed
//! receipt. The coordinator keeps a local, re-derivable view of reclaim
//! requests so that operations the ledger is guaranteed to reject can fail
//! before any gas is spent; the ledger itself remains the only authority.

pub mod errors;
pub mod justification;
pub mod state;

use std::{
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};

use alloy::{
    primitives::{Address, TxHash, U256},
    signers::local::PrivateKeySigner,
};
use stakelock_client::{CallRequest, ChainClient, EventReconciler, TxSubmitter};
use stakelock_contract::{
    event_from_receipt,
    events::{
        DeniedEvent, DepositEvent, EventPayload, ReclaimStartedEvent, ReclaimedEvent, SlashedEvent,
    },
    Collateral, CollateralEvent, EventKind, SubtensorBalanceTransfer,
    BALANCE_TRANSFER_PRECOMPILE,
};
use stakelock_primitives::{ExecutorId, Hotkey};
use tracing::{info, warn};

pub use errors::CoordinatorError;
pub use state::{CollateralView, ReclaimLedger, ReclaimRequest, ReclaimState, TransitionError};

/// A confirmed operation together with the event the ledger emitted for it.
#[derive(Debug, Clone)]
pub struct Confirmed<E> {
    /// The decoded event.
    pub event: E,

    /// The transaction that carried the operation.
    pub tx_hash: TxHash,

    /// Block the transaction confirmed in.
    pub block_number: Option<u64>,

    /// Gas consumed by the transaction.
    pub gas_used: u64,
}

/// Client-side orchestration of deposits, slashes and the reclaim lifecycle.
#[derive(Debug)]
pub struct CollateralCoordinator {
    client: ChainClient,
    submitter: TxSubmitter,
    reconciler: EventReconciler,
    reclaims: Mutex<ReclaimLedger>,
}

impl CollateralCoordinator {
    /// Creates a coordinator acting as the given signer.
    pub fn new(client: ChainClient, signer: PrivateKeySigner) -> Self {
        let submitter = TxSubmitter::new(client.clone(), signer);
        let reconciler = EventReconciler::new(client.clone());
        Self {
            client,
            submitter,
            reconciler,
            reclaims: Mutex::new(ReclaimLedger::new()),
        }
    }

    /// The settlement address this coordinator signs as.
    pub const fn sender(&self) -> Address {
        self.submitter.sender()
    }

    /// The chain client backing this coordinator.
    pub const fn client(&self) -> &ChainClient {
        &self.client
    }

    /// The event reconciler backing this coordinator.
    pub const fn reconciler(&self) -> &EventReconciler {
        &self.reconciler
    }

    /// Deposits collateral for an executor.
    ///
    /// Fails with [`CoordinatorError::InsufficientCollateral`] before
    /// broadcasting anything if the amount is below the ledger's configured
    /// minimum increase. When `expected_trustee` is given, the deposit also
    /// aborts early if the ledger names a different authority than the one
    /// the depositor meant to stake under.
    pub async fn deposit(
        &self,
        executor: ExecutorId,
        amount: U256,
        expected_trustee: Option<Address>,
    ) -> Result<Confirmed<DepositEvent>, CoordinatorError> {
        let minimum = self.client.min_collateral_increase().await?;
        if amount < minimum {
            return Err(CoordinatorError::InsufficientCollateral { amount, minimum });
        }

        if let Some(expected) = expected_trustee {
            let actual = self.client.trustee().await?;
            if actual != expected {
                return Err(CoordinatorError::TrusteeMismatch { expected, actual });
            }
        }

        info!(action = "depositing collateral", %executor, %amount);
        let call = CallRequest::new(
            self.client.contract_address(),
            &Collateral::depositCall {
                executorUuid: executor.into(),
            },
        )
        .with_value(amount);
        let receipt = self.submitter.submit_and_confirm(call).await?;

        let event: Collateral::Deposit = event_from_receipt(&receipt)?;
        Ok(confirmed(DepositEvent::from(event), &receipt))
    }

    /// Slashes a miner's executor. Trustee only.
    ///
    /// The justification content is fetched and digested before submission;
    /// the effective amount is capped by the ledger at the live balance.
    pub async fn slash(
        &self,
        miner: Address,
        executor: ExecutorId,
        amount: U256,
        url: &str,
    ) -> Result<Confirmed<SlashedEvent>, CoordinatorError> {
        self.ensure_trustee().await?;
        let checksum = justification::checksum_of(url).await?;

        info!(action = "slashing collateral", %miner, %executor, %amount, url);
        let call = CallRequest::new(
            self.client.contract_address(),
            &Collateral::slashCollateralCall {
                miner,
                executorUuid: executor.into(),
                amount,
                url: url.to_owned(),
                urlContentMd5Checksum: checksum.into(),
            },
        );
        let receipt = self.submitter.submit_and_confirm(call).await?;

        let event: Collateral::Slashed = event_from_receipt(&receipt)?;
        Ok(confirmed(SlashedEvent::from(event), &receipt))
    }

    /// Opens a reclaim request for previously deposited collateral.
    ///
    /// Returns the ledger-assigned request id together with the expiration
    /// time of the trustee's deny window, both read back from the emitted
    /// event rather than computed locally.
    pub async fn reclaim(
        &self,
        amount: U256,
        executor: ExecutorId,
        url: &str,
    ) -> Result<Confirmed<ReclaimStartedEvent>, CoordinatorError> {
        if amount.is_zero() {
            return Err(CoordinatorError::InvalidAmount(
                "reclaim amount must be positive".to_owned(),
            ));
        }
        let checksum = justification::checksum_of(url).await?;

        info!(action = "reclaiming collateral", %executor, %amount, url);
        let call = CallRequest::new(
            self.client.contract_address(),
            &Collateral::reclaimCollateralCall {
                amount,
                url: url.to_owned(),
                executorUuid: executor.into(),
            },
        );
        let receipt = self.submitter.submit_and_confirm(call).await?;

        let event: Collateral::ReclaimProcessStarted = event_from_receipt(&receipt)?;
        let started = ReclaimStartedEvent::from(event);
        info!(
            event = "reclaim process started",
            reclaim_request_id = %started.reclaim_request_id,
            expiration_time = started.expiration_time,
        );

        self.note(
            EventPayload::ReclaimProcessStarted(started.clone()),
            receipt.block_number,
        );
        Ok(confirmed(started, &receipt))
    }

    /// Denies an open reclaim request inside its window. Trustee only.
    ///
    /// The local view is consulted first: a request already known to be
    /// resolved or expired fails here without spending gas. A request this
    /// client has never observed goes straight to the ledger.
    pub async fn deny(
        &self,
        request_id: U256,
        url: &str,
    ) -> Result<Confirmed<DeniedEvent>, CoordinatorError> {
        self.ensure_trustee().await?;
        self.reclaims
            .lock()
            .expect("reclaim view lock poisoned")
            .ensure_deniable(request_id, unix_now())?;

        let checksum = justification::checksum_of(url).await?;

        info!(action = "denying reclaim request", %request_id, url);
        let call = CallRequest::new(
            self.client.contract_address(),
            &Collateral::denyReclaimRequestCall {
                reclaimRequestId: request_id,
                url: url.to_owned(),
                urlContentMd5Checksum: checksum.into(),
            },
        );
        let receipt = self.submitter.submit_and_confirm(call).await?;

        let event: Collateral::Denied = event_from_receipt(&receipt)?;
        let denied = DeniedEvent::from(event);
        self.note(EventPayload::Denied(denied.clone()), receipt.block_number);
        Ok(confirmed(denied, &receipt))
    }

    /// Finalizes a reclaim request whose deny window has elapsed.
    ///
    /// The local view is consulted first: finalizing before expiration or
    /// after a deny fails here when this client has seen the relevant
    /// events, otherwise the ledger rejects it and the revert is surfaced.
    pub async fn finalize(
        &self,
        request_id: U256,
    ) -> Result<Confirmed<ReclaimedEvent>, CoordinatorError> {
        self.reclaims
            .lock()
            .expect("reclaim view lock poisoned")
            .ensure_finalizable(request_id, unix_now())?;

        info!(action = "finalizing reclaim", %request_id);
        let call = CallRequest::new(
            self.client.contract_address(),
            &Collateral::finalizeReclaimCall {
                reclaimRequestId: request_id,
            },
        );
        let receipt = self.submitter.submit_and_confirm(call).await?;

        let event: Collateral::Reclaimed = event_from_receipt(&receipt)?;
        let reclaimed = ReclaimedEvent::from(event);
        self.note(
            EventPayload::Reclaimed(reclaimed.clone()),
            receipt.block_number,
        );
        Ok(confirmed(reclaimed, &receipt))
    }

    /// Writes the hotkey-to-address mapping. Trustee only; overwrites any
    /// prior mapping for the hotkey.
    pub async fn map_hotkey(
        &self,
        hotkey: Hotkey,
        address: Address,
    ) -> Result<TxHash, CoordinatorError> {
        self.ensure_trustee().await?;

        info!(action = "mapping hotkey", %hotkey, %address);
        let call = CallRequest::new(
            self.client.contract_address(),
            &Collateral::mapHotkeyToEthereumAddressCall {
                hotkey: hotkey.0.into(),
                ethereumAddress: address,
            },
        );
        let receipt = self.submitter.submit_and_confirm(call).await?;

        Ok(receipt.transaction_hash)
    }

    /// Sends native value to an SS58 recipient through the chain's
    /// balance-transfer precompile.
    pub async fn transfer_to_ss58(
        &self,
        recipient: &str,
        amount: U256,
    ) -> Result<TxHash, CoordinatorError> {
        if amount.is_zero() {
            return Err(CoordinatorError::InvalidAmount(
                "transfer amount must be positive".to_owned(),
            ));
        }
        let recipient = Hotkey::from_ss58(recipient)?;

        info!(action = "transferring to ss58 recipient", %recipient, %amount);
        let call = CallRequest::new(
            BALANCE_TRANSFER_PRECOMPILE,
            &SubtensorBalanceTransfer::transferCall {
                data: recipient.0.into(),
            },
        )
        .with_value(amount);
        let receipt = self.submitter.submit_and_confirm(call).await?;

        Ok(receipt.transaction_hash)
    }

    /// Folds the reclaim lifecycle events of a block range into the local
    /// view.
    pub async fn sync_reclaims(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<(), CoordinatorError> {
        let events = self.reconciler.reclaim_lifecycle(from_block, to_block).await?;

        let mut ledger = self.reclaims.lock().expect("reclaim view lock poisoned");
        for event in &events {
            ledger.observe(event)?;
        }

        Ok(())
    }

    /// The reclaim requests currently known to the local view, ascending by
    /// id.
    pub fn reclaim_requests(&self) -> Vec<ReclaimRequest> {
        self.reclaims
            .lock()
            .expect("reclaim view lock poisoned")
            .requests()
            .cloned()
            .collect()
    }

    /// Builds an event-derived view of collateral accounts over a block
    /// range.
    pub async fn collateral_view(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<CollateralView, CoordinatorError> {
        let events = self
            .reconciler
            .events_in_range(&[EventKind::Deposit, EventKind::Slashed], from_block, to_block)
            .await?;

        let mut view = CollateralView::new();
        for event in &events {
            view.observe(event);
        }

        Ok(view)
    }

    /// Verifies that this coordinator signs as the ledger's configured
    /// trustee. If the configuration cannot be read, authorization is left
    /// to the ledger.
    async fn ensure_trustee(&self) -> Result<(), CoordinatorError> {
        match self.client.trustee().await {
            Ok(trustee) if trustee == self.sender() => Ok(()),
            Ok(trustee) => Err(CoordinatorError::UnauthorizedCaller {
                caller: self.sender(),
                trustee,
            }),
            Err(err) => {
                warn!(%err, "could not read trustee configuration, deferring to the ledger");
                Ok(())
            }
        }
    }

    /// Folds an event we produced ourselves into the local view. A request
    /// the view has never seen is skipped; syncing will pick it up.
    fn note(&self, payload: EventPayload, block_number: Option<u64>) {
        let event = CollateralEvent {
            block_number: block_number.unwrap_or_default(),
            log_index: 0,
            payload,
        };

        let mut ledger = self.reclaims.lock().expect("reclaim view lock poisoned");
        match ledger.observe(&event) {
            Ok(()) | Err(TransitionError::UnknownRequest(_)) => {}
            Err(err) => warn!(%err, "local reclaim view diverged from the ledger"),
        }
    }
}

fn confirmed<E>(event: E, receipt: &alloy::rpc::types::TransactionReceipt) -> Confirmed<E> {
    Confirmed {
        event,
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
