//! Builds, signs and broadcasts state-changing calls, then waits for their
//! on-ledger outcome.
//!
//! A broadcast is irreversible. The submitter therefore reports exactly what
//! happened and nothing more: a revert is terminal (with the replayed
//! reason), a confirmation timeout means the outcome is unknown, and nothing
//! is ever re-broadcast or fee-bumped on the caller's behalf.

use std::time::Instant;

use alloy::{
    eips::{eip2718::Encodable2718, BlockId, BlockNumberOrTag},
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, U256},
    providers::Provider,
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    sol_types::SolCall,
};
use stakelock_params::TxParams;
use tokio::{sync::Mutex, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    errors::{map_broadcast, map_transport},
    ChainClient, ClientError,
};

/// Gas limit used when estimation fails; the cost of a plain value transfer.
const BASE_TRANSFER_GAS: u64 = 21_000;

/// Priority tip used when the node does not suggest one (1 gwei).
const DEFAULT_PRIORITY_FEE: u128 = 1_000_000_000;

/// A state-changing call ready for submission.
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// Call target.
    pub to: Address,

    /// ABI-encoded calldata.
    pub input: Bytes,

    /// Native value attached to the call.
    pub value: U256,
}

impl CallRequest {
    /// A typed contract call with no attached value.
    pub fn new(to: Address, call: &impl SolCall) -> Self {
        Self {
            to,
            input: call.abi_encode().into(),
            value: U256::ZERO,
        }
    }

    /// A plain value transfer with empty calldata.
    pub fn transfer(to: Address, value: U256) -> Self {
        Self {
            to,
            input: Bytes::new(),
            value,
        }
    }

    /// Attaches native value to the call.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// A broadcast transaction whose outcome is not yet known.
#[derive(Debug, Clone)]
pub struct PendingCall {
    /// Hash under which the ledger knows the transaction.
    pub tx_hash: TxHash,

    /// The request as broadcast, kept for revert-reason replay.
    pub request: TransactionRequest,
}

/// Resolved fee parameters for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeeSettings {
    /// Base fee plus priority tip.
    Eip1559 { max_fee: u128, priority: u128 },

    /// Single legacy gas price, for chains without fee history.
    Legacy { gas_price: u128 },
}

impl FeeSettings {
    /// Priority-fee settings from the current base fee. The max fee doubles
    /// the base so the transaction survives the next few blocks of base-fee
    /// growth.
    const fn priority(base_fee: u128, suggested_tip: Option<u128>) -> Self {
        let priority = match suggested_tip {
            Some(tip) => tip,
            None => DEFAULT_PRIORITY_FEE,
        };
        Self::Eip1559 {
            max_fee: base_fee * 2 + priority,
            priority,
        }
    }
}

/// Signs and broadcasts transactions for one signer.
///
/// Submissions are serialized internally so that one signer never has two
/// unconfirmed transactions competing for the same nonce. Independent
/// signers can submit concurrently through their own submitters.
#[derive(Debug)]
pub struct TxSubmitter {
    client: ChainClient,
    wallet: EthereumWallet,
    sender: Address,
    params: TxParams,
    nonce_lock: Mutex<()>,
}

impl TxSubmitter {
    /// Creates a submitter for the given signer.
    pub fn new(client: ChainClient, signer: PrivateKeySigner) -> Self {
        let params = client.params().tx;
        let sender = signer.address();
        Self {
            client,
            wallet: EthereumWallet::from(signer),
            sender,
            params,
            nonce_lock: Mutex::new(()),
        }
    }

    /// The settlement-layer address of this submitter's signer.
    pub const fn sender(&self) -> Address {
        self.sender
    }

    /// Builds, signs and broadcasts a call. Returns as soon as the ledger
    /// has accepted the raw transaction into its pool.
    pub async fn submit(&self, call: CallRequest) -> Result<PendingCall, ClientError> {
        let _serialized = self.nonce_lock.lock().await;
        let provider = self.client.provider();

        let nonce = provider
            .get_transaction_count(self.sender)
            .pending()
            .await
            .map_err(map_transport)?;
        let chain_id = provider.get_chain_id().await.map_err(map_transport)?;

        let mut tx = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(call.to)
            .with_value(call.value)
            .with_input(call.input)
            .with_nonce(nonce)
            .with_chain_id(chain_id);

        let gas_limit = match provider.estimate_gas(tx.clone()).await {
            Ok(estimate) => estimate,
            Err(err) => {
                debug!(%err, fallback = BASE_TRANSFER_GAS, "gas estimation failed, using base cost");
                BASE_TRANSFER_GAS
            }
        };
        tx = tx.with_gas_limit(gas_limit);

        match self.resolve_fees().await? {
            FeeSettings::Eip1559 { max_fee, priority } => {
                tx = tx
                    .with_max_fee_per_gas(max_fee)
                    .with_max_priority_fee_per_gas(priority);
            }
            FeeSettings::Legacy { gas_price } => {
                tx = tx.with_gas_price(gas_price);
            }
        }

        let envelope = tx
            .clone()
            .build(&self.wallet)
            .await
            .map_err(|err| ClientError::IncompleteTransaction(err.to_string()))?;
        let encoded = envelope.encoded_2718();

        let pending = provider
            .send_raw_transaction(&encoded)
            .await
            .map_err(|err| map_broadcast(self.sender, err))?;
        let tx_hash = *pending.tx_hash();
        info!(%tx_hash, nonce, gas_limit, "transaction broadcast");

        Ok(PendingCall { tx_hash, request: tx })
    }

    /// Polls for the receipt of a broadcast transaction.
    ///
    /// A success receipt is returned as-is. A failure receipt is turned into
    /// [`ClientError::Reverted`] after replaying the call at the failing
    /// block to recover the reason. Expiry of the deadline yields
    /// [`ClientError::ConfirmationTimeout`]; the caller must re-query the
    /// hash before assuming the transaction is gone.
    pub async fn await_confirmation(
        &self,
        pending: &PendingCall,
    ) -> Result<TransactionReceipt, ClientError> {
        let deadline = Instant::now() + self.params.confirmation_timeout;
        let provider = self.client.provider();

        loop {
            match provider
                .get_transaction_receipt(pending.tx_hash)
                .await
                .map_err(map_transport)?
            {
                Some(receipt) if receipt.status() => {
                    info!(
                        tx_hash = %pending.tx_hash,
                        block = receipt.block_number,
                        gas_used = receipt.gas_used,
                        "transaction confirmed"
                    );
                    return Ok(receipt);
                }
                Some(receipt) => {
                    let reason = self
                        .revert_reason(&pending.request, receipt.block_number)
                        .await;
                    warn!(tx_hash = %pending.tx_hash, %reason, "transaction reverted");
                    return Err(ClientError::Reverted {
                        tx_hash: pending.tx_hash,
                        reason,
                    });
                }
                None => {}
            }

            if Instant::now() >= deadline {
                return Err(ClientError::ConfirmationTimeout {
                    tx_hash: pending.tx_hash,
                    timeout: self.params.confirmation_timeout,
                });
            }
            sleep(self.params.poll_interval).await;
        }
    }

    /// Submits a call and waits for its receipt in one step.
    pub async fn submit_and_confirm(
        &self,
        call: CallRequest,
    ) -> Result<TransactionReceipt, ClientError> {
        let pending = self.submit(call).await?;
        self.await_confirmation(&pending).await
    }

    /// Replays a failed call at its failing block to recover the ledger's
    /// revert reason. Best effort: anything undecodable reads "unknown".
    async fn revert_reason(&self, request: &TransactionRequest, block: Option<u64>) -> String {
        let provider = self.client.provider();
        let replay = provider.call(request.clone()).block(match block {
            Some(number) => BlockId::number(number),
            None => BlockId::Number(BlockNumberOrTag::Latest),
        });

        match replay.await {
            // The replay passing means the failure was context-dependent
            // (out-of-gas, state drift); there is no reason to decode.
            Ok(_) => "unknown".to_owned(),
            Err(err) => err
                .as_error_resp()
                .and_then(|payload| payload.as_revert_data())
                .and_then(|data| alloy::sol_types::decode_revert_reason(&data))
                .unwrap_or_else(|| "unknown".to_owned()),
        }
    }

    /// Resolves fees for the next transaction, preferring the priority-fee
    /// model and falling back to a legacy gas price where the chain offers
    /// no fee history.
    async fn resolve_fees(&self) -> Result<FeeSettings, ClientError> {
        let provider = self.client.provider();

        let base_fee = match provider
            .get_fee_history(1, BlockNumberOrTag::Latest, &[])
            .await
        {
            Ok(history) => history.latest_block_base_fee().filter(|base| *base > 0),
            Err(err) => {
                debug!(%err, "fee history unavailable");
                None
            }
        };

        match base_fee {
            Some(base_fee) => {
                let suggested_tip = provider.get_max_priority_fee_per_gas().await.ok();
                Ok(FeeSettings::priority(base_fee, suggested_tip))
            }
            None => {
                let gas_price = provider.get_gas_price().await.map_err(map_transport)?;
                Ok(FeeSettings::Legacy { gas_price })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::sol_types::{Revert, SolError};
    use stakelock_test_utils::generate_address;

    use super::*;

    #[test]
    fn test_call_request_shapes() {
        let to = generate_address();

        let transfer = CallRequest::transfer(to, U256::from(7u64));
        assert!(transfer.input.is_empty(), "transfer must carry no calldata");
        assert_eq!(transfer.value, U256::from(7u64));

        let call = stakelock_contract::Collateral::finalizeReclaimCall {
            reclaimRequestId: U256::from(3u64),
        };
        let request = CallRequest::new(to, &call);
        assert_eq!(request.value, U256::ZERO);
        assert_eq!(
            &request.input[..4],
            stakelock_contract::Collateral::finalizeReclaimCall::SELECTOR,
            "calldata must start with the declared selector"
        );
    }

    #[test]
    fn test_fee_selection_prefers_priority_model() {
        assert_eq!(
            FeeSettings::priority(100, Some(7)),
            FeeSettings::Eip1559 {
                max_fee: 207,
                priority: 7,
            }
        );

        // No suggested tip: fall back to the default instead of legacy.
        assert_eq!(
            FeeSettings::priority(100, None),
            FeeSettings::Eip1559 {
                max_fee: 200 + DEFAULT_PRIORITY_FEE,
                priority: DEFAULT_PRIORITY_FEE,
            }
        );
    }

    #[test]
    fn test_revert_reason_decodes_error_string() {
        let revert = Revert::from("Reclaim period expired");
        let data = revert.abi_encode();
        let reason = alloy::sol_types::decode_revert_reason(&data)
            .expect("standard Error(string) payload must decode");
        assert!(
            reason.contains("Reclaim period expired"),
            "decoded reason must carry the ledger's message, got {reason}"
        );
    }
}
