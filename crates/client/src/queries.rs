//! Read-only views of the collateral program.
//!
//! Pure reads against the chain client. Failures surface to the caller
//! unchanged; whether a transient RPC failure is worth retrying is a policy
//! decision that does not belong down here.

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use stakelock_contract::Collateral;
use stakelock_primitives::{ExecutorId, Hotkey};

use crate::{ChainClient, QueryError};

impl ChainClient {
    /// Collateral balance of one `(miner, executor)` account, in the
    /// smallest unit.
    pub async fn balance_of(
        &self,
        miner: Address,
        executor: ExecutorId,
    ) -> Result<U256, QueryError> {
        self.read(
            "collaterals",
            Collateral::collateralsCall {
                miner,
                executorUuid: executor.into(),
            },
            None,
        )
        .await
    }

    /// Executors of the given miner that currently hold usable collateral.
    ///
    /// The program walks the miner's whole executor set, so the call is
    /// provisioned with the configured gas allowance instead of an estimate.
    pub async fn eligible_executors(&self, miner: Address) -> Result<Vec<ExecutorId>, QueryError> {
        let executors: Vec<alloy::primitives::FixedBytes<16>> = self
            .read(
                "getEligibleExecutors",
                Collateral::getEligibleExecutorsCall { miner },
                Some(self.params().tx.eligibility_scan_gas),
            )
            .await?;

        Ok(executors.into_iter().map(ExecutorId::from).collect())
    }

    /// The authority allowed to slash, deny and map identities.
    pub async fn trustee(&self) -> Result<Address, QueryError> {
        self.read("TRUSTEE", Collateral::TRUSTEECall {}, None).await
    }

    /// The subnet this deployment serves.
    pub async fn netuid(&self) -> Result<u16, QueryError> {
        self.read("NETUID", Collateral::NETUIDCall {}, None).await
    }

    /// Smallest deposit the program accepts.
    pub async fn min_collateral_increase(&self) -> Result<U256, QueryError> {
        self.read(
            "MIN_COLLATERAL_INCREASE",
            Collateral::MIN_COLLATERAL_INCREASECall {},
            None,
        )
        .await
    }

    /// The deny window, in seconds, granted to the trustee on every reclaim.
    pub async fn deny_timeout(&self) -> Result<u64, QueryError> {
        self.read("DENY_TIMEOUT", Collateral::DENY_TIMEOUTCall {}, None)
            .await
    }

    /// The settlement address mapped to a hotkey, if any.
    pub async fn hotkey_to_address(&self, hotkey: Hotkey) -> Result<Option<Address>, QueryError> {
        let mapped: Address = self
            .read(
                "hotkeyToEthereumAddress",
                Collateral::hotkeyToEthereumAddressCall {
                    hotkey: hotkey.0.into(),
                },
                None,
            )
            .await?;

        // The program represents an absent mapping as the zero address.
        Ok((!mapped.is_zero()).then_some(mapped))
    }

    async fn read<C: SolCall>(
        &self,
        query: &'static str,
        call: C,
        gas: Option<u64>,
    ) -> Result<C::Return, QueryError> {
        let mut tx = TransactionRequest::default()
            .with_to(self.contract_address())
            .with_input(Bytes::from(call.abi_encode()));
        if let Some(gas) = gas {
            tx = tx.with_gas_limit(gas);
        }

        let returned = self
            .provider()
            .call(tx)
            .await
            .map_err(|err| QueryError::Rpc {
                query,
                message: err.to_string(),
            })?;

        C::abi_decode_returns(&returned).map_err(|source| QueryError::Decode { query, source })
    }
}
