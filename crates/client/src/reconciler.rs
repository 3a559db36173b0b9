//! Reconciles the ledger's raw logs into typed domain events.

use alloy::providers::Provider;
use alloy::rpc::types::Filter;
use futures::future::try_join_all;
use stakelock_contract::{events, CollateralEvent, EventKind};
use tracing::debug;

use crate::{errors::map_transport, ChainClient, ClientError};

/// Queries and decodes the collateral program's event logs.
///
/// Reconciliation is idempotent: the same block range always yields the same
/// sequence, ordered ascending by block number and then by log index within
/// the block. Decoding failures are hard errors; a log the reconciler cannot
/// account for is a protocol-version bug, not noise.
#[derive(Debug, Clone)]
pub struct EventReconciler {
    client: ChainClient,
}

impl EventReconciler {
    /// Creates a reconciler over the given client.
    pub const fn new(client: ChainClient) -> Self {
        Self { client }
    }

    /// Decodes all events of one kind emitted by the program in the
    /// inclusive block range.
    pub async fn events_of(
        &self,
        kind: EventKind,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<CollateralEvent>, ClientError> {
        let filter = Filter::new()
            .address(self.client.contract_address())
            .event_signature(kind.signature_hash())
            .from_block(from_block)
            .to_block(to_block);

        let logs = self
            .client
            .provider()
            .get_logs(&filter)
            .await
            .map_err(map_transport)?;
        debug!(?kind, from_block, to_block, count = logs.len(), "fetched logs");

        let mut decoded = logs
            .iter()
            .map(|log| events::decode_log(kind, log))
            .collect::<Result<Vec<_>, _>>()?;
        decoded.sort_by_key(CollateralEvent::ordering_key);

        Ok(decoded)
    }

    /// Decodes events of several kinds over one block range, merged into
    /// ledger order.
    ///
    /// The per-kind queries are independent, so they run concurrently.
    pub async fn events_in_range(
        &self,
        kinds: &[EventKind],
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<CollateralEvent>, ClientError> {
        let queries = kinds
            .iter()
            .map(|kind| self.events_of(*kind, from_block, to_block));

        let mut merged: Vec<CollateralEvent> =
            try_join_all(queries).await?.into_iter().flatten().collect();
        merged.sort_by_key(CollateralEvent::ordering_key);

        Ok(merged)
    }

    /// The full reclaim lifecycle over one block range: request starts,
    /// denials and settlements, in ledger order.
    pub async fn reclaim_lifecycle(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<CollateralEvent>, ClientError> {
        self.events_in_range(
            &[
                EventKind::ReclaimProcessStarted,
                EventKind::Denied,
                EventKind::Reclaimed,
            ],
            from_block,
            to_block,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use alloy::{primitives::U256, sol_types::SolEvent};
    use stakelock_contract::{events::EventPayload, Collateral};
    use stakelock_test_utils::{generate_address, generate_executor_id, log_with_coordinates};

    use super::*;

    #[test]
    fn test_decoded_events_sort_into_ledger_order() {
        let contract = generate_address();
        let raw = |amount: u64| Collateral::Deposit {
            account: generate_address(),
            executorId: generate_executor_id().into(),
            amount: U256::from(amount),
        };

        // Deliberately out of order: later block first, two logs sharing a
        // block in reversed index order.
        let logs = vec![
            log_with_coordinates(contract, raw(3).encode_log_data(), 20, 0),
            log_with_coordinates(contract, raw(2).encode_log_data(), 10, 5),
            log_with_coordinates(contract, raw(1).encode_log_data(), 10, 1),
        ];

        let mut decoded = logs
            .iter()
            .map(|log| events::decode_log(EventKind::Deposit, log))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        decoded.sort_by_key(CollateralEvent::ordering_key);

        let amounts: Vec<u64> = decoded
            .iter()
            .map(|event| match &event.payload {
                EventPayload::Deposit(deposit) => deposit.amount.to::<u64>(),
                other => panic!("unexpected payload {other:?}"),
            })
            .collect();
        assert_eq!(amounts, vec![1, 2, 3], "must order by block then log index");
    }
}
