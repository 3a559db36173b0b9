//! Chain-facing plumbing: the JSON-RPC client handle, the transaction
//! submitter, the event reconciler and the read-only ledger queries.
//!
//! Everything in this crate treats the ledger as the single source of truth.
//! Nothing here retries on its own: a failure, a timeout or a revert is
//! reported to the caller with enough context to decide what to do next.

pub mod errors;
pub mod queries;
pub mod reconciler;
pub mod submitter;

use alloy::providers::RootProvider;
use stakelock_params::StakelockParams;

pub use errors::{ClientError, QueryError};
pub use reconciler::EventReconciler;
pub use submitter::{CallRequest, PendingCall, TxSubmitter};

/// Handle to one deployment of the collateral program on one chain.
///
/// Cheap to clone; all clones share the underlying HTTP connection pool.
#[derive(Debug, Clone)]
pub struct ChainClient {
    provider: RootProvider,
    params: StakelockParams,
}

impl ChainClient {
    /// Connects a client to the endpoint and contract named in the params.
    ///
    /// This only constructs the handle; no request is made until the first
    /// query or submission.
    pub fn new(params: StakelockParams) -> Self {
        let provider = RootProvider::new_http(params.rpc_url.clone());
        Self { provider, params }
    }

    /// The underlying JSON-RPC provider.
    pub const fn provider(&self) -> &RootProvider {
        &self.provider
    }

    /// Address of the collateral program this client is pointed at.
    pub const fn contract_address(&self) -> alloy::primitives::Address {
        self.params.contract_address
    }

    /// The parameters this client was constructed with.
    pub const fn params(&self) -> &StakelockParams {
        &self.params
    }
}
