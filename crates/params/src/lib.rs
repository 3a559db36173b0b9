//! Explicit configuration values for the stakelock client.
//!
//! Everything the client needs to know about its environment is constructed
//! once, up front, and passed down to the components that need it. There are
//! no ambient environment lookups inside the core: a component that needs the
//! endpoint or the contract address receives it through these types.

pub mod default;
pub mod tx;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use stakelock_primitives::Ss58Format;
use url::Url;

pub use tx::TxParams;

/// Everything needed to point the client at one deployment of the collateral
/// program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakelockParams {
    /// JSON-RPC endpoint of the settlement chain.
    pub rpc_url: Url,

    /// Address of the deployed collateral program.
    pub contract_address: Address,

    /// SS58 network format used when rendering native identities.
    #[serde(default)]
    pub ss58_format: Ss58Format,

    /// Transaction submission and confirmation knobs.
    #[serde(default)]
    pub tx: TxParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_serde() {
        let params = StakelockParams {
            rpc_url: "http://127.0.0.1:9944".parse().unwrap(),
            contract_address: Address::repeat_byte(0x42),
            ss58_format: Ss58Format::GENERIC,
            tx: TxParams::default(),
        };
        let serialized = toml::to_string(&params).unwrap();

        let deserialized: StakelockParams = toml::from_str(&serialized).unwrap();

        assert_eq!(params, deserialized);

        let params_toml = r#"
            rpc_url = "https://entrypoint-finney.opentensor.ai"
            contract_address = "0x4242424242424242424242424242424242424242"
        "#;
        assert!(
            toml::from_str::<StakelockParams>(params_toml).is_ok(),
            "must be able to deserialize StakelockParams from a toml"
        );
    }
}
