//! Transaction submission and confirmation parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::default::{CONFIRMATION_TIMEOUT, ELIGIBILITY_SCAN_GAS, POLL_INTERVAL};

/// Knobs governing how transactions are confirmed and how heavy read calls
/// are provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxParams {
    /// How long to wait for a receipt before reporting the outcome as
    /// unknown.
    #[serde(with = "duration_secs")]
    pub confirmation_timeout: Duration,

    /// Delay between consecutive receipt polls.
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,

    /// Gas allowance for the eligible-executor scan.
    pub eligibility_scan_gas: u64,
}

impl Default for TxParams {
    fn default() -> Self {
        Self {
            confirmation_timeout: CONFIRMATION_TIMEOUT,
            poll_interval: POLL_INTERVAL,
            eligibility_scan_gas: ELIGIBILITY_SCAN_GAS,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs().serialize(s)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_params_serde() {
        let params = TxParams::default();
        let serialized = toml::to_string(&params).unwrap();

        let deserialized: TxParams = toml::from_str(&serialized).unwrap();
        assert_eq!(params, deserialized);

        let params_toml = r#"
            confirmation_timeout = 60
            poll_interval = 1
            eligibility_scan_gas = 5000000
        "#;
        let parsed: TxParams = toml::from_str(params_toml).unwrap();
        assert_eq!(parsed.confirmation_timeout, Duration::from_secs(60));
    }
}
