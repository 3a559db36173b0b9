//! Default values for configurable parameters.

use std::time::Duration;

/// How long to poll for a transaction receipt before giving up.
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Delay between consecutive receipt polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Gas allowance for the unbounded eligible-executor scan.
///
/// The program walks every executor the miner has ever funded, so the default
/// estimate is not reliable and the protocol fixes an explicit allowance.
pub const ELIGIBILITY_SCAN_GAS: u64 = 3_000_000;
