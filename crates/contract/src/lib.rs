//! Typed surface of the on-chain collateral program.
//!
//! The ledger program is the source of truth for balances and reclaim
//! timing; this crate pins its external protocol once, at compile time. Call
//! and event shapes are generated from the declaration below, so there is no
//! runtime ABI loading and no dynamically-typed invocation anywhere in the
//! workspace. Method and event names are part of the wire protocol and must
//! not be renamed.

pub mod errors;
pub mod events;

use alloy::{primitives::address, sol};

pub use errors::EventError;
pub use events::{event_from_receipt, CollateralEvent, EventKind, EventPayload};

sol! {
    /// The collateral program consumed by miners and the trustee.
    ///
    /// Deposits are payable and keyed by executor; slashing and reclaim
    /// denial are trustee operations; reclaims settle only after the deny
    /// window configured at deployment has elapsed.
    #[derive(Debug, PartialEq, Eq)]
    interface Collateral {
        function deposit(bytes16 executorUuid) external payable;
        function slashCollateral(
            address miner,
            bytes16 executorUuid,
            uint256 amount,
            string url,
            bytes16 urlContentMd5Checksum
        ) external;
        function reclaimCollateral(uint256 amount, string url, bytes16 executorUuid) external;
        function denyReclaimRequest(
            uint256 reclaimRequestId,
            string url,
            bytes16 urlContentMd5Checksum
        ) external;
        function finalizeReclaim(uint256 reclaimRequestId) external;
        function mapHotkeyToEthereumAddress(bytes32 hotkey, address ethereumAddress) external;

        function collaterals(address miner, bytes16 executorUuid) external view returns (uint256);
        function getEligibleExecutors(address miner) external view returns (bytes16[] memory);
        function hotkeyToEthereumAddress(bytes32 hotkey) external view returns (address);
        function TRUSTEE() external view returns (address);
        function NETUID() external view returns (uint16);
        function MIN_COLLATERAL_INCREASE() external view returns (uint256);
        function DENY_TIMEOUT() external view returns (uint64);

        event Deposit(address indexed account, bytes16 indexed executorId, uint256 amount);
        event Slashed(
            address indexed account,
            bytes16 indexed executorId,
            uint256 amount,
            string url,
            bytes16 urlContentMd5Checksum
        );
        event ReclaimProcessStarted(
            uint256 indexed reclaimRequestId,
            address indexed account,
            uint256 amount,
            uint64 expirationTime,
            string url,
            bytes16 urlContentMd5Checksum
        );
        event Denied(uint256 indexed reclaimRequestId, string url, bytes16 urlContentMd5Checksum);
        event Reclaimed(uint256 indexed reclaimRequestId, address indexed account, uint256 amount);
    }
}

sol! {
    /// The chain's balance-transfer precompile.
    ///
    /// Takes the recipient's native 32-byte account id and moves the attached
    /// value out of the EVM pallet.
    #[derive(Debug, PartialEq, Eq)]
    interface SubtensorBalanceTransfer {
        function transfer(bytes32 data) external payable;
    }
}

/// Fixed address of the balance-transfer precompile.
pub const BALANCE_TRANSFER_PRECOMPILE: alloy::primitives::Address =
    address!("0x0000000000000000000000000000000000000800");
