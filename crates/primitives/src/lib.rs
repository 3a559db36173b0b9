//! Core identity and value types shared by the stakelock workspace.
//!
//! The protocol settles on an EVM pallet hosted by a Substrate chain, so every
//! actor has two spellings of the same key material: a consensus-layer SS58
//! identity and a settlement-layer H160 address. The conversions between them
//! live here and are pure; everything that talks to the chain builds on top.

pub mod identity;
pub mod types;

pub use identity::{address_to_ss58, evm_account_id, Hotkey, IdentityError, Ss58Format};
pub use types::{ExecutorId, Md5Checksum};
