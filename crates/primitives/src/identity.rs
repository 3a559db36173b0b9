//! Conversions between consensus-layer identities and settlement-layer
//! addresses.
//!
//! An SS58 string is base58 over `prefix ++ body ++ checksum`, where the
//! checksum is the first two bytes of `blake2b-512("SS58PRE" ++ prefix ++
//! body)`. The settlement layer identifies the same actor by an H160; the
//! chain derives its native account for an H160 as `blake2b-256("evm:" ++
//! address)`. All functions here are deterministic and never touch the
//! network.

use std::{fmt, str::FromStr};

use alloy::primitives::Address;
use blake2::{
    digest::{consts::U32, Digest},
    Blake2b, Blake2b512,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

type Blake2b256 = Blake2b<U32>;

/// Domain separator mixed into every SS58 checksum.
const SS58_PREFIX: &[u8] = b"SS58PRE";

/// Domain separator for deriving a native account from an EVM address.
const EVM_PREFIX: &[u8] = b"evm:";

/// Errors produced by identity parsing and conversion.
///
/// All of these are raised before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The input was not valid base58.
    #[error("identity is not valid base58: {0}")]
    BadBase58(String),

    /// The decoded payload had an unexpected length.
    #[error("identity payload has invalid length: {0} bytes")]
    BadLength(usize),

    /// The embedded checksum did not match the payload.
    #[error("identity checksum mismatch")]
    BadChecksum,

    /// The network format prefix is outside the supported range.
    #[error("unsupported ss58 format: {0}")]
    UnsupportedFormat(u16),

    /// The input was not valid hex of the expected width.
    #[error("identity is not valid hex: {0}")]
    BadHex(String),
}

/// An SS58 network format prefix.
///
/// Only the single-byte range is supported, which covers every network this
/// client settles against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ss58Format(u8);

impl Ss58Format {
    /// The generic Substrate format (`42`), used by test networks.
    pub const GENERIC: Self = Self(42);

    /// Creates a format from a raw registry value.
    pub const fn new(format: u16) -> Result<Self, IdentityError> {
        if format > 63 {
            return Err(IdentityError::UnsupportedFormat(format));
        }
        Ok(Self(format as u8))
    }

    /// The raw prefix byte.
    pub const fn prefix(&self) -> u8 {
        self.0
    }
}

impl Default for Ss58Format {
    fn default() -> Self {
        Self::GENERIC
    }
}

impl TryFrom<u16> for Ss58Format {
    type Error = IdentityError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A consensus-layer public key identity (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hotkey(pub [u8; 32]);

impl Hotkey {
    /// Decodes a hotkey from its SS58 string form, validating the embedded
    /// checksum. Any single-byte network format is accepted.
    pub fn from_ss58(s: &str) -> Result<Self, IdentityError> {
        let raw = bs58::decode(s)
            .into_vec()
            .map_err(|e| IdentityError::BadBase58(e.to_string()))?;

        // prefix byte + 32-byte body + 2-byte checksum
        if raw.len() != 35 {
            return Err(IdentityError::BadLength(raw.len()));
        }
        if raw[0] > 63 {
            return Err(IdentityError::UnsupportedFormat(raw[0] as u16));
        }

        let (payload, checksum) = raw.split_at(raw.len() - 2);
        if ss58_checksum(payload) != checksum {
            return Err(IdentityError::BadChecksum);
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&payload[1..]);
        Ok(Self(key))
    }

    /// Decodes a hotkey from a hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, IdentityError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(s).map_err(|e| IdentityError::BadHex(e.to_string()))?;
        let key: [u8; 32] = raw
            .try_into()
            .map_err(|v: Vec<u8>| IdentityError::BadLength(v.len()))?;
        Ok(Self(key))
    }

    /// Encodes the hotkey as an SS58 string under the given network format.
    pub fn to_ss58(&self, format: Ss58Format) -> String {
        encode_ss58(&self.0, format)
    }
}

impl FromStr for Hotkey {
    type Err = IdentityError;

    /// Accepts either spelling: SS58 or 32-byte hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") || s.len() == 64 {
            Self::from_hex(s)
        } else {
            Self::from_ss58(s)
        }
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Hotkey {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

/// Derives the chain's native 32-byte account id for a settlement-layer
/// address.
pub fn evm_account_id(address: Address) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(EVM_PREFIX);
    hasher.update(address.as_slice());
    hasher.finalize().into()
}

/// Encodes a settlement-layer address as the SS58 string of its derived
/// native account.
pub fn address_to_ss58(address: Address, format: Ss58Format) -> String {
    encode_ss58(&evm_account_id(address), format)
}

fn encode_ss58(body: &[u8; 32], format: Ss58Format) -> String {
    let mut payload = Vec::with_capacity(35);
    payload.push(format.prefix());
    payload.extend_from_slice(body);
    let checksum = ss58_checksum(&payload);
    payload.extend_from_slice(&checksum);
    bs58::encode(payload).into_string()
}

fn ss58_checksum(payload: &[u8]) -> [u8; 2] {
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_PREFIX);
    hasher.update(payload);
    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    // The well-known Substrate dev account `//Alice`.
    const ALICE_SS58: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const ALICE_PUBKEY: &str = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";

    #[test]
    fn test_ss58_decode_known_key() {
        let hotkey = Hotkey::from_ss58(ALICE_SS58).expect("alice must decode");
        assert_eq!(hex::encode(hotkey.0), ALICE_PUBKEY, "must recover the raw key");
    }

    #[test]
    fn test_ss58_round_trip() {
        let hotkey = Hotkey::from_ss58(ALICE_SS58).unwrap();
        assert_eq!(
            hotkey.to_ss58(Ss58Format::GENERIC),
            ALICE_SS58,
            "encode must invert decode under a fixed format"
        );

        let reencoded = Hotkey::from_ss58(&hotkey.to_ss58(Ss58Format::GENERIC)).unwrap();
        assert_eq!(reencoded, hotkey, "decode must invert encode");
    }

    #[test]
    fn test_ss58_rejects_malformed_input() {
        assert!(matches!(
            Hotkey::from_ss58("not-an-identity!"),
            Err(IdentityError::BadBase58(_))
        ));

        // Flip a payload character so the checksum no longer matches.
        let mut tampered = ALICE_SS58.to_owned();
        tampered.replace_range(10..11, if &tampered[10..11] == "a" { "b" } else { "a" });
        assert!(
            Hotkey::from_ss58(&tampered).is_err(),
            "tampered identity must not decode"
        );

        // Too short to hold prefix + key + checksum.
        let short = bs58::encode([1u8; 10]).into_string();
        assert!(matches!(
            Hotkey::from_ss58(&short),
            Err(IdentityError::BadLength(_))
        ));
    }

    #[test]
    fn test_hotkey_from_str_accepts_both_spellings() {
        let from_ss58 = Hotkey::from_str(ALICE_SS58).unwrap();
        let from_hex = Hotkey::from_str(ALICE_PUBKEY).unwrap();
        let from_prefixed = Hotkey::from_str(&format!("0x{ALICE_PUBKEY}")).unwrap();
        assert_eq!(from_ss58, from_hex);
        assert_eq!(from_hex, from_prefixed);
    }

    #[test]
    fn test_address_to_ss58_format_prefix() {
        let address = Address::repeat_byte(0x5a);

        let generic = address_to_ss58(address, Ss58Format::GENERIC);
        assert!(generic.starts_with('5'), "generic format must start with 5");

        let polkadot = address_to_ss58(address, Ss58Format::new(0).unwrap());
        assert!(polkadot.starts_with('1'), "format 0 must start with 1");

        // Same input, same output.
        assert_eq!(generic, address_to_ss58(address, Ss58Format::GENERIC));
    }

    #[test]
    fn test_evm_account_id_is_deterministic() {
        let a = Address::repeat_byte(0x11);
        let b = Address::repeat_byte(0x22);
        assert_eq!(evm_account_id(a), evm_account_id(a));
        assert_ne!(evm_account_id(a), evm_account_id(b));
    }

    #[test]
    fn test_unsupported_format_rejected() {
        assert!(matches!(
            Ss58Format::new(64),
            Err(IdentityError::UnsupportedFormat(64))
        ));
    }
}
