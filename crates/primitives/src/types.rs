use std::{fmt, str::FromStr};

use alloy::primitives::FixedBytes;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a single executor within a miner's fleet.
///
/// The ledger program keys collateral accounts by `(miner, executor)` where
/// the executor is a 16-byte UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExecutorId(pub Uuid);

impl ExecutorId {
    /// The on-wire `bytes16` form.
    pub const fn to_fixed_bytes(self) -> FixedBytes<16> {
        FixedBytes(self.0.into_bytes())
    }

    /// Reconstructs the identifier from its on-wire form.
    pub const fn from_fixed_bytes(bytes: FixedBytes<16>) -> Self {
        Self(Uuid::from_bytes(bytes.0))
    }
}

impl FromStr for ExecutorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for ExecutorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl From<FixedBytes<16>> for ExecutorId {
    fn from(value: FixedBytes<16>) -> Self {
        Self::from_fixed_bytes(value)
    }
}

impl From<ExecutorId> for FixedBytes<16> {
    fn from(value: ExecutorId) -> Self {
        value.to_fixed_bytes()
    }
}

/// Content-integrity digest accompanying a justification URL.
///
/// The external protocol fixes the digest algorithm to MD5 and the width to
/// 16 bytes; this is an integrity tag, not a security boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Md5Checksum(pub FixedBytes<16>);

impl Md5Checksum {
    /// Digests raw content bytes.
    pub fn digest(content: &[u8]) -> Self {
        let digest: [u8; 16] = Md5::digest(content).into();
        Self(FixedBytes(digest))
    }

    /// Parses a checksum from its 32-character hex form.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw: [u8; 16] = hex::decode(s)?
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(FixedBytes(raw)))
    }
}

impl fmt::Display for Md5Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<Md5Checksum> for FixedBytes<16> {
    fn from(value: Md5Checksum) -> Self {
        value.0
    }
}

impl From<FixedBytes<16>> for Md5Checksum {
    fn from(value: FixedBytes<16>) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_id_wire_round_trip() {
        let id: ExecutorId = "0161616c-6172-6769-6e67-2073747265ff".parse().unwrap();
        let wire = id.to_fixed_bytes();
        assert_eq!(ExecutorId::from_fixed_bytes(wire), id);
        assert_eq!(id.to_string().parse::<ExecutorId>().unwrap(), id);
    }

    #[test]
    fn test_executor_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<ExecutorId>().is_err());
    }

    #[test]
    fn test_md5_checksum_known_vector() {
        // md5("content"), as pinned by the protocol's integrity-tag tests.
        let checksum = Md5Checksum::digest(b"content");
        assert_eq!(checksum.to_string(), "9a0364b9e99bb480dd25e1f0284c8555");
    }

    #[test]
    fn test_md5_checksum_hex_round_trip() {
        let checksum = Md5Checksum::digest(b"slash evidence");
        let parsed = Md5Checksum::from_hex(&checksum.to_string()).unwrap();
        assert_eq!(parsed, checksum);

        assert!(Md5Checksum::from_hex("abc").is_err());
    }
}
