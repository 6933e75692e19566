//! Core types for proof-gated cross-chain teleports.

use crate::errors::CoreError;
use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A 32-byte address. 20-byte EVM addresses are left-padded with zeros.
pub type Address = [u8; 32];

/// The all-zero address, treated as "unset" everywhere.
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Token amounts, represented as a 128-bit unsigned integer.
pub type Balance = u128;

/// External chain identifier (e.g. an EVM chain id).
pub type ChainId = u64;

/// Messaging transport endpoint identifier.
pub type EndpointId = u32;

/// A 256-bit big-endian field word.
///
/// The zero word is the "absent" sentinel in every keyed store. Words produced
/// by hashing are reduced into field range by clearing the top three bits, so
/// they are always below 2^253.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Field(pub [u8; 32]);

impl Field {
    /// The zero word.
    pub const ZERO: Field = Field([0u8; 32]);

    /// Width of an encoded field word in bytes.
    pub const BYTES: usize = 32;

    /// Creates a field word from raw big-endian bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Creates a field word from a slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() != Self::BYTES {
            return Err(CoreError::InvalidLength {
                what: "field word",
                expected: Self::BYTES,
                actual: bytes.len(),
            });
        }

        let mut word = [0u8; 32];
        word.copy_from_slice(bytes);
        Ok(Self(word))
    }

    /// Creates a field word holding a 64-bit integer.
    pub fn from_u64(value: u64) -> Self {
        let mut word = [0u8; 32];
        BigEndian::write_u64(&mut word[24..], value);
        Self(word)
    }

    /// Creates a field word holding a 128-bit integer.
    pub fn from_u128(value: u128) -> Self {
        let mut word = [0u8; 32];
        BigEndian::write_u128(&mut word[16..], value);
        Self(word)
    }

    /// Reinterprets an address as a field word.
    pub fn from_address(address: &Address) -> Self {
        Self(*address)
    }

    /// Reduces a 32-byte digest into field range.
    pub fn from_digest(mut digest: [u8; 32]) -> Self {
        digest[0] &= 0x1f;
        Self(digest)
    }

    /// Returns the raw big-endian bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns `true` for the zero word.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Decodes the word as a 64-bit integer, failing if the high bytes are set.
    pub fn to_u64(&self) -> Result<u64, CoreError> {
        if self.0[..24].iter().any(|b| *b != 0) {
            return Err(CoreError::IntegerOverflow {
                value: self.to_string(),
                target: "u64",
            });
        }
        Ok(BigEndian::read_u64(&self.0[24..]))
    }

    /// Decodes the word as a 128-bit integer, failing if the high bytes are set.
    pub fn to_u128(&self) -> Result<u128, CoreError> {
        if self.0[..16].iter().any(|b| *b != 0) {
            return Err(CoreError::IntegerOverflow {
                value: self.to_string(),
                target: "u128",
            });
        }
        Ok(BigEndian::read_u128(&self.0[16..]))
    }

    /// Reinterprets the word as an address.
    pub fn to_address(&self) -> Address {
        self.0
    }
}

impl From<[u8; 32]> for Field {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<u64> for Field {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({})", self)
    }
}

impl FromStr for Field {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| CoreError::InvalidLength {
            what: "hex field word",
            expected: Self::BYTES * 2,
            actual: digits.len(),
        })?;
        Self::from_slice(&bytes)
    }
}

// Field words travel as 0x-prefixed hex strings
impl Serialize for Field {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde helpers for [`Address`] fields, rendered as 0x-prefixed hex.
pub mod hex_address {
    use super::{Address, Field};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes an address as hex.
    pub fn serialize<S>(address: &Address, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&Field::from_address(address).to_string())
    }

    /// Deserializes an address from hex.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let field: Field = s.parse().map_err(serde::de::Error::custom)?;
        Ok(field.to_address())
    }
}

/// Describes who receives a teleport and where.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientDescriptor {
    /// The chain the value must be minted on
    pub chain_id: ChainId,
    /// The address receiving the mint
    #[serde(with = "hex_address")]
    pub recipient: Address,
    /// Blinding tweak hiding the recipient until claim time
    pub tweak: Field,
}

impl RecipientDescriptor {
    /// Creates a new recipient descriptor.
    pub fn new(chain_id: ChainId, recipient: Address, tweak: Field) -> Self {
        Self {
            chain_id,
            recipient,
            tweak,
        }
    }

    /// Computes the recipient commitment.
    ///
    /// `SHA-256(chain_id as a 32-byte word || recipient || tweak)`, reduced into
    /// field range.
    pub fn commitment(&self) -> Field {
        let mut hasher = Sha256::new();
        hasher.update(Field::from_u64(self.chain_id).as_bytes());
        hasher.update(self.recipient);
        hasher.update(self.tweak.as_bytes());

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        Field::from_digest(digest)
    }
}

/// A chain registered with the aggregation root ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The external chain id
    pub chain_id: ChainId,
    /// The transport endpoint id of the chain
    pub eid: EndpointId,
    /// The gateway contract on that chain
    #[serde(with = "hex_address")]
    pub verifier: Address,
    /// The token contract on that chain
    #[serde(with = "hex_address")]
    pub token: Address,
}

impl fmt::Display for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token {{ chain_id: {}, eid: {}, verifier: 0x{}, token: 0x{} }}",
            self.chain_id,
            self.eid,
            hex::encode(self.verifier),
            hex::encode(self.token)
        )
    }
}
