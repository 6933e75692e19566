//! Cross-chain message types for teleports.

use crate::errors::NetworkError;
use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};
use std::fmt;
use teleport_core::types::{hex_address, Address, EndpointId, Field};

/// Width of both protocol payloads: one field word plus one integer word.
pub const PAYLOAD_LEN: usize = 64;

fn encode_word_pair(word: &Field, value: u64) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(PAYLOAD_LEN);

    // bytes32 word
    encoded.extend_from_slice(word.as_bytes());

    // uint64 value, left-padded to 32 bytes
    let mut value_bytes = [0u8; 32];
    BigEndian::write_u64(&mut value_bytes[24..], value);
    encoded.extend_from_slice(&value_bytes);

    encoded
}

fn decode_word_pair(what: &'static str, bytes: &[u8]) -> Result<(Field, u64), NetworkError> {
    if bytes.len() != PAYLOAD_LEN {
        return Err(NetworkError::InvalidPayload {
            what,
            expected: PAYLOAD_LEN,
            actual: bytes.len(),
        });
    }

    let word = Field::from_slice(&bytes[..32])
        .map_err(|e| NetworkError::InvalidMessage(e.to_string()))?;
    let value = Field::from_slice(&bytes[32..])
        .and_then(|w| w.to_u64())
        .map_err(|e| NetworkError::InvalidMessage(format!("{}: {}", what, e)))?;

    Ok((word, value))
}

/// Gateway -> hub: the gateway's latest proved transfer root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootUpdateMsg {
    /// The proved transfer root
    pub root: Field,
    /// The transfer index the root was proved at
    pub index: u64,
}

impl RootUpdateMsg {
    /// Encodes the message as a fixed 64-byte payload.
    pub fn encode(&self) -> Vec<u8> {
        encode_word_pair(&self.root, self.index)
    }

    /// Decodes a 64-byte payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, NetworkError> {
        let (root, index) = decode_word_pair("root update", bytes)?;
        Ok(Self { root, index })
    }
}

/// Hub -> gateway: the aggregation root for one broadcast sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalRootMsg {
    /// The aggregation root
    pub root: Field,
    /// The broadcast sequence number
    pub agg_seq: u64,
}

impl GlobalRootMsg {
    /// Encodes the message as a fixed 64-byte payload.
    pub fn encode(&self) -> Vec<u8> {
        encode_word_pair(&self.root, self.agg_seq)
    }

    /// Decodes a 64-byte payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, NetworkError> {
        let (root, agg_seq) = decode_word_pair("global root", bytes)?;
        Ok(Self { root, agg_seq })
    }
}

/// Authentication metadata delivered with every inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// The endpoint the message was sent from
    pub src_eid: EndpointId,
    /// The application that sent it
    #[serde(with = "hex_address")]
    pub sender: Address,
    /// Per-path outbound nonce
    pub nonce: u64,
}

/// Fee charged for one message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingFee {
    /// Fee in the chain's native currency
    pub native_fee: u128,
    /// Fee in the transport's secondary fee token
    pub lz_token_fee: u128,
}

impl MessagingFee {
    /// Creates a native-only fee.
    pub fn native(native_fee: u128) -> Self {
        Self {
            native_fee,
            lz_token_fee: 0,
        }
    }
}

/// Receipt returned when a message is accepted by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingReceipt {
    /// Globally unique message id
    pub guid: Field,
    /// Per-path outbound nonce
    pub nonce: u64,
    /// The fee that was charged
    pub fee: MessagingFee,
}

/// A message in flight between two endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Where the message came from
    pub origin: Origin,
    /// Where the message is going
    pub dst_eid: EndpointId,
    /// Globally unique message id
    pub guid: Field,
    /// The application payload
    pub payload: Vec<u8>,
    /// Executor options supplied by the sender
    pub options: Vec<u8>,
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet {{ {} -> {}, nonce: {}, guid: {}, {} bytes }}",
            self.origin.src_eid,
            self.dst_eid,
            self.origin.nonce,
            self.guid,
            self.payload.len()
        )
    }
}
