//! Transport capability consumed by the hub and the gateways.

use crate::errors::NetworkError;
use crate::types::{MessagingFee, MessagingReceipt, Origin, Packet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use teleport_core::types::{Address, EndpointId, Field};

/// A one-way asynchronous message channel between chains.
///
/// `send` only hands the message to the transport; delivery happens later,
/// at least once, in no particular order relative to other paths.
pub trait Transport {
    /// The endpoint id of the chain this transport sends from.
    fn local_eid(&self) -> EndpointId;

    /// The application address recorded as the sender of every message.
    fn sender(&self) -> Address;

    /// Quotes the fee for sending `payload` to `dst_eid`.
    fn quote(&self, dst_eid: EndpointId, payload: &[u8], options: &[u8]) -> Result<MessagingFee, NetworkError>;

    /// Sends `payload` to `dst_eid`, paying `fee`. Excess is refunded to `refund_to`.
    fn send(
        &mut self,
        dst_eid: EndpointId,
        payload: &[u8],
        options: &[u8],
        fee: MessagingFee,
        refund_to: &Address,
    ) -> Result<MessagingReceipt, NetworkError>;
}

/// Linear message pricing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Flat fee per message
    pub base_fee: u128,
    /// Fee per payload and options byte
    pub per_byte_fee: u128,
    /// Fee requested in the secondary fee token, normally zero
    #[serde(default)]
    pub lz_token_fee: u128,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_fee: 1_000,
            per_byte_fee: 10,
            lz_token_fee: 0,
        }
    }
}

impl FeeSchedule {
    /// Prices a message with the given payload and options sizes.
    pub fn quote(&self, payload_len: usize, options_len: usize) -> MessagingFee {
        let bytes = (payload_len + options_len) as u128;
        MessagingFee {
            native_fee: self.base_fee.saturating_add(self.per_byte_fee.saturating_mul(bytes)),
            lz_token_fee: self.lz_token_fee,
        }
    }
}

/// Computes the globally unique id of a message.
///
/// `SHA-256(nonce || src_eid || sender || dst_eid || payload)`
pub fn compute_guid(nonce: u64, src_eid: EndpointId, sender: &Address, dst_eid: EndpointId, payload: &[u8]) -> Field {
    let mut hasher = Sha256::new();
    hasher.update(nonce.to_be_bytes());
    hasher.update(src_eid.to_be_bytes());
    hasher.update(sender);
    hasher.update(dst_eid.to_be_bytes());
    hasher.update(payload);

    let mut guid = [0u8; 32];
    guid.copy_from_slice(&hasher.finalize());
    Field::from_bytes(guid)
}

/// Sender-side bookkeeping shared by the concrete transports.
#[derive(Clone, Debug)]
pub struct Outbox {
    /// The local endpoint id
    eid: EndpointId,
    /// The sending application
    sender: Address,
    /// Message pricing
    fees: FeeSchedule,
    /// Last used nonce per destination
    nonces: HashMap<EndpointId, u64>,
}

impl Outbox {
    /// Creates an outbox for `sender` on endpoint `eid`.
    pub fn new(eid: EndpointId, sender: Address, fees: FeeSchedule) -> Self {
        Self {
            eid,
            sender,
            fees,
            nonces: HashMap::new(),
        }
    }

    /// The local endpoint id.
    pub fn eid(&self) -> EndpointId {
        self.eid
    }

    /// The sending application.
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Quotes a message to `dst_eid`.
    pub fn quote(&self, dst_eid: EndpointId, payload: &[u8], options: &[u8]) -> Result<MessagingFee, NetworkError> {
        if dst_eid == self.eid {
            return Err(NetworkError::UnknownDestination(dst_eid));
        }
        Ok(self.fees.quote(payload.len(), options.len()))
    }

    /// Validates the fee and assembles the next packet to `dst_eid`.
    pub fn build(
        &mut self,
        dst_eid: EndpointId,
        payload: &[u8],
        options: &[u8],
        fee: MessagingFee,
    ) -> Result<(Packet, MessagingReceipt), NetworkError> {
        let quoted = self.quote(dst_eid, payload, options)?;
        if fee.native_fee < quoted.native_fee {
            return Err(NetworkError::InsufficientFee {
                required: quoted.native_fee,
                supplied: fee.native_fee,
            });
        }
        if fee.lz_token_fee < quoted.lz_token_fee {
            return Err(NetworkError::InsufficientFee {
                required: quoted.lz_token_fee,
                supplied: fee.lz_token_fee,
            });
        }

        let nonce = {
            let entry = self.nonces.entry(dst_eid).or_insert(0);
            *entry += 1;
            *entry
        };
        let guid = compute_guid(nonce, self.eid, &self.sender, dst_eid, payload);

        let packet = Packet {
            origin: Origin {
                src_eid: self.eid,
                sender: self.sender,
                nonce,
            },
            dst_eid,
            guid,
            payload: payload.to_vec(),
            options: options.to_vec(),
        };
        let receipt = MessagingReceipt {
            guid,
            nonce,
            fee: quoted,
        };

        Ok((packet, receipt))
    }
}
