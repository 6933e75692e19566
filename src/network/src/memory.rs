//! In-memory transport whose deliveries are driven by the caller.

use crate::errors::NetworkError;
use crate::transport::{FeeSchedule, Outbox, Transport};
use crate::types::{MessagingFee, MessagingReceipt, Packet};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use teleport_core::types::{Address, EndpointId};

/// A shared queue of packets sent by any endpoint attached to it.
///
/// Nothing is delivered automatically: callers drain the queue and hand the
/// packets to their destinations, in any order and as many times as they
/// like, which is how duplicate and out-of-order delivery is exercised.
#[derive(Clone, Default)]
pub struct MessageBus {
    /// Packets not yet taken by the caller
    queue: Arc<Mutex<VecDeque<Packet>>>,
}

impl MessageBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a sending endpoint to the bus.
    pub fn endpoint(&self, eid: EndpointId, sender: Address, fees: FeeSchedule) -> BusEndpoint {
        BusEndpoint {
            outbox: Outbox::new(eid, sender, fees),
            queue: Arc::clone(&self.queue),
        }
    }

    /// Removes and returns every queued packet in send order.
    pub fn drain(&self) -> Result<Vec<Packet>, NetworkError> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|e| NetworkError::TransportError(e.to_string()))?;
        Ok(queue.drain(..).collect())
    }

    /// Returns the number of queued packets.
    pub fn pending(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }
}

/// One chain's handle onto a [`MessageBus`].
pub struct BusEndpoint {
    /// Nonces and pricing
    outbox: Outbox,
    /// The shared queue
    queue: Arc<Mutex<VecDeque<Packet>>>,
}

impl Transport for BusEndpoint {
    fn local_eid(&self) -> EndpointId {
        self.outbox.eid()
    }

    fn sender(&self) -> Address {
        self.outbox.sender()
    }

    fn quote(&self, dst_eid: EndpointId, payload: &[u8], options: &[u8]) -> Result<MessagingFee, NetworkError> {
        self.outbox.quote(dst_eid, payload, options)
    }

    fn send(
        &mut self,
        dst_eid: EndpointId,
        payload: &[u8],
        options: &[u8],
        fee: MessagingFee,
        refund_to: &Address,
    ) -> Result<MessagingReceipt, NetworkError> {
        let (packet, receipt) = self.outbox.build(dst_eid, payload, options, fee)?;
        log::debug!(
            "Queued {} (refund {} to 0x{})",
            packet,
            fee.native_fee - receipt.fee.native_fee,
            hex::encode(refund_to)
        );

        self.queue
            .lock()
            .map_err(|e| NetworkError::TransportError(e.to_string()))?
            .push_back(packet);

        Ok(receipt)
    }
}
