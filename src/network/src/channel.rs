//! Transport that hands packets to an asynchronous relayer over a tokio channel.

use crate::errors::NetworkError;
use crate::transport::{FeeSchedule, Outbox, Transport};
use crate::types::{MessagingFee, MessagingReceipt, Packet};
use teleport_core::types::{Address, EndpointId};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Creates the packet channel shared by every [`ChannelTransport`] of a network.
pub fn packet_channel() -> (UnboundedSender<Packet>, UnboundedReceiver<Packet>) {
    unbounded_channel()
}

/// Sends packets into a channel drained by a relayer task.
pub struct ChannelTransport {
    /// Nonces and pricing
    outbox: Outbox,
    /// The relayer's inbox
    tx: UnboundedSender<Packet>,
}

impl ChannelTransport {
    /// Creates a transport for `sender` on endpoint `eid`.
    pub fn new(eid: EndpointId, sender: Address, fees: FeeSchedule, tx: UnboundedSender<Packet>) -> Self {
        Self {
            outbox: Outbox::new(eid, sender, fees),
            tx,
        }
    }
}

impl Transport for ChannelTransport {
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
        _refund_to: &Address,
    ) -> Result<MessagingReceipt, NetworkError> {
        // Fail before consuming a nonce when nobody is listening
        if self.tx.is_closed() {
            return Err(NetworkError::ChannelClosed);
        }

        let (packet, receipt) = self.outbox.build(dst_eid, payload, options, fee)?;
        log::debug!("Sending {}", packet);

        self.tx.send(packet).map_err(|_| NetworkError::ChannelClosed)?;
        Ok(receipt)
    }
}
