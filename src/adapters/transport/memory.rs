//! In-process radio link for demos and tests.
//!
//! Two ends joined by a pair of `tokio` channels. Delivery is ordered per
//! direction and a write is accepted as soon as it is queued, which is the
//! acknowledged-write semantics the transfer sender relies on. Dropping one
//! end's receiver makes writes from the other end fail with `Closed`.

use std::num::NonZeroUsize;

use tokio::sync::mpsc;

use crate::ports::{Transport, TransportError};

/// Outbound half of one end of the link.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    chunk_size: usize,
}

impl Transport for MemoryTransport {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        self.tx
            .send(message.to_vec())
            .map_err(|_| TransportError::Closed)
    }

    fn negotiated_chunk_size(&self) -> usize {
        self.chunk_size
    }
}

/// One end of a link: where to write, and what the peer wrote.
#[derive(Debug)]
pub struct LinkEnd {
    pub transport: MemoryTransport,
    pub inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// Create a connected `(central, peripheral)` pair. `max_write` is what
/// both ends report as their negotiated chunk size; handshake messages are
/// not held to it.
#[must_use]
pub fn link(max_write: NonZeroUsize) -> (LinkEnd, LinkEnd) {
    let (to_peripheral, peripheral_rx) = mpsc::unbounded_channel();
    let (to_central, central_rx) = mpsc::unbounded_channel();
    let central = LinkEnd {
        transport: MemoryTransport {
            tx: to_peripheral,
            chunk_size: max_write.get(),
        },
        inbound: central_rx,
    };
    let peripheral = LinkEnd {
        transport: MemoryTransport {
            tx: to_central,
            chunk_size: max_write.get(),
        },
        inbound: peripheral_rx,
    };
    (central, peripheral)
}
