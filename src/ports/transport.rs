use thiserror::Error;

/// Errors surfaced by transport port operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    #[error("link closed")]
    Closed,
    #[error("backpressure: write not accepted")]
    Backpressure,
}

/// Outbound half of a message-oriented, per-link-ordered radio link.
///
/// Inbound traffic is not pulled through this trait; the owner of the link
/// pushes each received message into the session (see
/// `application::session::Session::on_transport_message`).
pub trait Transport {
    /// Queue one message for sending.
    ///
    /// # Errors
    /// * `TransportError::Closed` if the link is gone.
    /// * `TransportError::Backpressure` if the send buffer is full.
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError>;

    /// Write one message and return only once the link has accepted it.
    ///
    /// The transfer sender calls this per chunk and does not move to the next
    /// chunk until it returns. Links without a separate acknowledged write path
    /// fall back to [`Transport::send`].
    ///
    /// # Errors
    /// Same as [`Transport::send`].
    fn send_acknowledged(&mut self, message: &[u8]) -> Result<(), TransportError> {
        self.send(message)
    }

    /// Largest payload one write may carry. Always > 0.
    fn negotiated_chunk_size(&self) -> usize;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        (**self).send(message)
    }
    fn send_acknowledged(&mut self, message: &[u8]) -> Result<(), TransportError> {
        (**self).send_acknowledged(message)
    }
    fn negotiated_chunk_size(&self) -> usize {
        (**self).negotiated_chunk_size()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        (**self).send(message)
    }
    fn send_acknowledged(&mut self, message: &[u8]) -> Result<(), TransportError> {
        (**self).send_acknowledged(message)
    }
    fn negotiated_chunk_size(&self) -> usize {
        (**self).negotiated_chunk_size()
    }
}
