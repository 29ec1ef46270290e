use std::num::NonZeroUsize;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::transfer::EndOfTransfer;
use crate::ports::{Transport, TransportError};
use crate::protocol::transfer::ChunkPlan;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("transport reported a chunk size of zero")]
    ZeroChunkSize,
    #[error("chunk {index} not accepted: {source}")]
    Transport {
        index: usize,
        #[source]
        source: TransportError,
    },
}

/// Summary of a completed send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    pub bytes: usize,
    pub chunk_size: usize,
    pub data_chunks: usize,
    pub sentinel_sent: bool,
}

/// Writes a payload to the link one acknowledged chunk at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkSender {
    policy: EndOfTransfer,
}

impl ChunkSender {
    #[must_use]
    pub fn new(policy: EndOfTransfer) -> Self {
        Self { policy }
    }

    /// Send `payload` in order. Chunk `i + 1` is not written until chunk `i`
    /// was accepted; the first refusal aborts the transfer.
    ///
    /// # Errors
    /// * `TransferError::ZeroChunkSize` if the link reports no capacity.
    /// * `TransferError::Transport` with the index of the refused chunk.
    pub fn send<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        payload: &[u8],
    ) -> Result<TransferReport, TransferError> {
        let chunk_size = NonZeroUsize::new(transport.negotiated_chunk_size())
            .ok_or(TransferError::ZeroChunkSize)?;
        let plan = ChunkPlan::new(payload, chunk_size, self.policy);
        let total = plan.data_chunk_count();
        debug!(
            bytes = payload.len(),
            chunk_size = chunk_size.get(),
            chunks = total,
            sentinel = plan.needs_sentinel(),
            "sending payload"
        );
        for (index, frame) in plan.frames().enumerate() {
            transport
                .send_acknowledged(frame)
                .map_err(|source| TransferError::Transport { index, source })?;
            debug!(index, len = frame.len(), "chunk accepted");
        }
        info!(bytes = payload.len(), chunks = total, "payload sent");
        Ok(TransferReport {
            bytes: payload.len(),
            chunk_size: chunk_size.get(),
            data_chunks: total,
            sentinel_sent: plan.needs_sentinel(),
        })
    }
}
