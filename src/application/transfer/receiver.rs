use tracing::{debug, info};

use crate::protocol::transfer::{Boundary, BoundaryDetector};

/// Inbound file being reassembled on the server.
///
/// Chunks are appended strictly in arrival order. After a completed payload
/// is handed out, the buffer is empty and the boundary detector is reset, so
/// the next chunk starts a new transfer.
#[derive(Debug, Default)]
pub struct TransferBuffer {
    data: Vec<u8>,
    detector: BoundaryDetector,
    in_progress: bool,
}

impl TransferBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept one chunk. Returns the whole payload when this chunk ends it.
    pub fn push(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
        if !self.in_progress {
            self.data.clear();
            self.in_progress = true;
            debug!("transfer started");
        }
        match self.detector.observe(chunk) {
            Boundary::Continue => {
                self.data.extend_from_slice(chunk);
                debug!(len = chunk.len(), total = self.data.len(), "chunk buffered");
                None
            }
            Boundary::Complete { append } => {
                if append {
                    self.data.extend_from_slice(chunk);
                }
                self.in_progress = false;
                let file = std::mem::take(&mut self.data);
                info!(bytes = file.len(), "transfer complete");
                Some(file)
            }
        }
    }

    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Bytes buffered so far for the transfer in progress.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drop any partial payload.
    pub fn reset(&mut self) {
        self.data.clear();
        self.detector.reset();
        self.in_progress = false;
    }
}
