//! Chunk framing rules for the post-authentication file stream.
//!
//! There is no length prefix. The receiver recognizes the end of a payload by
//! one of two signals, checked in order on every chunk:
//!
//! 1. the chunk is exactly [`END_OF_FILE_MARKER`] (not part of the file);
//! 2. a previous chunk length is known and this chunk is strictly shorter
//!    (this chunk is the last piece of the file).
//!
//! A payload whose last chunk is a full `C` bytes, or that fits in a single
//! chunk, never trips signal 2. [`ChunkPlan`] decides whether the sender must
//! follow the data with the marker.

use crate::domain::transfer::{END_OF_FILE_MARKER, EndOfTransfer};
use std::num::NonZeroUsize;

/// How a payload is cut for a given chunk size.
#[derive(Debug, Clone, Copy)]
pub struct ChunkPlan<'a> {
    payload: &'a [u8],
    chunk_size: NonZeroUsize,
    sentinel: bool,
}

impl<'a> ChunkPlan<'a> {
    #[must_use]
    pub fn new(payload: &'a [u8], chunk_size: NonZeroUsize, policy: EndOfTransfer) -> Self {
        let sentinel = match policy {
            EndOfTransfer::Legacy => false,
            EndOfTransfer::SentinelWhenAmbiguous => {
                let c = chunk_size.get();
                payload.len() <= c || payload.len() % c == 0
            }
        };
        Self {
            payload,
            chunk_size,
            sentinel,
        }
    }

    /// Data chunks in send order. Every chunk is `chunk_size` bytes except
    /// possibly the last.
    pub fn data_chunks(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.payload.chunks(self.chunk_size.get())
    }

    #[must_use]
    pub fn data_chunk_count(&self) -> usize {
        self.payload.len().div_ceil(self.chunk_size.get())
    }

    /// Whether [`END_OF_FILE_MARKER`] follows the data chunks.
    #[must_use]
    pub fn needs_sentinel(&self) -> bool {
        self.sentinel
    }

    /// Data chunks followed by the marker when required.
    pub fn frames(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        let tail: &'a [u8] = END_OF_FILE_MARKER;
        self.data_chunks()
            .chain(self.sentinel.then_some(tail))
    }
}

/// Verdict for one inbound chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Append the chunk and wait for more.
    Continue,
    /// Transfer complete. `append` says whether the chunk belongs to the file.
    Complete { append: bool },
}

/// Receiver side end-of-payload detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundaryDetector {
    previous: Option<usize>,
}

impl BoundaryDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `chunk`. Resets itself when it reports `Complete`.
    ///
    /// A zero-length chunk is data like any other: it completes a transfer
    /// only by shrinkage, and once recorded as `previous` nothing can shrink
    /// below it, so only the sentinel ends that transfer.
    pub fn observe(&mut self, chunk: &[u8]) -> Boundary {
        if chunk == END_OF_FILE_MARKER {
            self.reset();
            return Boundary::Complete { append: false };
        }
        if let Some(prev) = self.previous
            && chunk.len() < prev
        {
            self.reset();
            return Boundary::Complete { append: true };
        }
        self.previous = Some(chunk.len());
        Boundary::Continue
    }

    /// Length of the last non-final chunk, if any.
    #[must_use]
    pub fn previous(&self) -> Option<usize> {
        self.previous
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}
