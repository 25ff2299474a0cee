//! Chunk planning for embedded byte streams.
//!
//! A [`ChunkPlanner`] reads a stream front to back and cuts it into
//! [`Chunk`]s that each carry at most `max_chunk_bytes - 1` raw bytes.
//! Every chunk but the last is full; an empty stream produces no chunks.
//!
//! ```
//! use embedgen_core::ChunkPlanner;
//!
//! let data = vec![b'A'; 5000];
//! let sizes: Vec<usize> = ChunkPlanner::new(data.as_slice(), 4096)?
//!     .map(|chunk| chunk.map(|c| c.len()))
//!     .collect::<Result<_, _>>()?;
//!
//! assert_eq!(sizes, [4095, 905]);
//! # Ok::<(), embedgen_core::Error>(())
//! ```

mod reader;

use crate::config::MIN_MAX_CHUNK_BYTES;
use crate::error::{Error, Result};
use crate::escape::{escape_bytes, unescape, ESCAPE_WIDTH};
use bytes::{Bytes, BytesMut};
use std::io::Read;
use std::iter::FusedIterator;
use tracing::{debug, trace};

/// A contiguous slice of the input together with its escaped rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    ordinal: usize,
    data: Bytes,
    literal: String,
}

impl Chunk {
    /// Creates a chunk and renders its escaped literal
    pub fn new(ordinal: usize, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let literal = escape_bytes(&data);
        Self {
            ordinal,
            data,
            literal,
        }
    }

    /// Zero-based position of this chunk in the stream
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Number of raw bytes in this chunk
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the chunk carries no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw bytes of this chunk
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Escaped literal body, without quotes or line breaks
    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Splits the literal into pieces of `units_per_line` escaped bytes
    pub fn literal_lines(&self, units_per_line: usize) -> impl Iterator<Item = &str> + '_ {
        let width = units_per_line.max(1) * ESCAPE_WIDTH;
        let len = self.literal.len();
        (0..len)
            .step_by(width)
            .map(move |start| &self.literal[start..(start + width).min(len)])
    }

    /// Decodes the escaped literal back into raw bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        unescape(&self.literal)
    }
}

/// Splits a byte stream into bounded chunks
#[derive(Debug)]
pub struct ChunkPlanner<R> {
    reader: R,
    payload_limit: usize,
    next_ordinal: usize,
    consumed: u64,
    finished: bool,
}

impl<R: Read> ChunkPlanner<R> {
    /// Creates a planner over `reader` with the given chunk bound
    pub fn new(reader: R, max_chunk_bytes: usize) -> Result<Self> {
        if max_chunk_bytes < MIN_MAX_CHUNK_BYTES {
            return Err(Error::InvalidChunkSize {
                value: max_chunk_bytes,
            });
        }

        Ok(Self {
            reader,
            payload_limit: max_chunk_bytes - 1,
            next_ordinal: 0,
            consumed: 0,
            finished: false,
        })
    }

    /// Maximum number of raw bytes per chunk
    pub fn payload_limit(&self) -> usize {
        self.payload_limit
    }

    /// Total bytes read from the stream so far
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        let mut buf = BytesMut::new();
        let filled = reader::fill_up_to(&mut self.reader, &mut buf, self.payload_limit)
            .map_err(|e| Error::read(self.consumed, e))?;

        if filled < self.payload_limit {
            self.finished = true;
        }
        if filled == 0 {
            debug!(
                "End of stream after {} chunk(s), {} bytes",
                self.next_ordinal, self.consumed
            );
            return Ok(None);
        }

        let chunk = Chunk::new(self.next_ordinal, buf.freeze());
        trace!(
            "Planned chunk {} at offset {} ({} bytes)",
            chunk.ordinal(),
            self.consumed,
            filled
        );

        self.next_ordinal += 1;
        self.consumed += filled as u64;

        if self.finished {
            debug!(
                "End of stream after {} chunk(s), {} bytes",
                self.next_ordinal, self.consumed
            );
        }
        Ok(Some(chunk))
    }
}

impl<R: Read> Iterator for ChunkPlanner<R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_chunk() {
            Ok(chunk) => chunk.map(Ok),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> FusedIterator for ChunkPlanner<R> {}
