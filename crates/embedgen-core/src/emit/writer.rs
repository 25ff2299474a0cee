//! Extensible chunk sink traits.
//!
//! This module provides the [`ArtifactWriter`] trait through which the
//! generation pipeline hands over planned chunks.

use crate::chunk::Chunk;
use std::fmt::Result;

/// Trait for consuming planned chunks.
///
/// The C++ definition writer is the main implementation; others can observe
/// the same sequence, for example to collect statistics.
///
/// # Example
///
/// ```
/// use embedgen_core::{ArtifactWriter, Chunk};
///
/// #[derive(Default)]
/// struct Checksum(u64);
///
/// impl ArtifactWriter for Checksum {
///     fn write_chunk(&mut self, chunk: &Chunk) -> std::fmt::Result {
///         self.0 += chunk.as_bytes().iter().map(|&b| u64::from(b)).sum::<u64>();
///         Ok(())
///     }
/// }
/// ```
pub trait ArtifactWriter {
    /// Consume the next chunk, in ordinal order
    fn write_chunk(&mut self, chunk: &Chunk) -> Result {
        let _ = chunk;
        Ok(())
    }

    /// Called once after the last chunk
    fn finish(&mut self) -> Result {
        Ok(())
    }
}

impl<T: ArtifactWriter + ?Sized> ArtifactWriter for &mut T {
    fn write_chunk(&mut self, chunk: &Chunk) -> Result {
        (**self).write_chunk(chunk)
    }

    fn finish(&mut self) -> Result {
        (**self).finish()
    }
}

/// A no-op writer that discards all chunks
pub struct NullWriter;

impl ArtifactWriter for NullWriter {}

/// A writer that collects statistics about the chunk sequence
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatsWriter {
    /// Number of chunks
    pub chunk_count: usize,
    /// Total raw bytes across all chunks
    pub byte_count: u64,
    /// Size of the largest chunk
    pub largest_chunk: usize,
    /// Size of the last chunk
    pub last_chunk: usize,
    /// Whether [`ArtifactWriter::finish`] was called
    pub finished: bool,
}

impl ArtifactWriter for StatsWriter {
    fn write_chunk(&mut self, chunk: &Chunk) -> Result {
        self.chunk_count += 1;
        self.byte_count += chunk.len() as u64;
        self.largest_chunk = self.largest_chunk.max(chunk.len());
        self.last_chunk = chunk.len();
        Ok(())
    }

    fn finish(&mut self) -> Result {
        self.finished = true;
        Ok(())
    }
}
