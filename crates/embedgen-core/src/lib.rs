//! # embedgen-core
//!
//! A library for embedding binary files into C++ programs as constant data.
//!
//! This crate provides the core functionality for:
//! - Splitting a byte stream into bounded chunks
//! - Escaping every byte into a fixed-width octal string literal unit
//! - Rendering a header/source pair that exposes the chunks to C++ code
//! - Parsing a generated source file back into the original bytes
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`]: Generation settings and identifier validation
//! - [`escape`]: The byte escape table
//! - [`chunk`]: Chunk planning over a forward-only reader
//! - [`emit`]: Declaration and definition artifact rendering
//! - [`roundtrip`]: Reconstruction and verification of emitted data
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use embedgen_core::{generate, roundtrip, EmbedSpec};
//!
//! let spec = EmbedSpec::new("lorem").namespace("example");
//! let data = b"Lorem ipsum dolor sit amet";
//!
//! let artifacts = generate(&spec, &data[..])?;
//! assert!(artifacts.declaration.contains("extern std::size_t lorem_num_chunks;"));
//! assert_eq!(roundtrip::reconstruct(&artifacts.definition, "lorem")?, data);
//! # Ok::<(), embedgen_core::Error>(())
//! ```
//!
//! ## Extensibility
//!
//! - [`ArtifactWriter`]: Observe or consume the planned chunk sequence
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod chunk;
pub mod config;
pub mod emit;
pub mod error;
pub mod escape;
pub mod roundtrip;

// Re-export primary types for convenience
pub use chunk::{Chunk, ChunkPlanner};
pub use config::{
    is_valid_identifier, resolve_header_path, EmbedSpec, DEFAULT_MAX_CHUNK_BYTES,
    MIN_MAX_CHUNK_BYTES,
};
pub use emit::{
    generate, generate_file, generate_with, render, render_declaration, ArtifactWriter,
    DefinitionWriter, GeneratedArtifacts, NullWriter, StatsWriter, UNITS_PER_LINE,
};
pub use error::{Error, Result};
pub use escape::{escape, escape_bytes, unescape, ESCAPE_WIDTH};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
