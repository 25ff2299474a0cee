//! C++ artifact emission.
//!
//! This module renders the two generated files:
//!
//! - the declaration artifact (a header with an include guard and three
//!   `extern` declarations), and
//! - the definition artifact (the chunk literal array, the chunk count and
//!   the chunk size table).
//!
//! For an identifier `lorem` the consumer sees:
//!
//! ```text
//! extern std::size_t lorem_num_chunks;
//! extern const char* lorem_chunks[];
//! extern std::size_t lorem_chunk_sizes[];
//! ```
//!
//! and can rebuild the input by walking `lorem_chunks` and
//! `lorem_chunk_sizes` in lock-step up to `lorem_num_chunks`.
//!
//! ## Extensibility
//!
//! Chunks reach the [`DefinitionWriter`] through the [`ArtifactWriter`]
//! trait, and [`generate_with`] lets an extra writer observe the same
//! sequence.

mod writer;

use crate::chunk::{Chunk, ChunkPlanner};
use crate::config::EmbedSpec;
use crate::error::{Error, Result};
use std::borrow::Borrow;
use std::fmt::{self, Write as FmtWrite};
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace};

pub use writer::{ArtifactWriter, NullWriter, StatsWriter};

/// Escaped bytes per source line inside a chunk literal
pub const UNITS_PER_LINE: usize = 20;

const INDENT: &str = "    ";

/// The declaration and definition texts produced by one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    /// Header text declaring the generated symbols
    pub declaration: String,
    /// Source text defining the generated symbols
    pub definition: String,
    /// Raw size of every emitted chunk, in order
    pub chunk_sizes: Vec<usize>,
}

impl GeneratedArtifacts {
    /// Number of emitted chunks
    pub fn num_chunks(&self) -> usize {
        self.chunk_sizes.len()
    }

    /// Total embedded bytes
    pub fn byte_count(&self) -> u64 {
        self.chunk_sizes.iter().map(|&s| s as u64).sum()
    }
}

fn open_namespace(w: &mut impl FmtWrite, spec: &EmbedSpec) -> fmt::Result {
    if let Some(ns) = spec.namespace_name() {
        write!(w, "namespace {} {{\n\n", ns)?;
    }
    Ok(())
}

fn close_namespace(w: &mut impl FmtWrite, spec: &EmbedSpec) -> fmt::Result {
    if let Some(ns) = spec.namespace_name() {
        write!(w, "\n}} // namespace {}\n", ns)?;
    }
    Ok(())
}

/// Write the declaration artifact for `spec`
pub fn write_declaration(spec: &EmbedSpec, w: &mut impl FmtWrite) -> fmt::Result {
    let id = &spec.identifier;

    writeln!(w, "#ifndef INCLUDED_EMBED_{}", id)?;
    writeln!(w, "#define INCLUDED_EMBED_{}", id)?;
    writeln!(w, "#include <cstddef>")?;
    writeln!(w)?;
    open_namespace(w, spec)?;
    writeln!(w, "extern std::size_t {}_num_chunks;", id)?;
    writeln!(w, "extern const char* {}_chunks[];", id)?;
    writeln!(w, "extern std::size_t {}_chunk_sizes[];", id)?;
    close_namespace(w, spec)?;
    writeln!(w)?;
    writeln!(w, "#endif")
}

/// Render the declaration artifact as a string
pub fn render_declaration(spec: &EmbedSpec) -> String {
    let mut output = String::new();
    write_declaration(spec, &mut output).expect("String write cannot fail");
    output
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Pending,
    Open,
    Finished,
}

/// Streams the definition artifact into a [`fmt::Write`] sink
#[derive(Debug)]
pub struct DefinitionWriter<'a, W: FmtWrite> {
    writer: W,
    spec: &'a EmbedSpec,
    chunk_sizes: Vec<usize>,
    next_ordinal: usize,
    state: State,
}

impl<'a, W: FmtWrite> DefinitionWriter<'a, W> {
    /// Creates a definition writer. Nothing is written until the first chunk
    /// or [`ArtifactWriter::finish`].
    pub fn new(spec: &'a EmbedSpec, writer: W) -> Self {
        Self {
            writer,
            spec,
            chunk_sizes: Vec::new(),
            next_ordinal: 0,
            state: State::Pending,
        }
    }

    /// Sizes of the chunks written so far
    pub fn chunk_sizes(&self) -> &[usize] {
        &self.chunk_sizes
    }

    /// Ordinal the next chunk must carry
    pub fn next_ordinal(&self) -> usize {
        self.next_ordinal
    }

    /// Writes `chunk`, reporting a chunk that arrives out of sequence as
    /// [`Error::ChunkOrder`]
    pub fn write_next(&mut self, chunk: &Chunk) -> Result<()> {
        if chunk.ordinal() != self.next_ordinal {
            return Err(Error::ChunkOrder {
                expected: self.next_ordinal,
                found: chunk.ordinal(),
            });
        }
        Ok(self.write_chunk(chunk)?)
    }

    /// Returns the sink and the recorded chunk sizes
    pub fn into_parts(self) -> (W, Vec<usize>) {
        (self.writer, self.chunk_sizes)
    }

    fn open(&mut self) -> fmt::Result {
        if self.state != State::Pending {
            return Ok(());
        }

        writeln!(self.writer, "#include <{}>", self.spec.include_path())?;
        writeln!(self.writer)?;
        open_namespace(&mut self.writer, self.spec)?;
        writeln!(self.writer, "const char* {}_chunks[] = {{", self.spec.identifier)?;

        self.state = State::Open;
        Ok(())
    }
}

impl<W: FmtWrite> ArtifactWriter for DefinitionWriter<'_, W> {
    fn write_chunk(&mut self, chunk: &Chunk) -> fmt::Result {
        if self.state == State::Finished || chunk.ordinal() != self.next_ordinal {
            return Err(fmt::Error);
        }
        self.open()?;
        self.next_ordinal += 1;

        if chunk.is_empty() {
            trace!("Skipping empty chunk {}", chunk.ordinal());
            return Ok(());
        }

        for (i, line) in chunk.literal_lines(UNITS_PER_LINE).enumerate() {
            if i > 0 {
                writeln!(self.writer, "\"")?;
            }
            write!(self.writer, "{}\"{}", INDENT, line)?;
        }
        write!(self.writer, "\",\n\n")?;

        self.chunk_sizes.push(chunk.len());
        Ok(())
    }

    fn finish(&mut self) -> fmt::Result {
        if self.state == State::Finished {
            return Ok(());
        }
        self.open()?;

        let id = &self.spec.identifier;
        writeln!(self.writer, "}}; // {}_chunks", id)?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "std::size_t {}_num_chunks = {};",
            id,
            self.chunk_sizes.len()
        )?;
        writeln!(self.writer)?;
        writeln!(self.writer, "std::size_t {}_chunk_sizes[] = {{", id)?;
        for size in &self.chunk_sizes {
            writeln!(self.writer, "{}{},", INDENT, size)?;
        }
        writeln!(self.writer, "}}; // {}_chunk_sizes", id)?;
        close_namespace(&mut self.writer, self.spec)?;

        self.state = State::Finished;
        Ok(())
    }
}

/// Render both artifacts from an already planned chunk sequence.
///
/// Chunks must arrive in ordinal order starting at zero; anything else is
/// rejected with [`Error::ChunkOrder`].
pub fn render<I>(spec: &EmbedSpec, chunks: I) -> Result<GeneratedArtifacts>
where
    I: IntoIterator,
    I::Item: Borrow<Chunk>,
{
    let mut definition = DefinitionWriter::new(spec, String::new());
    for chunk in chunks {
        definition.write_next(chunk.borrow())?;
    }
    definition.finish()?;

    let (definition, chunk_sizes) = definition.into_parts();
    Ok(GeneratedArtifacts {
        declaration: render_declaration(spec),
        definition,
        chunk_sizes,
    })
}

/// Validate `spec`, plan chunks from `reader` and render both artifacts
pub fn generate<R: Read>(spec: &EmbedSpec, reader: R) -> Result<GeneratedArtifacts> {
    generate_with(spec, reader, NullWriter)
}

/// Like [`generate`], additionally feeding every chunk to `observer`
pub fn generate_with<R, O>(spec: &EmbedSpec, reader: R, mut observer: O) -> Result<GeneratedArtifacts>
where
    R: Read,
    O: ArtifactWriter,
{
    spec.validate()?;

    let planner = ChunkPlanner::new(reader, spec.max_chunk_bytes)?;
    debug!(
        "Generating '{}' with payload limit {} bytes",
        spec.identifier,
        planner.payload_limit()
    );

    let mut definition = DefinitionWriter::new(spec, String::new());
    for chunk in planner {
        let chunk = chunk?;
        definition.write_next(&chunk)?;
        observer.write_chunk(&chunk)?;
    }
    definition.finish()?;
    observer.finish()?;

    let (definition, chunk_sizes) = definition.into_parts();
    debug!(
        "Rendered {} chunk(s) for '{}' ({} bytes of definition text)",
        chunk_sizes.len(),
        spec.identifier,
        definition.len()
    );

    Ok(GeneratedArtifacts {
        declaration: render_declaration(spec),
        definition,
        chunk_sizes,
    })
}

/// Generate artifacts for the file at `path`
pub fn generate_file(spec: &EmbedSpec, path: impl AsRef<Path>) -> Result<GeneratedArtifacts> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| Error::file_read(path, e))?;
    generate(spec, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunks_of(data: &[u8], max_chunk_bytes: usize) -> Vec<Chunk> {
        ChunkPlanner::new(data, max_chunk_bytes)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_declaration_without_namespace() {
        let spec = EmbedSpec::new("test_txt");
        let expected = "\
#ifndef INCLUDED_EMBED_test_txt
#define INCLUDED_EMBED_test_txt
#include <cstddef>

extern std::size_t test_txt_num_chunks;
extern const char* test_txt_chunks[];
extern std::size_t test_txt_chunk_sizes[];

#endif
";
        assert_eq!(render_declaration(&spec), expected);
    }

    #[test]
    fn test_declaration_with_namespace() {
        let spec = EmbedSpec::new("lorem").namespace("example");
        let expected = "\
#ifndef INCLUDED_EMBED_lorem
#define INCLUDED_EMBED_lorem
#include <cstddef>

namespace example {

extern std::size_t lorem_num_chunks;
extern const char* lorem_chunks[];
extern std::size_t lorem_chunk_sizes[];

} // namespace example

#endif
";
        assert_eq!(render_declaration(&spec), expected);
    }

    #[test]
    fn test_definition_with_namespace() {
        let spec = EmbedSpec::new("demo").namespace("res").max_chunk_bytes(4);
        let artifacts = render(&spec, chunks_of(b"hello", 4)).unwrap();

        let expected = r#"#include <demo.hpp>

namespace res {

const char* demo_chunks[] = {
    "\150\145\154",

    "\154\157",

}; // demo_chunks

std::size_t demo_num_chunks = 2;

std::size_t demo_chunk_sizes[] = {
    3,
    2,
}; // demo_chunk_sizes

} // namespace res
"#;
        assert_eq!(artifacts.definition, expected);
        assert_eq!(artifacts.chunk_sizes, vec![3, 2]);
    }

    #[test]
    fn test_definition_empty_input() {
        let spec = EmbedSpec::new("empty").namespace("ns");
        let artifacts = render(&spec, Vec::<Chunk>::new()).unwrap();

        let expected = "\
#include <empty.hpp>

namespace ns {

const char* empty_chunks[] = {
}; // empty_chunks

std::size_t empty_num_chunks = 0;

std::size_t empty_chunk_sizes[] = {
}; // empty_chunk_sizes

} // namespace ns
";
        assert_eq!(artifacts.definition, expected);
        assert_eq!(artifacts.num_chunks(), 0);
        assert!(artifacts.declaration.contains("#ifndef INCLUDED_EMBED_empty"));
        assert!(artifacts.declaration.ends_with("#endif\n"));
    }

    #[test]
    fn test_long_chunk_breaks_lines() {
        let spec = EmbedSpec::new("a").max_chunk_bytes(64);
        let artifacts = render(&spec, chunks_of(&[b'A'; 45], 64)).unwrap();

        let line20 = "\\101".repeat(20);
        let line5 = "\\101".repeat(5);
        let expected_block = format!(
            "    \"{line20}\"\n    \"{line20}\"\n    \"{line5}\",\n\n",
        );
        assert!(artifacts.definition.contains(&expected_block));
    }

    #[test]
    fn test_custom_include_path() {
        let spec = EmbedSpec::new("icon").header_include("assets/icon.hpp");
        let artifacts = render(&spec, chunks_of(b"x", 4096)).unwrap();
        assert!(artifacts.definition.starts_with("#include <assets/icon.hpp>\n\n"));
    }

    #[test]
    fn test_generate_five_thousand() {
        let spec = EmbedSpec::new("big");
        let artifacts = generate(&spec, vec![b'A'; 5000].as_slice()).unwrap();

        assert_eq!(artifacts.chunk_sizes, vec![4095, 905]);
        assert_eq!(artifacts.byte_count(), 5000);
        assert!(artifacts
            .definition
            .contains("std::size_t big_num_chunks = 2;\n"));
        assert!(artifacts.definition.contains("    4095,\n    905,\n"));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let spec = EmbedSpec::new("same").namespace("n").max_chunk_bytes(7);
        let data: Vec<u8> = (0..=255).collect();
        let first = generate(&spec, data.as_slice()).unwrap();
        let second = generate(&spec, data.as_slice()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_generate_rejects_invalid_spec() {
        let spec = EmbedSpec::new("no-dash");
        assert!(matches!(
            generate(&spec, &b"abc"[..]),
            Err(Error::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_generate_with_observer() {
        let spec = EmbedSpec::new("obs").max_chunk_bytes(3);
        let mut stats = StatsWriter::default();
        let artifacts = generate_with(&spec, &b"abcde"[..], &mut stats).unwrap();

        assert_eq!(stats.chunk_count, 3);
        assert_eq!(stats.byte_count, 5);
        assert!(stats.finished);
        assert_eq!(artifacts.chunk_sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_write_after_finish_fails() {
        let spec = EmbedSpec::new("done");
        let mut writer = DefinitionWriter::new(&spec, String::new());
        writer.finish().unwrap();
        assert!(writer.write_chunk(&Chunk::new(0, b"late".to_vec())).is_err());
        assert!(writer.finish().is_ok());
    }

    #[test]
    fn test_render_rejects_out_of_order_chunks() {
        let spec = EmbedSpec::new("order");
        let chunks = [Chunk::new(1, b"cd".to_vec()), Chunk::new(0, b"ab".to_vec())];

        assert!(matches!(
            render(&spec, &chunks),
            Err(Error::ChunkOrder {
                expected: 0,
                found: 1
            })
        ));

        let mut writer = DefinitionWriter::new(&spec, String::new());
        writer.write_chunk(&chunks[1]).unwrap();
        assert!(writer.write_chunk(&chunks[1]).is_err());
        assert_eq!(writer.next_ordinal(), 1);
    }

    #[test]
    fn test_empty_chunk_keeps_its_place() {
        let spec = EmbedSpec::new("gap");
        let chunks = [Chunk::new(0, Vec::new()), Chunk::new(1, b"a".to_vec())];

        let artifacts = render(&spec, &chunks).unwrap();
        assert_eq!(artifacts.chunk_sizes, vec![1]);
    }

    #[test]
    fn test_generate_huge_bound_small_input() {
        for bound in [1usize << 46, usize::MAX] {
            let spec = EmbedSpec::new("big").max_chunk_bytes(bound);
            let artifacts = generate(&spec, &b"hello"[..]).unwrap();
            assert_eq!(artifacts.chunk_sizes, vec![5]);
        }
    }

    #[test]
    fn test_generate_file_missing() {
        let spec = EmbedSpec::new("missing");
        let err = generate_file(&spec, "/definitely/not/here.bin").unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_generate_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"file contents").unwrap();

        let artifacts = generate_file(&EmbedSpec::new("f"), file.path()).unwrap();
        assert_eq!(artifacts.chunk_sizes, vec![13]);
    }
}
