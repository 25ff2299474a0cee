//! Reconstruction of embedded data from a definition artifact.
//!
//! A consumer of the generated code walks `{id}_chunks` and
//! `{id}_chunk_sizes` in lock-step up to `{id}_num_chunks`. This module does
//! the same on the artifact text, which lets a generation run prove that its
//! output decodes back to the exact input.

use crate::error::{Error, Result};
use crate::escape::unescape;
use tracing::debug;

/// Contents recovered from a definition artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    /// Decoded bytes of each chunk literal, in order
    pub chunks: Vec<Vec<u8>>,
    /// Values of the chunk size table
    pub chunk_sizes: Vec<usize>,
    /// Value of the chunk count symbol
    pub num_chunks: usize,
}

impl Reconstruction {
    /// Total number of recovered bytes
    pub fn byte_count(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Concatenates all chunks
    pub fn into_bytes(self) -> Vec<u8> {
        self.chunks.concat()
    }
}

/// Parses a definition artifact for `identifier`.
///
/// Fails if the text lacks one of the three generated symbols, if a literal
/// holds anything but fixed-width octal escapes, or if the count, the
/// literal array and the size table disagree.
pub fn parse_definition(text: &str, identifier: &str) -> Result<Reconstruction> {
    let literals_body = block(
        text,
        &format!("{identifier}_chunks[] = {{"),
        &format!("}}; // {identifier}_chunks"),
    )?;
    let sizes_body = block(
        text,
        &format!("{identifier}_chunk_sizes[] = {{"),
        &format!("}}; // {identifier}_chunk_sizes"),
    )?;
    let num_chunks = parse_count(text, &format!("{identifier}_num_chunks = "))?;

    let literals = parse_literals(literals_body)?;
    let chunk_sizes = parse_sizes(sizes_body)?;

    if literals.len() != num_chunks || chunk_sizes.len() != num_chunks {
        return Err(Error::malformed_artifact(format!(
            "chunk count {} disagrees with {} literal(s) and {} size(s)",
            num_chunks,
            literals.len(),
            chunk_sizes.len()
        )));
    }

    let mut chunks = Vec::with_capacity(literals.len());
    for (i, (literal, &size)) in literals.iter().zip(&chunk_sizes).enumerate() {
        let bytes = unescape(literal)?;
        if bytes.len() != size {
            return Err(Error::malformed_artifact(format!(
                "chunk {} decodes to {} byte(s) but its size entry is {}",
                i,
                bytes.len(),
                size
            )));
        }
        chunks.push(bytes);
    }

    debug!(
        "Parsed {} chunk(s) for '{}' from definition text",
        chunks.len(),
        identifier
    );

    Ok(Reconstruction {
        chunks,
        chunk_sizes,
        num_chunks,
    })
}

/// Parses a definition artifact and returns the embedded bytes
pub fn reconstruct(text: &str, identifier: &str) -> Result<Vec<u8>> {
    parse_definition(text, identifier).map(Reconstruction::into_bytes)
}

/// Checks that `text` decodes to exactly `original`
pub fn verify(original: &[u8], text: &str, identifier: &str) -> Result<()> {
    let rebuilt = reconstruct(text, identifier)?;
    match first_difference(original, &rebuilt) {
        Some(offset) => Err(Error::RoundTripMismatch { offset }),
        None => Ok(()),
    }
}

/// Offset of the first differing byte, or of the shorter end
fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

fn block<'a>(text: &'a str, open: &str, close: &str) -> Result<&'a str> {
    let start = text
        .find(open)
        .ok_or_else(|| Error::malformed_artifact(format!("missing '{open}'")))?
        + open.len();
    let len = text[start..]
        .find(close)
        .ok_or_else(|| Error::malformed_artifact(format!("missing '{close}'")))?;
    Ok(&text[start..start + len])
}

fn parse_count(text: &str, prefix: &str) -> Result<usize> {
    let start = text
        .find(prefix)
        .ok_or_else(|| Error::malformed_artifact(format!("missing '{prefix}'")))?
        + prefix.len();
    let rest = &text[start..];
    let end = rest
        .find(';')
        .ok_or_else(|| Error::malformed_artifact("unterminated chunk count"))?;
    parse_usize(&rest[..end])
}

fn parse_usize(raw: &str) -> Result<usize> {
    let raw = raw.trim();
    raw.parse()
        .map_err(|_| Error::malformed_artifact(format!("'{raw}' is not a size")))
}

fn parse_sizes(body: &str) -> Result<Vec<usize>> {
    body.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_usize)
        .collect()
}

/// Splits an array body into entries, joining adjacent string literals
fn parse_literals(body: &str) -> Result<Vec<String>> {
    let mut entries = Vec::new();
    let mut current: Option<String> = None;
    let mut chars = body.char_indices();

    while let Some((offset, c)) = chars.next() {
        match c {
            '"' => {
                let entry = current.get_or_insert_with(String::new);
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => {
                            entry.push('\\');
                            if let Some((_, escaped)) = chars.next() {
                                entry.push(escaped);
                            }
                        }
                        Some((_, other)) => entry.push(other),
                        None => {
                            return Err(Error::malformed_artifact(format!(
                                "unterminated string literal at offset {offset}"
                            )))
                        }
                    }
                }
            }
            ',' => match current.take() {
                Some(entry) => entries.push(entry),
                None => {
                    return Err(Error::malformed_artifact(format!(
                        "empty array entry at offset {offset}"
                    )))
                }
            },
            c if c.is_whitespace() => {}
            other => {
                return Err(Error::malformed_artifact(format!(
                    "unexpected '{other}' in chunk array at offset {offset}"
                )))
            }
        }
    }

    entries.extend(current);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkPlanner;
    use crate::config::EmbedSpec;
    use crate::emit::{generate, render};

    #[test]
    fn test_reconstruct_generated() {
        let data: Vec<u8> = (0..=255).cycle().take(1000).collect();
        let spec = EmbedSpec::new("blob").namespace("ns").max_chunk_bytes(100);
        let artifacts = generate(&spec, data.as_slice()).unwrap();

        let parsed = parse_definition(&artifacts.definition, "blob").unwrap();
        assert_eq!(parsed.num_chunks, 11);
        assert_eq!(parsed.chunk_sizes, artifacts.chunk_sizes);
        assert_eq!(parsed.byte_count(), 1000);
        assert_eq!(parsed.into_bytes(), data);
    }

    #[test]
    fn test_reconstruct_empty() {
        let spec = EmbedSpec::new("nothing");
        let artifacts = generate(&spec, &b""[..]).unwrap();
        let parsed = parse_definition(&artifacts.definition, "nothing").unwrap();

        assert_eq!(parsed.num_chunks, 0);
        assert!(parsed.chunks.is_empty());
        assert!(parsed.chunk_sizes.is_empty());
    }

    #[test]
    fn test_special_bytes() {
        let data = [0x00, 0x22, 0x5C, 0x0A];
        let spec = EmbedSpec::new("special").max_chunk_bytes(10);
        let artifacts = generate(&spec, &data[..]).unwrap();

        assert_eq!(artifacts.chunk_sizes, vec![4]);
        assert_eq!(reconstruct(&artifacts.definition, "special").unwrap(), data);
    }

    #[test]
    fn test_verify() {
        let spec = EmbedSpec::new("v").max_chunk_bytes(4);
        let chunks: Vec<_> = ChunkPlanner::new(&b"abcdefg"[..], 4)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let artifacts = render(&spec, &chunks).unwrap();

        assert!(verify(b"abcdefg", &artifacts.definition, "v").is_ok());
        assert!(matches!(
            verify(b"abcXefg", &artifacts.definition, "v"),
            Err(Error::RoundTripMismatch { offset: 3 })
        ));
        assert!(matches!(
            verify(b"abcdefgh", &artifacts.definition, "v"),
            Err(Error::RoundTripMismatch { offset: 7 })
        ));
    }

    #[test]
    fn test_count_mismatch() {
        let text = "\
const char* x_chunks[] = {
    \"\\101\",

}; // x_chunks

std::size_t x_num_chunks = 2;

std::size_t x_chunk_sizes[] = {
    1,
}; // x_chunk_sizes
";
        assert!(matches!(
            parse_definition(text, "x"),
            Err(Error::MalformedArtifact { .. })
        ));
    }

    #[test]
    fn test_size_mismatch() {
        let text = "\
const char* x_chunks[] = {
    \"\\101\\102\",

}; // x_chunks

std::size_t x_num_chunks = 1;

std::size_t x_chunk_sizes[] = {
    3,
}; // x_chunk_sizes
";
        let err = parse_definition(text, "x").unwrap_err();
        assert!(err.to_string().contains("decodes to 2 byte(s)"));
    }

    #[test]
    fn test_missing_symbol() {
        let err = parse_definition("int main() {}", "x").unwrap_err();
        assert!(matches!(err, Error::MalformedArtifact { .. }));
    }

    #[test]
    fn test_parse_literals_joins_adjacent() {
        let entries = parse_literals("\n    \"\\101\"\n    \"\\102\",\n\n    \"\\103\",\n").unwrap();
        assert_eq!(entries, vec!["\\101\\102".to_string(), "\\103".to_string()]);

        assert!(parse_literals("\"\\101\" ;").is_err());
        assert!(parse_literals("\"\\101").is_err());
        assert!(parse_literals(",").is_err());
    }

    #[test]
    fn test_first_difference() {
        assert_eq!(first_difference(b"abc", b"abc"), None);
        assert_eq!(first_difference(b"abc", b"abd"), Some(2));
        assert_eq!(first_difference(b"ab", b"abc"), Some(2));
        assert_eq!(first_difference(b"", b""), None);
    }
}
