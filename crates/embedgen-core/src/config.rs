//! Generation settings and their validation.
//!
//! [`EmbedSpec`] names the generated symbols, optionally wraps them in a
//! namespace and bounds the size of each chunk literal.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Default upper bound for a chunk literal, in bytes
pub const DEFAULT_MAX_CHUNK_BYTES: usize = 4096;

/// Smallest bound that still leaves room for one payload byte
pub const MIN_MAX_CHUNK_BYTES: usize = 2;

/// Settings for one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedSpec {
    /// Base name for all generated symbols
    pub identifier: String,
    /// Optional namespace wrapping the generated symbols
    pub namespace: Option<String>,
    /// Upper bound for a chunk literal including its terminator
    pub max_chunk_bytes: usize,
    /// Path the definition artifact uses to include the declaration artifact
    pub header_include: Option<String>,
}

impl EmbedSpec {
    /// Creates settings for the given identifier with default values
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            namespace: None,
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
            header_include: None,
        }
    }

    /// Sets the namespace. An empty string means no namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.is_empty()).then_some(namespace);
        self
    }

    /// Sets the chunk size bound
    pub fn max_chunk_bytes(mut self, bytes: usize) -> Self {
        self.max_chunk_bytes = bytes;
        self
    }

    /// Sets the include path written into the definition artifact
    pub fn header_include(mut self, include: impl Into<String>) -> Self {
        self.header_include = Some(include.into());
        self
    }

    /// Number of raw bytes a single chunk may carry.
    ///
    /// One byte of every chunk literal is taken by the implicit NUL
    /// terminator of a C++ string literal, so the stored object never
    /// exceeds `max_chunk_bytes`.
    pub fn payload_limit(&self) -> usize {
        self.max_chunk_bytes.saturating_sub(1)
    }

    /// Namespace, if one is set and non-empty
    pub fn namespace_name(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    /// Include path for the declaration artifact, `{identifier}.hpp` by default
    pub fn include_path(&self) -> String {
        match &self.header_include {
            Some(include) => include.clone(),
            None => format!("{}.hpp", self.identifier),
        }
    }

    /// Checks identifier, namespace and chunk size
    pub fn validate(&self) -> Result<()> {
        if !is_valid_identifier(&self.identifier) {
            return Err(Error::InvalidIdentifier {
                value: self.identifier.clone(),
            });
        }
        if let Some(ns) = self.namespace_name() {
            if !is_valid_identifier(ns) {
                return Err(Error::InvalidNamespace {
                    value: ns.to_string(),
                });
            }
        }
        if self.max_chunk_bytes < MIN_MAX_CHUNK_BYTES {
            return Err(Error::InvalidChunkSize {
                value: self.max_chunk_bytes,
            });
        }
        Ok(())
    }
}

/// Returns true if `s` matches `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Resolves a header path against its include directory.
///
/// The header must be relative and may not climb out of `include_dir`.
/// Returns the on-disk location and the `/`-separated form used in the
/// `#include` directive.
pub fn resolve_header_path(include_dir: &Path, header: &Path) -> Result<(PathBuf, String)> {
    if header.is_absolute() || header.has_root() {
        return Err(Error::AbsoluteHeaderPath {
            path: header.to_path_buf(),
        });
    }

    let mut parts: Vec<String> = Vec::new();
    for component in header.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(Error::path_traversal(header));
                }
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(Error::AbsoluteHeaderPath {
                    path: header.to_path_buf(),
                });
            }
        }
    }

    if parts.is_empty() {
        return Err(Error::path_traversal(header));
    }

    let on_disk = parts
        .iter()
        .fold(include_dir.to_path_buf(), |acc, part| acc.join(part));
    Ok((on_disk, parts.join("/")))
}
