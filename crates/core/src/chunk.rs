//! Document chunks - bounded segments of source text, the unit of provenance

use crate::{CoreError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Default number of words per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Chunks whose trimmed text is this short or shorter are dropped
pub const MIN_CHUNK_CHARS: usize = 50;

/// Default upper bound for a single document
pub const DEFAULT_MAX_DOCUMENT_MB: f64 = 100.0;

/// A segment of a source document. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentChunk {
    /// Unique identifier
    pub id: String,

    /// The chunk text
    pub text: String,

    /// Origin file or URL
    pub source: String,

    /// Position of this chunk within its source
    pub chunk_index: u32,
}

impl DocumentChunk {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        source: impl Into<String>,
        chunk_index: u32,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source: source.into(),
            chunk_index,
        }
    }

    /// Reject chunks that cannot be stored
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(CoreError::Validation("chunk id must not be empty".into()));
        }
        if self.text.trim().is_empty() {
            return Err(CoreError::Validation(format!("chunk {} has no text", self.id)));
        }
        Ok(())
    }
}

/// Splits raw text into fixed-size word windows
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    id_prefix: String,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl TextChunker {
    /// Create a chunker producing windows of `chunk_size` words
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            id_prefix: "chunk".to_string(),
        }
    }

    /// Builder: set the prefix used for chunk ids (`<prefix>_<index>`)
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split `text` into chunks attributed to `source`.
    ///
    /// Windows of `MIN_CHUNK_CHARS` characters or fewer are skipped; indices
    /// are assigned over the kept chunks only.
    pub fn chunk(&self, text: &str, source: &str) -> Vec<DocumentChunk> {
        let words: Vec<&str> = text.split_whitespace().collect();

        words
            .chunks(self.chunk_size)
            .map(|window| window.join(" "))
            .filter(|chunk| chunk.trim().chars().count() > MIN_CHUNK_CHARS)
            .enumerate()
            .map(|(i, chunk)| {
                DocumentChunk::new(format!("{}_{}", self.id_prefix, i), chunk, source, i as u32)
            })
            .collect()
    }

    /// Reject documents larger than `max_mb` megabytes (UTF-8 encoded)
    pub fn validate_size(text: &str, max_mb: f64) -> Result<()> {
        let size_mb = text.len() as f64 / (1024.0 * 1024.0);
        if size_mb > max_mb {
            return Err(CoreError::DocumentTooLarge { size_mb, max_mb });
        }
        Ok(())
    }
}

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

static DISALLOWED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^\w\s.,!?;:()\-'"]"#).expect("disallowed symbol regex"));

/// Normalise scraped text: collapse whitespace, blank out unusual symbols
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE_REGEX.replace_all(text, " ");
    let cleaned = DISALLOWED_REGEX.replace_all(&collapsed, " ");
    cleaned.trim().to_string()
}
