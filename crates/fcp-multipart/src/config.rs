//! Codec configuration.

use serde::{Deserialize, Serialize};

use crate::boundary::{Boundary, BoundaryGenerator, RandomBoundary};
use crate::charset::Charset;
use crate::error::{EncodeError, EncodeResult};
use crate::{DEFAULT_CHUNK_SIZE, DEFAULT_ENCODING};

/// Encoder and decoder configuration.
///
/// Every field has a default, so partial documents deserialize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultipartConfig {
    /// Charset label for text values, names, filenames and decoded text.
    ///
    /// Default: `utf-8`
    pub encoding: String,

    /// Explicit boundary token. A fresh random token is used when unset.
    ///
    /// Default: none
    pub boundary: Option<String>,

    /// Read size used when draining an encoder.
    ///
    /// Default: 8192
    pub chunk_size: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            encoding: DEFAULT_ENCODING.to_string(),
            boundary: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl MultipartConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the charset label.
    #[must_use]
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }

    /// Use a fixed boundary token.
    #[must_use]
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Set the drain read size.
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Resolve the charset label.
    #[must_use]
    pub fn charset(&self) -> Option<Charset> {
        Charset::for_label(&self.encoding)
    }

    /// Resolve the charset label for encoding.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::UnknownEncoding` for unrecognised labels.
    pub fn encode_charset(&self) -> EncodeResult<Charset> {
        self.charset().ok_or_else(|| EncodeError::UnknownEncoding {
            label: self.encoding.clone(),
        })
    }

    /// Produce the boundary for a new encoder.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::InvalidBoundary` if an explicit token is invalid.
    pub fn boundary(&self) -> EncodeResult<Boundary> {
        self.boundary_or(&RandomBoundary)
    }

    /// The explicit token if one is set, otherwise a token from `generator`.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::InvalidBoundary` if an explicit token is invalid.
    pub fn boundary_or(
        &self,
        generator: &(impl BoundaryGenerator + ?Sized),
    ) -> EncodeResult<Boundary> {
        match &self.boundary {
            Some(token) => Boundary::new(token.as_str()),
            None => Ok(generator.generate()),
        }
    }

    /// Drain read size, never zero.
    #[must_use]
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}
