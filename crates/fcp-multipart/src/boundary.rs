//! Boundary tokens.

use std::fmt;

use uuid::Uuid;

use crate::error::{EncodeError, EncodeResult};
use crate::MAX_BOUNDARY_LEN;

/// A validated multipart boundary token.
///
/// Tokens use the RFC 2046 `bchars` alphabet: ASCII letters and digits plus
/// `'()+_,-./:=?` and space, 1 to 70 characters, not ending in a space.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Boundary(String);

impl Boundary {
    /// Generate a fresh high-entropy token (32 lowercase hex characters).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Validate an explicit token.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::InvalidBoundary` if the token is empty, longer
    /// than 70 characters, uses characters outside `bchars`, or ends with a
    /// space.
    pub fn new(token: impl Into<String>) -> EncodeResult<Self> {
        let token = token.into();
        let reason = if token.is_empty() {
            Some("must not be empty")
        } else if token.len() > MAX_BOUNDARY_LEN {
            Some("must be at most 70 characters")
        } else if !token.bytes().all(is_bchar) {
            Some("contains characters outside the boundary alphabet")
        } else if token.ends_with(' ') {
            Some("must not end with a space")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(EncodeError::InvalidBoundary {
                boundary: token,
                reason,
            }),
            None => Ok(Self(token)),
        }
    }

    /// The token itself.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `--<token>\r\n`, the line opening every part.
    #[must_use]
    pub fn delimiter_line(&self) -> String {
        format!("--{}\r\n", self.0)
    }

    /// `--<token>--\r\n`, the line closing the body.
    #[must_use]
    pub fn closing_line(&self) -> String {
        format!("--{}--\r\n", self.0)
    }
}

const fn is_bchar(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'\'' | b'(' | b')' | b'+' | b'_' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?' | b' '
        )
}

impl fmt::Debug for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Boundary").field(&self.0).finish()
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Boundary {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of boundary tokens for new encoders.
pub trait BoundaryGenerator {
    /// Produce the boundary for one encoder.
    fn generate(&self) -> Boundary;
}

/// Random v4-UUID tokens. The default.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomBoundary;

impl BoundaryGenerator for RandomBoundary {
    fn generate(&self) -> Boundary {
        Boundary::generate()
    }
}

/// Always yields the same token. For reproducible output.
#[derive(Clone, Debug)]
pub struct FixedBoundary(Boundary);

impl FixedBoundary {
    /// Wrap an already validated boundary.
    #[must_use]
    pub const fn new(boundary: Boundary) -> Self {
        Self(boundary)
    }
}

impl BoundaryGenerator for FixedBoundary {
    fn generate(&self) -> Boundary {
        self.0.clone()
    }
}
