//! Charset handling for names, text values and decoded parts.

use std::borrow::Cow;
use std::fmt;

use encoding_rs::Encoding;

/// A text encoding resolved from a WHATWG label.
///
/// Encoding follows `encoding_rs` rules: UTF-16 labels resolve to an encoding
/// whose *output* encoding is UTF-8, so [`encode`](Self::encode) never emits
/// UTF-16.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Charset(&'static Encoding);

impl Charset {
    /// UTF-8, the default.
    pub const UTF_8: Self = Self(encoding_rs::UTF_8);

    /// Resolve a label such as `"utf-8"`, `"latin1"` or `"shift_jis"`.
    #[must_use]
    pub fn for_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.trim().as_bytes()).map(Self)
    }

    /// Canonical name of the encoding.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.0.name()
    }

    /// Encode text, borrowing when no conversion is needed.
    #[must_use]
    pub fn encode(self, text: &str) -> Cow<'_, [u8]> {
        let (bytes, _, _) = self.0.encode(text);
        bytes
    }

    /// Decode bytes strictly. Returns `None` on malformed input.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        self.0
            .decode_without_bom_handling_and_without_replacement(bytes)
    }

    /// Decode bytes, replacing malformed sequences with U+FFFD.
    #[must_use]
    pub fn decode_lossy(self, bytes: &[u8]) -> Cow<'_, str> {
        let (text, _) = self.0.decode_without_bom_handling(bytes);
        text
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::UTF_8
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Charset").field(&self.name()).finish()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
