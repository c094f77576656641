//! Decoded part view.

use std::borrow::Cow;

use bytes::Bytes;

use crate::charset::Charset;
use crate::error::{DecodeError, DecodeResult};
use crate::framing::{find, split_once, CRLF, DOUBLE_CRLF, HEADER_SEPARATOR};
use crate::headers::Headers;

/// One part of a decoded multipart payload.
///
/// Equality compares raw content only; headers and charset are ignored.
#[derive(Clone, Debug)]
pub struct BodyPart {
    headers: Headers,
    content: Bytes,
    charset: Charset,
}

impl BodyPart {
    /// Parse one fragment (the bytes between two delimiter lines, without the
    /// trailing CRLF).
    pub(crate) fn parse(fragment: Bytes, charset: Charset) -> DecodeResult<Self> {
        if let Some(split) = find(&fragment, DOUBLE_CRLF) {
            let headers = parse_headers(&fragment[..split], charset);
            let content = fragment.slice(split + DOUBLE_CRLF.len()..);
            return Ok(Self::new(headers, content, charset));
        }

        if fragment.starts_with(CRLF) {
            let content = fragment.slice(CRLF.len()..);
            return Ok(Self::new(Headers::new(), content, charset));
        }

        Err(DecodeError::ImproperBodyPartContent)
    }

    /// Build a part directly.
    #[must_use]
    pub fn new(headers: Headers, content: impl Into<Bytes>, charset: Charset) -> Self {
        Self {
            headers,
            content: content.into(),
            charset,
        }
    }

    /// Part headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Look up one header, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Raw content.
    #[must_use]
    pub const fn content(&self) -> &Bytes {
        &self.content
    }

    /// Content decoded with the decoder's charset.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::UndecodableText` if the content is malformed in
    /// that charset.
    pub fn text(&self) -> DecodeResult<Cow<'_, str>> {
        self.charset
            .decode(&self.content)
            .ok_or_else(|| DecodeError::UndecodableText {
                encoding: self.charset.name(),
            })
    }

    /// Content decoded with replacement characters for malformed input.
    #[must_use]
    pub fn text_lossy(&self) -> Cow<'_, str> {
        self.charset.decode_lossy(&self.content)
    }

    /// The charset used by [`text`](Self::text).
    #[must_use]
    pub const fn encoding(&self) -> Charset {
        self.charset
    }

    /// Content length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the content is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Split a header block into `Name: Value` pairs.
///
/// A bare LF also ends a line. Lines without `": "` are skipped.
fn parse_headers(block: &[u8], charset: Charset) -> Headers {
    block
        .split(|&byte| byte == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.is_empty())
        .filter_map(|line| split_once(line, HEADER_SEPARATOR))
        .map(|(name, value)| {
            (
                charset.decode_lossy(name).into_owned(),
                charset.decode_lossy(value).into_owned(),
            )
        })
        .collect()
}

impl PartialEq for BodyPart {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

impl Eq for BodyPart {}

impl PartialEq<[u8]> for BodyPart {
    fn eq(&self, other: &[u8]) -> bool {
        self.content == other
    }
}

impl PartialEq<&[u8]> for BodyPart {
    fn eq(&self, other: &&[u8]) -> bool {
        self.content == *other
    }
}

impl PartialEq<Vec<u8>> for BodyPart {
    fn eq(&self, other: &Vec<u8>) -> bool {
        self.content == other.as_slice()
    }
}

impl PartialEq<Bytes> for BodyPart {
    fn eq(&self, other: &Bytes) -> bool {
        self.content == *other
    }
}

impl<const N: usize> PartialEq<[u8; N]> for BodyPart {
    fn eq(&self, other: &[u8; N]) -> bool {
        self.content == other.as_slice()
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for BodyPart {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.content == other.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(raw: &'static [u8]) -> DecodeResult<BodyPart> {
        BodyPart::parse(Bytes::from_static(raw), Charset::UTF_8)
    }

    #[test]
    fn headers_and_content() {
        let part = part(b"Content-Disposition: form-data; name=\"a\"\r\nContent-Type: text/plain\r\n\r\nhello").unwrap();
        assert_eq!(part.header("content-type"), Some("text/plain"));
        assert_eq!(
            part.header("CONTENT-DISPOSITION"),
            Some("form-data; name=\"a\"")
        );
        assert_eq!(part, b"hello");
        assert_eq!(part.text().unwrap(), "hello");
        assert_eq!(part.len(), 5);
    }

    #[test]
    fn leading_crlf_means_no_headers() {
        let part = part(b"\r\nbare content").unwrap();
        assert!(part.headers().is_empty());
        assert_eq!(part, b"bare content");
    }

    #[test]
    fn content_may_contain_blank_lines() {
        let part = part(b"X-A: 1\r\n\r\nline\r\n\r\nmore").unwrap();
        assert_eq!(part.headers().len(), 1);
        assert_eq!(part, b"line\r\n\r\nmore");
    }

    #[test]
    fn empty_content_is_allowed() {
        let part = part(b"X-A: 1\r\n\r\n").unwrap();
        assert!(part.is_empty());
        assert_eq!(part.text().unwrap(), "");
    }

    #[test]
    fn improper_fragment_is_rejected() {
        assert_eq!(
            part(b"no separator here").unwrap_err(),
            DecodeError::ImproperBodyPartContent
        );
        assert_eq!(
            part(b"X-A: 1\r\nbody").unwrap_err(),
            DecodeError::ImproperBodyPartContent
        );
    }

    #[test]
    fn header_lines_without_separator_are_skipped() {
        let part = part(b"garbage\r\nX-Ok: yes\r\nAlso:bad\r\n\r\nc").unwrap();
        assert_eq!(part.headers().len(), 1);
        assert_eq!(part.header("x-ok"), Some("yes"));
    }

    #[test]
    fn header_value_keeps_later_separators() {
        let part = part(b"X-Time: 12: 30\r\n\r\n").unwrap();
        assert_eq!(part.header("x-time"), Some("12: 30"));
    }

    #[test]
    fn strict_and_lossy_text() {
        let part = part(b"\r\nok\xFF").unwrap();
        assert_eq!(
            part.text().unwrap_err(),
            DecodeError::UndecodableText { encoding: "UTF-8" }
        );
        assert_eq!(part.text_lossy(), "ok\u{FFFD}");
    }

    #[test]
    fn text_uses_part_charset() {
        let latin1 = Charset::for_label("latin1").unwrap();
        let part = BodyPart::parse(Bytes::from_static(b"\r\ncaf\xE9"), latin1).unwrap();
        assert_eq!(part.encoding(), latin1);
        assert_eq!(part.text().unwrap(), "caf\u{e9}");
    }

    #[test]
    fn equality_ignores_headers() {
        let with_headers = part(b"X-A: 1\r\n\r\nsame").unwrap();
        let without = part(b"\r\nsame").unwrap();
        assert_eq!(with_headers, without);
        assert_ne!(with_headers, part(b"\r\nother").unwrap());

        assert!(with_headers == *b"same".as_slice());
        assert!(with_headers == b"same".as_slice());
        assert!(with_headers == b"same".to_vec());
        assert!(with_headers == Bytes::from_static(b"same"));
        assert!(with_headers == *b"same");
    }
}
