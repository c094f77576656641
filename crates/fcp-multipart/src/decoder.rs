//! Buffered `multipart/*` decoder.

use bytes::Bytes;

use crate::body_part::BodyPart;
use crate::charset::Charset;
use crate::config::MultipartConfig;
use crate::error::{DecodeError, DecodeResult};
use crate::framing::{find, split_all, CRLF};

/// A completed response: full body plus header lookup.
///
/// Implement this for the HTTP client's response type to use
/// [`MultipartDecoder::from_response`].
pub trait ResponseLike {
    /// The complete response body.
    fn body(&self) -> &[u8];

    /// Case-insensitive header lookup.
    fn header(&self, name: &str) -> Option<&str>;
}

/// Parses a fully-buffered multipart payload into ordered [`BodyPart`]s.
#[derive(Clone, Debug)]
pub struct MultipartDecoder {
    content: Bytes,
    content_type: String,
    charset: Charset,
    boundary: Bytes,
    parts: Vec<BodyPart>,
}

impl MultipartDecoder {
    /// Decode `content` as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns `NonMultipartContentType` or `MissingBoundary` for a bad
    /// content type, and `ImproperBodyPartContent` or `MissingLineTerminator`
    /// for a malformed body. No parts are returned on error.
    pub fn new(content: impl Into<Bytes>, content_type: &str) -> DecodeResult<Self> {
        Self::decode(content.into(), content_type, Charset::UTF_8)
    }

    /// Decode with an explicit charset label.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new), plus `UnknownEncoding` for an unknown label.
    pub fn with_encoding(
        content: impl Into<Bytes>,
        content_type: &str,
        label: &str,
    ) -> DecodeResult<Self> {
        Self::decode(content.into(), content_type, resolve(label)?)
    }

    /// Decode with the charset from `config`.
    ///
    /// # Errors
    ///
    /// As [`with_encoding`](Self::with_encoding).
    pub fn with_config(
        content: impl Into<Bytes>,
        content_type: &str,
        config: &MultipartConfig,
    ) -> DecodeResult<Self> {
        Self::with_encoding(content, content_type, &config.encoding)
    }

    /// Decode a response body using its `content-type` header.
    ///
    /// # Errors
    ///
    /// Returns `MissingContentType` when the header is absent, otherwise as
    /// [`new`](Self::new).
    pub fn from_response(response: &impl ResponseLike) -> DecodeResult<Self> {
        Self::from_response_with_encoding(response, crate::DEFAULT_ENCODING)
    }

    /// Decode a response body with an explicit charset label.
    ///
    /// # Errors
    ///
    /// As [`from_response`](Self::from_response) and
    /// [`with_encoding`](Self::with_encoding).
    pub fn from_response_with_encoding(
        response: &impl ResponseLike,
        label: &str,
    ) -> DecodeResult<Self> {
        let content_type = response
            .header("content-type")
            .ok_or(DecodeError::MissingContentType)?;
        let content = Bytes::copy_from_slice(response.body());
        Self::decode(content, content_type, resolve(label)?)
    }

    fn decode(content: Bytes, content_type: &str, charset: Charset) -> DecodeResult<Self> {
        let boundary = find_boundary(content_type, charset)?;
        let parts = parse_body(&content, &boundary, charset)?;

        tracing::debug!(
            boundary = %String::from_utf8_lossy(&boundary),
            parts = parts.len(),
            bytes = content.len(),
            "Decoded multipart body"
        );

        Ok(Self {
            content,
            content_type: content_type.to_string(),
            charset,
            boundary,
            parts,
        })
    }

    /// Decoded parts in wire order.
    #[must_use]
    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    /// Take ownership of the parts.
    #[must_use]
    pub fn into_parts(self) -> Vec<BodyPart> {
        self.parts
    }

    /// The raw input.
    #[must_use]
    pub const fn content(&self) -> &Bytes {
        &self.content
    }

    /// The boundary, encoded with the decoder's charset.
    #[must_use]
    pub fn boundary(&self) -> &[u8] {
        &self.boundary
    }

    /// The content type the decoder was built with.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The decoder's charset.
    #[must_use]
    pub const fn encoding(&self) -> Charset {
        self.charset
    }

    /// Number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the payload had no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Iterate the parts in order.
    pub fn iter(&self) -> std::slice::Iter<'_, BodyPart> {
        self.parts.iter()
    }
}

impl IntoIterator for MultipartDecoder {
    type Item = BodyPart;
    type IntoIter = std::vec::IntoIter<BodyPart>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.into_iter()
    }
}

impl<'a> IntoIterator for &'a MultipartDecoder {
    type Item = &'a BodyPart;
    type IntoIter = std::slice::Iter<'a, BodyPart>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}

fn resolve(label: &str) -> DecodeResult<Charset> {
    Charset::for_label(label).ok_or_else(|| DecodeError::UnknownEncoding {
        label: label.to_string(),
    })
}

/// Extract the boundary attribute from a `multipart/*` content type.
///
/// The last `boundary` attribute wins.
fn find_boundary(content_type: &str, charset: Charset) -> DecodeResult<Bytes> {
    let mut attributes = content_type.split(';').map(str::trim);
    let mimetype = attributes.next().unwrap_or_default();

    let top_level = mimetype.split('/').next().unwrap_or_default();
    if !top_level.eq_ignore_ascii_case("multipart") {
        return Err(DecodeError::NonMultipartContentType {
            mimetype: mimetype.to_string(),
        });
    }

    let boundary = attributes
        .filter_map(|attribute| attribute.split_once('='))
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"'))
        .last()
        .filter(|value| !value.is_empty())
        .ok_or(DecodeError::MissingBoundary)?;

    Ok(Bytes::from(charset.encode(boundary).into_owned()))
}

/// Split the body on delimiter lines and parse each fragment.
fn parse_body(content: &Bytes, boundary: &[u8], charset: Charset) -> DecodeResult<Vec<BodyPart>> {
    let dashes: &[u8] = b"--";
    let delimiter = [dashes, boundary, CRLF].concat();
    let closing = [dashes, boundary, dashes].concat();
    let terminated_closing = [CRLF, closing.as_slice()].concat();

    let mut parts = Vec::new();
    for (index, fragment) in split_all(content, &delimiter).into_iter().enumerate() {
        if fragment.is_empty() || fragment == CRLF || fragment.starts_with(&closing) {
            continue;
        }

        let fragment = if let Some(end) = find(&fragment, &terminated_closing) {
            fragment.slice(..end)
        } else if fragment.ends_with(CRLF) {
            fragment.slice(..fragment.len() - CRLF.len())
        } else {
            return Err(DecodeError::MissingLineTerminator { index });
        };

        parts.push(BodyPart::parse(fragment, charset)?);
    }
    Ok(parts)
}
