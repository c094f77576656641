//! Byte-level framing shared by the encoder and decoder.

use bytes::Bytes;

pub const CRLF: &[u8] = b"\r\n";
pub const DOUBLE_CRLF: &[u8] = b"\r\n\r\n";
pub const HEADER_SEPARATOR: &[u8] = b": ";

/// Position of the first occurrence of `needle` in `haystack`.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Split on the first occurrence of `needle`, dropping the needle.
pub fn split_once<'a>(haystack: &'a [u8], needle: &[u8]) -> Option<(&'a [u8], &'a [u8])> {
    find(haystack, needle).map(|pos| (&haystack[..pos], &haystack[pos + needle.len()..]))
}

/// Split `content` on every occurrence of `separator`.
///
/// Fragments share the input buffer.
pub fn split_all(content: &Bytes, separator: &[u8]) -> Vec<Bytes> {
    let mut fragments = Vec::new();
    let mut start = 0;
    while let Some(pos) = find(&content[start..], separator) {
        fragments.push(content.slice(start..start + pos));
        start += pos + separator.len();
    }
    fragments.push(content.slice(start..));
    fragments
}

/// Quote a `Content-Disposition` parameter value.
///
/// Uses the HTML form-submission escaping: `"` becomes `%22`, CR `%0D`,
/// LF `%0A`. Everything else passes through.
pub fn quote_param(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("%22"),
            '\r' => quoted.push_str("%0D"),
            '\n' => quoted.push_str("%0A"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
