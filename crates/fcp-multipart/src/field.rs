//! Field definitions and normalization.
//!
//! Callers describe a form either with the loosely-shaped [`FormValue`]
//! (plain values and 2-to-4 element file tuples, checked by [`normalize`]) or
//! directly with the typed [`Field`] / [`FileField`] constructors.

use std::fmt;
use std::io::Cursor;

use bytes::Bytes;

use crate::charset::Charset;
use crate::error::{EncodeError, EncodeResult};
use crate::headers::Headers;
use crate::source::FieldSource;

/// Owned, type-erased field source.
pub type BoxedSource<'a> = Box<dyn FieldSource + Send + 'a>;

/// One element of a file tuple.
pub enum TupleItem<'a> {
    /// Placeholder for an omitted optional element.
    Null,
    /// Text (filename, content or content type depending on position).
    Text(String),
    /// Raw bytes content.
    Bytes(Bytes),
    /// Streaming content.
    Source(BoxedSource<'a>),
    /// Extra part headers.
    Headers(Headers),
}

impl TupleItem<'_> {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Source(_) => "source",
            Self::Headers(_) => "headers",
        }
    }
}

impl fmt::Debug for TupleItem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Self::Source(source) => f
                .debug_struct("Source")
                .field("static_len", &source.static_len())
                .finish_non_exhaustive(),
            Self::Headers(headers) => f.debug_tuple("Headers").field(headers).finish(),
        }
    }
}

impl From<&str> for TupleItem<'_> {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TupleItem<'_> {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for TupleItem<'_> {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value.into())
    }
}

impl From<&'static [u8]> for TupleItem<'_> {
    fn from(value: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(value))
    }
}

impl From<Bytes> for TupleItem<'_> {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Headers> for TupleItem<'_> {
    fn from(value: Headers) -> Self {
        Self::Headers(value)
    }
}

/// A field value as supplied by the caller.
#[derive(Debug)]
pub enum FormValue<'a> {
    /// Plain text field.
    Text(String),
    /// Plain bytes field.
    Bytes(Bytes),
    /// File field: `(filename, content[, content_type[, headers]])`.
    Tuple(Vec<TupleItem<'a>>),
}

impl<'a> FormValue<'a> {
    /// Plain text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Plain bytes value.
    #[must_use]
    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self::Bytes(value.into())
    }

    /// File tuple with in-memory content.
    #[must_use]
    pub fn file(filename: impl Into<String>, content: impl Into<TupleItem<'a>>) -> Self {
        Self::Tuple(vec![TupleItem::Text(filename.into()), content.into()])
    }

    /// File tuple streaming from `source`.
    #[must_use]
    pub fn source(filename: impl Into<String>, source: impl FieldSource + Send + 'a) -> Self {
        Self::Tuple(vec![
            TupleItem::Text(filename.into()),
            TupleItem::Source(Box::new(source)),
        ])
    }

    /// Set the third tuple element. No effect on plain values.
    #[must_use]
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_slot(2, TupleItem::Text(content_type.into()))
    }

    /// Set the fourth tuple element. No effect on plain values.
    #[must_use]
    pub fn with_headers(self, headers: Headers) -> Self {
        self.with_slot(3, TupleItem::Headers(headers))
    }

    fn with_slot(self, index: usize, item: TupleItem<'a>) -> Self {
        match self {
            Self::Tuple(mut items) => {
                if index < items.len() {
                    items[index] = item;
                } else {
                    while items.len() < index {
                        items.push(TupleItem::Null);
                    }
                    items.push(item);
                }
                Self::Tuple(items)
            }
            plain => plain,
        }
    }
}

impl From<&str> for FormValue<'_> {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FormValue<'_> {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for FormValue<'_> {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value.into())
    }
}

impl From<Bytes> for FormValue<'_> {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

/// A file field descriptor.
pub struct FileField<'a> {
    pub(crate) filename: String,
    pub(crate) content_type: Option<String>,
    pub(crate) headers: Headers,
    pub(crate) source: BoxedSource<'a>,
}

impl<'a> FileField<'a> {
    /// File content read from `source`.
    #[must_use]
    pub fn new(filename: impl Into<String>, source: impl FieldSource + Send + 'a) -> Self {
        Self::from_boxed(filename.into(), Box::new(source))
    }

    /// File content held in memory.
    #[must_use]
    pub fn from_bytes(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self::from_boxed(filename.into(), Box::new(Cursor::new(content.into())))
    }

    fn from_boxed(filename: String, source: BoxedSource<'a>) -> Self {
        Self {
            filename,
            content_type: None,
            headers: Headers::new(),
            source,
        }
    }

    /// Set the part `Content-Type`.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add one extra part header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Merge extra part headers.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers.extend(headers.iter());
        self
    }

    /// The filename.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The content type, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Extra headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }
}

impl fmt::Debug for FileField<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileField")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("headers", &self.headers)
            .field("static_len", &self.source.static_len())
            .finish_non_exhaustive()
    }
}

/// Field content: a literal or a file.
#[derive(Debug)]
pub enum FieldBody<'a> {
    /// Text literal, encoded with the encoder's charset.
    Text(String),
    /// Bytes literal, sent as-is.
    Bytes(Bytes),
    /// File with filename and optional content type and headers.
    File(FileField<'a>),
}

/// A normalized, named field.
#[derive(Debug)]
pub struct Field<'a> {
    pub(crate) name: String,
    pub(crate) body: FieldBody<'a>,
}

impl<'a> Field<'a> {
    /// Plain text field.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: FieldBody::Text(value.into()),
        }
    }

    /// Plain bytes field.
    #[must_use]
    pub fn bytes(name: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            body: FieldBody::Bytes(value.into()),
        }
    }

    /// File field.
    #[must_use]
    pub fn file(name: impl Into<String>, file: FileField<'a>) -> Self {
        Self {
            name: name.into(),
            body: FieldBody::File(file),
        }
    }

    /// The field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field body.
    #[must_use]
    pub const fn body(&self) -> &FieldBody<'a> {
        &self.body
    }

    /// Whether this field carries a filename.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.body, FieldBody::File(_))
    }
}

/// Normalize caller-supplied fields into typed descriptors.
///
/// Order is preserved. Text content inside file tuples is encoded with
/// `charset`; plain text values stay text until the encoder frames them.
///
/// # Errors
///
/// Returns `EncodeError::MalformedField` when a tuple does not have 2 to 4
/// elements or an element has the wrong type for its position.
pub fn normalize<'a, I, N>(fields: I, charset: Charset) -> EncodeResult<Vec<Field<'a>>>
where
    I: IntoIterator<Item = (N, FormValue<'a>)>,
    N: Into<String>,
{
    fields
        .into_iter()
        .map(|(name, value)| normalize_one(name.into(), value, charset))
        .collect()
}

fn normalize_one(name: String, value: FormValue<'_>, charset: Charset) -> EncodeResult<Field<'_>> {
    match value {
        FormValue::Text(text) => Ok(Field::text(name, text)),
        FormValue::Bytes(bytes) => Ok(Field::bytes(name, bytes)),
        FormValue::Tuple(items) => normalize_tuple(name, items, charset),
    }
}

fn normalize_tuple(
    name: String,
    items: Vec<TupleItem<'_>>,
    charset: Charset,
) -> EncodeResult<Field<'_>> {
    if !(2..=4).contains(&items.len()) {
        let reason = format!("expected 2 to 4 tuple elements, got {}", items.len());
        return Err(malformed(name, reason));
    }

    let mut items = items.into_iter();

    let filename = match items.next() {
        Some(TupleItem::Text(filename)) => filename,
        other => return Err(unexpected(name, "filename", other.as_ref())),
    };

    let source: BoxedSource<'_> = match items.next() {
        Some(TupleItem::Text(text)) => {
            let bytes = Bytes::from(charset.encode(&text).into_owned());
            Box::new(Cursor::new(bytes))
        }
        Some(TupleItem::Bytes(bytes)) => Box::new(Cursor::new(bytes)),
        Some(TupleItem::Source(source)) => source,
        other => return Err(unexpected(name, "content", other.as_ref())),
    };

    let content_type = match items.next() {
        None | Some(TupleItem::Null) => None,
        Some(TupleItem::Text(content_type)) => Some(content_type),
        other => return Err(unexpected(name, "content type", other.as_ref())),
    };

    let headers = match items.next() {
        None | Some(TupleItem::Null) => Headers::new(),
        Some(TupleItem::Headers(headers)) => headers,
        other => return Err(unexpected(name, "headers", other.as_ref())),
    };

    Ok(Field::file(
        name,
        FileField {
            filename,
            content_type,
            headers,
            source,
        },
    ))
}

fn malformed(name: String, reason: String) -> EncodeError {
    EncodeError::MalformedField { name, reason }
}

fn unexpected(name: String, position: &str, item: Option<&TupleItem<'_>>) -> EncodeError {
    let found = item.map_or("nothing", TupleItem::kind);
    malformed(name, format!("unsupported {position} element: {found}"))
}
