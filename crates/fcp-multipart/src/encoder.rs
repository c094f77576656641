//! Streaming `multipart/form-data` encoder.
//!
//! The encoder is a pull-based cursor over the framed output. Each part is
//! `--boundary\r\n`, its header block, a blank line, the content and a
//! trailing CRLF; the body ends with `--boundary--\r\n`. Part heads are
//! rendered once at construction, content is pulled from sources only as the
//! caller reads, so at most one read's worth of source bytes is in flight.

use std::fmt;
use std::io::{self, Read};

use bytes::{Bytes, BytesMut};

use crate::boundary::{Boundary, BoundaryGenerator, RandomBoundary};
use crate::charset::Charset;
use crate::config::MultipartConfig;
use crate::error::{EncodeError, EncodeResult};
use crate::field::{normalize, BoxedSource, Field, FieldBody, FormValue};
use crate::framing::{quote_param, CRLF, HEADER_SEPARATOR};
use crate::headers::Headers;

/// Cursor position within the framed output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    NotStarted,
    Head { index: usize, offset: usize },
    Body { index: usize, offset: u64 },
    Tail { index: usize, offset: usize },
    Closing { offset: usize },
    Finished,
    Aborted,
}

enum PartBody<'a> {
    Literal(Bytes),
    Source {
        source: BoxedSource<'a>,
        len: Option<u64>,
        /// Read offset at hand-over; `None` for sources that cannot seek back.
        start: Option<u64>,
    },
}

impl PartBody<'_> {
    fn len(&self) -> Option<u64> {
        match self {
            Self::Literal(bytes) => Some(bytes.len() as u64),
            Self::Source { len, .. } => *len,
        }
    }

    fn is_rewindable(&self) -> bool {
        match self {
            Self::Literal(_) => true,
            Self::Source { start, .. } => start.is_some(),
        }
    }

    fn rewind(&mut self) -> io::Result<()> {
        match self {
            Self::Literal(_) => Ok(()),
            Self::Source {
                source,
                start: Some(start),
                ..
            } => source.rewind_to(*start),
            Self::Source { .. } => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "source cannot be rewound",
            )),
        }
    }
}

struct Part<'a> {
    name: String,
    head: Bytes,
    body: PartBody<'a>,
}

/// Lazily serializes fields as `multipart/form-data`.
///
/// Not safe for concurrent reads; wrap in a mutex if shared. Rewindable
/// sources are seeked back to their hand-over offset once the closing
/// boundary is emitted or a read fails. Dropping the encoder releases every
/// source it owns; a borrowed source abandoned mid-stream is left where the
/// last read stopped.
pub struct MultipartEncoder<'a> {
    boundary: Boundary,
    content_type: String,
    parts: Vec<Part<'a>>,
    closing: Bytes,
    length: Option<u64>,
    chunk_size: usize,
    state: State,
}

impl<'a> MultipartEncoder<'a> {
    /// Build an encoder from caller-shaped fields.
    ///
    /// # Errors
    ///
    /// Returns `MalformedField` for bad field shapes or header values with
    /// line breaks, `InvalidBoundary` for an invalid configured boundary and
    /// `UnknownEncoding` for an unknown charset. No bytes are produced when
    /// construction fails.
    pub fn new<I, N>(fields: I, config: &MultipartConfig) -> EncodeResult<Self>
    where
        I: IntoIterator<Item = (N, FormValue<'a>)>,
        N: Into<String>,
    {
        Self::with_generator(fields, config, &RandomBoundary)
    }

    /// Like [`new`](Self::new), drawing the boundary from `generator` when the
    /// configuration has no explicit token.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_generator<I, N>(
        fields: I,
        config: &MultipartConfig,
        generator: &(impl BoundaryGenerator + ?Sized),
    ) -> EncodeResult<Self>
    where
        I: IntoIterator<Item = (N, FormValue<'a>)>,
        N: Into<String>,
    {
        let charset = config.encode_charset()?;
        let fields = normalize(fields, charset)?;
        Self::build(fields, config, charset, generator)
    }

    /// Build an encoder from typed fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBoundary` or `UnknownEncoding` for bad configuration,
    /// and `MalformedField` for header values with line breaks.
    pub fn from_fields(
        fields: impl IntoIterator<Item = Field<'a>>,
        config: &MultipartConfig,
    ) -> EncodeResult<Self> {
        Self::from_fields_with_generator(fields, config, &RandomBoundary)
    }

    /// Like [`from_fields`](Self::from_fields), drawing the boundary from
    /// `generator` when the configuration has no explicit token.
    ///
    /// # Errors
    ///
    /// Same as [`from_fields`](Self::from_fields).
    pub fn from_fields_with_generator(
        fields: impl IntoIterator<Item = Field<'a>>,
        config: &MultipartConfig,
        generator: &(impl BoundaryGenerator + ?Sized),
    ) -> EncodeResult<Self> {
        let charset = config.encode_charset()?;
        Self::build(fields.into_iter().collect(), config, charset, generator)
    }

    fn build(
        fields: Vec<Field<'a>>,
        config: &MultipartConfig,
        charset: Charset,
        generator: &(impl BoundaryGenerator + ?Sized),
    ) -> EncodeResult<Self> {
        let boundary = config.boundary_or(generator)?;
        let delimiter = boundary.delimiter_line();

        let parts = fields
            .into_iter()
            .map(|field| render_part(&delimiter, field, charset))
            .collect::<EncodeResult<Vec<Part<'a>>>>()?;
        let closing = Bytes::from(boundary.closing_line());

        let length = parts
            .iter()
            .try_fold(closing.len() as u64, |total, part| {
                total
                    .checked_add(part.head.len() as u64)?
                    .checked_add(part.body.len()?)?
                    .checked_add(CRLF.len() as u64)
            });

        tracing::debug!(
            boundary = %boundary,
            fields = parts.len(),
            length = ?length,
            encoding = charset.name(),
            "Created multipart encoder"
        );

        Ok(Self {
            content_type: content_type_for(&boundary),
            boundary,
            parts,
            closing,
            length,
            chunk_size: config.effective_chunk_size(),
            state: State::NotStarted,
        })
    }

    /// The boundary token.
    #[must_use]
    pub const fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// `multipart/form-data; boundary=<token>`.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Total encoded size, or `None` when some source cannot report its size.
    ///
    /// `None` means the body should be sent with chunked transfer encoding
    /// rather than a fixed `Content-Length`.
    #[must_use]
    pub const fn length(&self) -> Option<u64> {
        self.length
    }

    /// Number of fields.
    #[must_use]
    pub fn fields_len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the closing boundary has been emitted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Read up to `max_bytes` of framed output.
    ///
    /// Crosses part boundaries transparently. Returns an empty buffer once the
    /// closing boundary has been emitted (and for `max_bytes == 0`).
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::Io` when a source fails. The encoder then rewinds
    /// what it can and every later read fails with `EncodeError::Aborted`
    /// until [`reset`](Self::reset) succeeds.
    pub fn read(&mut self, max_bytes: usize) -> EncodeResult<Bytes> {
        if self.state == State::Aborted {
            return Err(EncodeError::Aborted);
        }

        let mut out = BytesMut::with_capacity(max_bytes.min(self.chunk_size));
        while out.len() < max_bytes {
            let remaining = max_bytes - out.len();
            self.state = match self.state {
                State::NotStarted => self.part_start(0),
                State::Head { index, offset } => {
                    let head = &self.parts[index].head;
                    let offset = offset + copy_into(&mut out, head, offset, remaining);
                    if offset == head.len() {
                        State::Body { index, offset: 0 }
                    } else {
                        State::Head { index, offset }
                    }
                }
                State::Body { index, offset } => self.advance_body(&mut out, index, offset, remaining)?,
                State::Tail { index, offset } => {
                    let offset = offset + copy_into(&mut out, CRLF, offset, remaining);
                    if offset == CRLF.len() {
                        self.part_start(index + 1)
                    } else {
                        State::Tail { index, offset }
                    }
                }
                State::Closing { offset } => {
                    let offset = offset + copy_into(&mut out, &self.closing, offset, remaining);
                    if offset == self.closing.len() {
                        tracing::trace!(boundary = %self.boundary, "Emitted closing boundary");
                        self.rewind_sources();
                        State::Finished
                    } else {
                        State::Closing { offset }
                    }
                }
                State::Finished | State::Aborted => break,
            };
        }

        Ok(out.freeze())
    }

    fn part_start(&self, index: usize) -> State {
        match self.parts.get(index) {
            Some(part) => {
                tracing::trace!(field = %part.name, index, "Encoding field");
                State::Head { index, offset: 0 }
            }
            None => State::Closing { offset: 0 },
        }
    }

    fn advance_body(
        &mut self,
        out: &mut BytesMut,
        index: usize,
        offset: u64,
        remaining: usize,
    ) -> EncodeResult<State> {
        let read = match &mut self.parts[index].body {
            PartBody::Literal(bytes) => {
                // Literal offsets are bounded by an in-memory length.
                #[allow(clippy::cast_possible_truncation)]
                let start = offset as usize;
                Ok(copy_into(out, bytes, start, remaining))
            }
            PartBody::Source { source, .. } => {
                read_source(source, out, remaining.min(self.chunk_size))
            }
        };

        match read {
            Ok(0) => Ok(State::Tail { index, offset: 0 }),
            Ok(n) => Ok(State::Body {
                index,
                offset: offset + n as u64,
            }),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                Ok(State::Body { index, offset })
            }
            Err(err) => Err(self.abort(index, err)),
        }
    }

    /// Rewind every rewindable source after a failed read and poison reads.
    fn abort(&mut self, index: usize, err: io::Error) -> EncodeError {
        tracing::warn!(
            field = %self.parts[index].name,
            error = %err,
            "Field source failed mid-read, aborting encoder"
        );

        self.rewind_sources();
        self.state = State::Aborted;
        EncodeError::Io(err)
    }

    /// Best-effort rewind of every rewindable source.
    fn rewind_sources(&mut self) {
        for part in &mut self.parts {
            if part.body.is_rewindable() {
                if let Err(err) = part.body.rewind() {
                    tracing::warn!(
                        field = %part.name,
                        error = %err,
                        "Failed to rewind field source"
                    );
                }
            }
        }
    }

    /// Rewind every source and return to the initial state.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::NotRewindable` naming the first field whose source
    /// cannot seek back; nothing is rewound in that case. Returns
    /// `EncodeError::Io` if a seek itself fails.
    pub fn reset(&mut self) -> EncodeResult<()> {
        if let Some(part) = self.parts.iter().find(|part| !part.body.is_rewindable()) {
            return Err(EncodeError::NotRewindable {
                name: part.name.clone(),
            });
        }

        for part in &mut self.parts {
            part.body.rewind()?;
        }

        self.state = State::NotStarted;
        tracing::debug!(boundary = %self.boundary, "Reset multipart encoder");
        Ok(())
    }

    /// Drain the remaining output into one buffer.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`read`](Self::read).
    pub fn to_bytes(&mut self) -> EncodeResult<Bytes> {
        let mut body = BytesMut::new();
        if let Some(length) = self.length {
            #[allow(clippy::cast_possible_truncation)]
            body.reserve(length as usize);
        }
        loop {
            let chunk = self.read(self.chunk_size)?;
            if chunk.is_empty() {
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}

impl Read for MultipartEncoder<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = MultipartEncoder::read(self, buf.len()).map_err(into_io_error)?;
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

impl fmt::Debug for MultipartEncoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartEncoder")
            .field("boundary", &self.boundary)
            .field("fields", &self.parts.len())
            .field("length", &self.length)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

pub(crate) fn into_io_error(err: EncodeError) -> io::Error {
    match err {
        EncodeError::Io(err) => err,
        other => io::Error::other(other),
    }
}

/// `multipart/form-data; boundary=...`, quoting tokens with tspecials.
fn content_type_for(boundary: &Boundary) -> String {
    let token = boundary.as_str();
    let is_token = token
        .bytes()
        .all(|byte| byte.is_ascii_alphanumeric() || b"'+_-.".contains(&byte));
    if is_token {
        format!("multipart/form-data; boundary={token}")
    } else {
        format!("multipart/form-data; boundary=\"{token}\"")
    }
}

/// Render `--boundary\r\n`, the header block and the blank line.
fn render_part<'a>(delimiter: &str, field: Field<'a>, charset: Charset) -> EncodeResult<Part<'a>> {
    let Field { name, body } = field;

    let mut disposition = format!("form-data; name={}", quote_param(&name));
    let mut headers = Headers::new();
    let body = match body {
        FieldBody::Text(text) => {
            headers.insert("Content-Disposition", disposition);
            PartBody::Literal(Bytes::from(charset.encode(&text).into_owned()))
        }
        FieldBody::Bytes(bytes) => {
            headers.insert("Content-Disposition", disposition);
            PartBody::Literal(bytes)
        }
        FieldBody::File(file) => {
            disposition.push_str("; filename=");
            disposition.push_str(&quote_param(&file.filename));
            headers.insert("Content-Disposition", disposition);
            if let Some(content_type) = file.content_type {
                headers.insert("Content-Type", content_type);
            }
            headers.extend(file.headers.iter());

            let mut source = file.source;
            let start = if source.is_rewindable() {
                Some(source.read_offset()?)
            } else {
                None
            };
            let len = source.static_len();
            PartBody::Source { source, len, start }
        }
    };

    // Names and filenames are percent-escaped; everything else must not
    // break out of its header line.
    for (header, value) in headers.iter() {
        if has_line_break(header) || has_line_break(value) {
            return Err(EncodeError::MalformedField {
                name,
                reason: format!("header {header:?} contains CR or LF"),
            });
        }
    }

    let mut head = BytesMut::new();
    head.extend_from_slice(delimiter.as_bytes());
    for (header, value) in headers.iter() {
        head.extend_from_slice(&charset.encode(header));
        head.extend_from_slice(HEADER_SEPARATOR);
        head.extend_from_slice(&charset.encode(value));
        head.extend_from_slice(CRLF);
    }
    head.extend_from_slice(CRLF);

    Ok(Part {
        name,
        head: head.freeze(),
        body,
    })
}

fn has_line_break(text: &str) -> bool {
    text.contains(['\r', '\n'])
}

/// Copy up to `limit` bytes of `src[offset..]` into `out`.
fn copy_into(out: &mut BytesMut, src: &[u8], offset: usize, limit: usize) -> usize {
    let n = (src.len() - offset).min(limit);
    out.extend_from_slice(&src[offset..offset + n]);
    n
}

/// Read at most `limit` bytes from `source` directly into `out`.
fn read_source(source: &mut BoxedSource<'_>, out: &mut BytesMut, limit: usize) -> io::Result<usize> {
    let start = out.len();
    out.resize(start + limit, 0);
    let result = source.read(&mut out[start..]);
    out.truncate(start + *result.as_ref().unwrap_or(&0));
    result
}
