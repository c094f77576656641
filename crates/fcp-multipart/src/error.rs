//! Multipart error types.

use thiserror::Error;

/// Encoder errors.
///
/// Construction errors (`MalformedField`, `InvalidBoundary`, `UnknownEncoding`)
/// prevent any bytes from being produced. `NotRewindable` only surfaces from
/// [`reset`](crate::MultipartEncoder::reset).
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A field definition has the wrong shape.
    #[error("malformed field {name:?}: {reason}")]
    MalformedField {
        /// Field name.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A field source cannot seek back to its start.
    #[error("field {name:?} has a source that cannot be rewound")]
    NotRewindable {
        /// Field name.
        name: String,
    },

    /// An explicitly supplied boundary violates the multipart grammar.
    #[error("invalid boundary {boundary:?}: {reason}")]
    InvalidBoundary {
        /// The rejected token.
        boundary: String,
        /// Grammar rule that failed.
        reason: &'static str,
    },

    /// The configured charset label is not recognised.
    #[error("unknown encoding label {label:?}")]
    UnknownEncoding {
        /// The rejected label.
        label: String,
    },

    /// A previous read failed mid-stream; call `reset()` before reading again.
    #[error("encoder aborted by an earlier read failure")]
    Aborted,

    /// I/O error from a field source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoder errors.
///
/// Any decoder error aborts the whole parse; no partial part list is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Content-Type top-level type is not `multipart`.
    #[error("unexpected mimetype in content-type: {mimetype:?}")]
    NonMultipartContentType {
        /// The mimetype that was found.
        mimetype: String,
    },

    /// The response carried no Content-Type header.
    #[error("missing content-type header")]
    MissingContentType,

    /// Content-Type has no `boundary` attribute.
    #[error("missing boundary in multipart content-type")]
    MissingBoundary,

    /// A fragment has neither a header/content separator nor a leading CRLF.
    #[error("content neither contains CR-LF-CR-LF, nor starts with CR-LF")]
    ImproperBodyPartContent,

    /// A fragment is not terminated by CRLF before the next separator.
    #[error("part {index} is not terminated by CR-LF")]
    MissingLineTerminator {
        /// Zero-based fragment index.
        index: usize,
    },

    /// The configured charset label is not recognised.
    #[error("unknown encoding label {label:?}")]
    UnknownEncoding {
        /// The rejected label.
        label: String,
    },

    /// Part content is not valid in the decoder's charset.
    #[error("content is not valid {encoding}")]
    UndecodableText {
        /// Charset name.
        encoding: &'static str,
    },
}

/// Result type for encoder operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Result type for decoder operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
