//! FCP Multipart - `multipart/form-data` codec for FCP connectors
//!
//! This crate provides both directions of the form-data wire format:
//!
//! - **Encoder**: lazily serializes an ordered set of fields into framed bytes,
//!   pulling from file sources only as the caller reads
//! - **Progress**: a monitor wrapper that reports bytes read after every `read`
//! - **Decoder**: parses a fully-buffered payload into ordered [`BodyPart`]s
//!
//! # Quick Start
//!
//! ```rust
//! use fcp_multipart::{FormValue, MultipartConfig, MultipartDecoder, MultipartEncoder};
//!
//! let fields = vec![
//!     ("a", FormValue::text("1")),
//!     ("b", FormValue::file("f.txt", "DATA").with_content_type("text/plain")),
//! ];
//! let mut encoder = MultipartEncoder::new(fields, &MultipartConfig::default())?;
//! let content_type = encoder.content_type().to_string();
//! let body = encoder.to_bytes()?;
//!
//! let decoder = MultipartDecoder::new(body, &content_type)?;
//! assert_eq!(decoder.parts()[0], b"1");
//! assert_eq!(decoder.parts()[1].header("content-type"), Some("text/plain"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Wire format
//!
//! ```text
//! --boundary\r\n
//! Content-Disposition: form-data; name="a"\r\n
//! \r\n
//! 1\r\n
//! --boundary--\r\n
//! ```
//!
//! The boundary is never checked against field content. Collisions are
//! avoided only by the entropy of generated tokens.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod body_part;
mod boundary;
mod charset;
mod config;
mod decoder;
mod encoder;
mod error;
mod field;
mod framing;
mod headers;
mod monitor;
mod source;

pub use body_part::BodyPart;
pub use boundary::{Boundary, BoundaryGenerator, FixedBoundary, RandomBoundary};
pub use charset::Charset;
pub use config::MultipartConfig;
pub use decoder::{MultipartDecoder, ResponseLike};
pub use encoder::MultipartEncoder;
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
pub use field::{normalize, BoxedSource, Field, FieldBody, FileField, FormValue, TupleItem};
pub use headers::Headers;
pub use monitor::{MultipartEncoderMonitor, Progress};
pub use source::{FieldSource, Seekable, Unsized};

/// Default read size used when draining an encoder.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Maximum boundary length (RFC 2046).
pub const MAX_BOUNDARY_LEN: usize = 70;

/// Default charset label.
pub const DEFAULT_ENCODING: &str = "utf-8";
