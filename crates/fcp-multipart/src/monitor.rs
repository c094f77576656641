//! Upload progress reporting.

use std::fmt;
use std::io::{self, Read};

use bytes::Bytes;

use crate::config::MultipartConfig;
use crate::encoder::{into_io_error, MultipartEncoder};
use crate::error::EncodeResult;
use crate::field::FormValue;

/// Snapshot passed to the progress callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Bytes handed out since construction or the last reset.
    pub bytes_read: u64,
    /// Encoder length, if determinate.
    pub total: Option<u64>,
}

impl Progress {
    /// Completed fraction in `0.0..=1.0`, or `None` for indeterminate totals.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> Option<f64> {
        self.total.map(|total| {
            if total == 0 {
                1.0
            } else {
                (self.bytes_read as f64 / total as f64).min(1.0)
            }
        })
    }
}

/// Wraps an encoder and reports progress after every read.
///
/// Emitted bytes are passed through untouched.
pub struct MultipartEncoderMonitor<'a, F>
where
    F: FnMut(&Progress),
{
    encoder: MultipartEncoder<'a>,
    callback: F,
    bytes_read: u64,
}

impl<'a, F> MultipartEncoderMonitor<'a, F>
where
    F: FnMut(&Progress),
{
    /// Monitor an existing encoder.
    pub const fn new(encoder: MultipartEncoder<'a>, callback: F) -> Self {
        Self {
            encoder,
            callback,
            bytes_read: 0,
        }
    }

    /// Build the encoder and its monitor in one step.
    ///
    /// # Errors
    ///
    /// Returns any error from [`MultipartEncoder::new`].
    pub fn from_fields<I, N>(fields: I, config: &MultipartConfig, callback: F) -> EncodeResult<Self>
    where
        I: IntoIterator<Item = (N, FormValue<'a>)>,
        N: Into<String>,
    {
        Ok(Self::new(MultipartEncoder::new(fields, config)?, callback))
    }

    /// Bytes read so far.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Encoder length.
    #[must_use]
    pub const fn length(&self) -> Option<u64> {
        self.encoder.length()
    }

    /// Encoder content type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.encoder.content_type()
    }

    /// Current progress snapshot.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        Progress {
            bytes_read: self.bytes_read,
            total: self.encoder.length(),
        }
    }

    /// Read from the encoder, then invoke the callback.
    ///
    /// The callback also runs for the final empty read.
    ///
    /// # Errors
    ///
    /// Propagates encoder errors without invoking the callback.
    pub fn read(&mut self, max_bytes: usize) -> EncodeResult<Bytes> {
        let chunk = self.encoder.read(max_bytes)?;
        self.bytes_read += chunk.len() as u64;
        let progress = self.progress();
        (self.callback)(&progress);
        Ok(chunk)
    }

    /// Reset the encoder and zero the counter.
    ///
    /// # Errors
    ///
    /// Returns any error from [`MultipartEncoder::reset`]; the counter is kept
    /// in that case.
    pub fn reset(&mut self) -> EncodeResult<()> {
        self.encoder.reset()?;
        self.bytes_read = 0;
        Ok(())
    }

    /// The wrapped encoder.
    #[must_use]
    pub const fn encoder(&self) -> &MultipartEncoder<'a> {
        &self.encoder
    }

    /// Unwrap the encoder, dropping the callback.
    pub fn into_inner(self) -> MultipartEncoder<'a> {
        self.encoder
    }
}

impl<F> Read for MultipartEncoderMonitor<'_, F>
where
    F: FnMut(&Progress),
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = MultipartEncoderMonitor::read(self, buf.len()).map_err(into_io_error)?;
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

impl<F> fmt::Debug for MultipartEncoderMonitor<'_, F>
where
    F: FnMut(&Progress),
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartEncoderMonitor")
            .field("encoder", &self.encoder)
            .field("bytes_read", &self.bytes_read)
            .finish_non_exhaustive()
    }
}
