//! Byte sources backing file fields.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// A readable field source.
///
/// Reading follows [`Read`]: a zero-length read signals the end. The size
/// query and the rewind operation are optional capabilities; a source that
/// supports neither still encodes, but makes the encoder length indeterminate
/// and [`reset`](crate::MultipartEncoder::reset) unavailable.
///
/// Sizes and offsets are relative to wherever the source is positioned when
/// the encoder receives it; bytes before that point are never sent.
pub trait FieldSource: Read {
    /// Bytes left between the current position and the end, if known.
    fn static_len(&self) -> Option<u64> {
        None
    }

    /// Whether [`read_offset`](Self::read_offset) and
    /// [`rewind_to`](Self::rewind_to) are supported.
    fn is_rewindable(&self) -> bool {
        false
    }

    /// Current read offset.
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::Unsupported` by default, or whatever the
    /// underlying seek fails with.
    fn read_offset(&mut self) -> io::Result<u64> {
        Err(unsupported())
    }

    /// Seek back to an offset returned by [`read_offset`](Self::read_offset).
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::Unsupported` by default, or whatever the
    /// underlying seek fails with.
    fn rewind_to(&mut self, offset: u64) -> io::Result<()> {
        let _ = offset;
        Err(unsupported())
    }
}

fn unsupported() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "source cannot be rewound")
}

impl<T: AsRef<[u8]>> FieldSource for Cursor<T> {
    fn static_len(&self) -> Option<u64> {
        let len = self.get_ref().as_ref().len() as u64;
        Some(len.saturating_sub(self.position()))
    }

    fn is_rewindable(&self) -> bool {
        true
    }

    fn read_offset(&mut self) -> io::Result<u64> {
        Ok(self.position())
    }

    fn rewind_to(&mut self, offset: u64) -> io::Result<()> {
        self.set_position(offset);
        Ok(())
    }
}

impl FieldSource for File {
    fn static_len(&self) -> Option<u64> {
        let len = self.metadata().ok()?.len();
        let mut handle: &File = self;
        let position = handle.stream_position().ok()?;
        Some(len.saturating_sub(position))
    }

    fn is_rewindable(&self) -> bool {
        true
    }

    fn read_offset(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    fn rewind_to(&mut self, offset: u64) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset)).map(|_| ())
    }
}

impl<S: FieldSource + ?Sized> FieldSource for &mut S {
    fn static_len(&self) -> Option<u64> {
        (**self).static_len()
    }

    fn is_rewindable(&self) -> bool {
        (**self).is_rewindable()
    }

    fn read_offset(&mut self) -> io::Result<u64> {
        (**self).read_offset()
    }

    fn rewind_to(&mut self, offset: u64) -> io::Result<()> {
        (**self).rewind_to(offset)
    }
}

impl<S: FieldSource + ?Sized> FieldSource for Box<S> {
    fn static_len(&self) -> Option<u64> {
        (**self).static_len()
    }

    fn is_rewindable(&self) -> bool {
        (**self).is_rewindable()
    }

    fn read_offset(&mut self) -> io::Result<u64> {
        (**self).read_offset()
    }

    fn rewind_to(&mut self, offset: u64) -> io::Result<()> {
        (**self).rewind_to(offset)
    }
}

/// Any reader, with no size and no rewind.
///
/// Encoders containing one report an indeterminate length.
#[derive(Debug)]
pub struct Unsized<R>(pub R);

impl<R: Read> Read for Unsized<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: Read> FieldSource for Unsized<R> {}

/// A seekable reader.
///
/// Tracks its own position so the remaining size stays exact after reads.
#[derive(Debug)]
pub struct Seekable<R> {
    inner: R,
    end: Option<u64>,
    position: u64,
}

impl<R: Read + Seek> Seekable<R> {
    /// Wrap a reader, discovering its size by seeking to the end.
    ///
    /// The read position is restored afterwards.
    ///
    /// # Errors
    ///
    /// Returns any error raised while seeking.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let position = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(position))?;
        Ok(Self {
            inner,
            end: Some(end),
            position,
        })
    }

    /// Wrap a reader whose size is unknown.
    ///
    /// # Errors
    ///
    /// Returns any error raised while querying the position.
    pub fn without_len(mut inner: R) -> io::Result<Self> {
        let position = inner.stream_position()?;
        Ok(Self {
            inner,
            end: None,
            position,
        })
    }

    /// Unwrap the reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Seekable<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> FieldSource for Seekable<R> {
    fn static_len(&self) -> Option<u64> {
        self.end.map(|end| end.saturating_sub(self.position))
    }

    fn is_rewindable(&self) -> bool {
        true
    }

    fn read_offset(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }

    fn rewind_to(&mut self, offset: u64) -> io::Result<()> {
        self.position = self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}
