//! Big-endian reading and writing over byte streams.
//!
//! Everything in a font file is big-endian; these helpers decode and encode
//! explicitly, so nothing depends on the host's byte order.

use std::io::{self, Read, Seek, SeekFrom, Write};

use font_types::Scalar;

/// A cursor over a seekable source of font data.
///
/// All offsets are absolute positions in the underlying stream.
#[derive(Debug)]
pub struct BeReader<R> {
    inner: R,
}

impl<R: Read + Seek> BeReader<R> {
    pub fn new(inner: R) -> Self {
        BeReader { inner }
    }

    /// Read a scalar at the current position.
    ///
    /// The width is that of the scalar's raw big-endian form, so the type is
    /// usually inferred from the destination.
    pub fn read<T, const N: usize>(&mut self) -> io::Result<T>
    where
        T: Scalar<Raw = [u8; N]>,
    {
        let mut raw = [0u8; N];
        self.inner.read_exact(&mut raw)?;
        Ok(T::from_raw(raw))
    }

    /// Move to an absolute position.
    pub fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Read exactly `len` bytes at the current position.
    pub fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Copy exactly `len` bytes from the current position into `sink`.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] if the source ends first.
    pub fn copy_to<W: Write>(&mut self, len: u64, sink: &mut W) -> io::Result<()> {
        let copied = io::copy(&mut (&mut self.inner).take(len), sink)?;
        if copied != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {len} bytes, found {copied}"),
            ));
        }
        Ok(())
    }
}

/// Write the big-endian encoding of a scalar.
pub fn write_be<W: Write>(writer: &mut W, value: impl Scalar) -> io::Result<()> {
    writer.write_all(value.to_raw().as_ref())
}

/// Write `count` zero bytes.
pub fn write_zeros<W: Write>(writer: &mut W, count: usize) -> io::Result<()> {
    const ZEROS: [u8; 64] = [0; 64];
    let mut remaining = count;
    while remaining > 0 {
        let chunk = remaining.min(ZEROS.len());
        writer.write_all(&ZEROS[..chunk])?;
        remaining -= chunk;
    }
    Ok(())
}
