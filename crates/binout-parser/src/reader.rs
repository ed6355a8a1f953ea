//! Low-level, width-aware byte reading over any `Read + Seek` source.
//!
//! Unlike a fixed-width binary format, binout's length/command/typeid
//! fields each carry their own byte width (1, 2, 4, or 8), discovered from
//! the shard's header prefix. [`ShardReader::read_uint`] centralizes that
//! variable-width little-endian decoding so the stream parser never hand-rolls it.

use binout_core::errors::{BinoutError, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::io::{Read, Seek, SeekFrom};

pub struct ShardReader<R> {
    inner: R,
    len: u64,
}

impl<R: Read + Seek> ShardReader<R> {
    /// Wrap `inner`, discovering its total length via seek-to-end/tell and
    /// restoring the original position, per §4.3 step 2.
    pub fn new(mut inner: R) -> Result<Self> {
        let current = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(current))?;
        Ok(ShardReader { inner, len })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn is_eof(&mut self) -> Result<bool> {
        Ok(self.position()? >= self.len)
    }

    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Skip forward `n` bytes. Always seeks to an absolute, checked target
    /// rather than `SeekFrom::Current(n as i64)`, so an `n` too large to fit
    /// in an `i64` can never wrap around into a backward seek.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let current = self.position()?;
        let target = current
            .checked_add(n)
            .ok_or(BinoutError::TruncatedRecord {
                offset: current,
                expected: n as usize,
                found: 0,
            })?;
        self.inner.seek(SeekFrom::Start(target))?;
        Ok(())
    }

    /// Read exactly `n` bytes, mapping a short read into [`BinoutError::TruncatedRecord`].
    pub fn read_exact_n(&mut self, n: usize) -> Result<Vec<u8>> {
        let offset = self.position()?;
        let mut buf = vec![0u8; n];
        match self.inner.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(BinoutError::TruncatedRecord {
                    offset,
                    expected: n,
                    found: 0,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let bytes = self.read_exact_n(1)?;
        Ok(bytes[0])
    }

    /// Read an unsigned little-endian integer of `width` bytes (1..=8).
    pub fn read_uint(&mut self, width: u8) -> Result<u64> {
        let bytes = self.read_exact_n(width as usize)?;
        Ok(LittleEndian::read_uint(&bytes, width as usize))
    }
}
