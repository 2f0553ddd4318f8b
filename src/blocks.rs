//! Fixed-stride block storage.
//!
//! Secret and public keys are arrays of `n` blocks of `h` bytes that signing
//! and verification address out of storage order. [`BlockSource`] keeps that
//! random-access contract independent of where the bytes live.

use crate::error::{io_error, Error, FormatError, Result, Stream};
use crate::utils::block_offset;
use std::io::{ErrorKind, Read, Seek, SeekFrom};

pub trait BlockSource {
    /// Reads block `index` into `block`. The length of `block` is the block
    /// size.
    fn read_block(&mut self, index: usize, block: &mut [u8]) -> Result<()>;

    /// Checks that the store holds exactly the expected number of blocks.
    fn finish(&mut self) -> Result<()>;
}

/// Blocks held in memory.
#[derive(Clone, Copy, Debug)]
pub struct SliceBlocks<'a> {
    data: &'a [u8],
    expected_bytes: usize,
    stream: Stream,
}

impl<'a> SliceBlocks<'a> {
    pub fn new(data: &'a [u8], block_bytes: usize, block_count: usize, stream: Stream) -> Self {
        Self {
            data,
            expected_bytes: block_bytes * block_count,
            stream,
        }
    }
}

impl BlockSource for SliceBlocks<'_> {
    fn read_block(&mut self, index: usize, block: &mut [u8]) -> Result<()> {
        let start = index * block.len();
        let end = start + block.len();
        let src = self
            .data
            .get(start..end)
            .ok_or(FormatError::Truncated(self.stream))?;
        block.copy_from_slice(src);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        check_len(self.data.len() as u64, self.expected_bytes as u64, self.stream)
    }
}

/// Blocks read from a seekable stream such as a key file.
#[derive(Debug)]
pub struct SeekBlocks<R> {
    inner: R,
    expected_bytes: u64,
    stream: Stream,
}

impl<R: Read + Seek> SeekBlocks<R> {
    pub fn new(inner: R, block_bytes: usize, block_count: usize, stream: Stream) -> Self {
        Self {
            inner,
            expected_bytes: block_offset(block_count, block_bytes),
            stream,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> BlockSource for SeekBlocks<R> {
    fn read_block(&mut self, index: usize, block: &mut [u8]) -> Result<()> {
        let context = seek_context(self.stream);
        self.inner
            .seek(SeekFrom::Start(block_offset(index, block.len())))
            .map_err(io_error(context))?;
        read_block_from(&mut self.inner, block, self.stream)
    }

    fn finish(&mut self) -> Result<()> {
        let len = self
            .inner
            .seek(SeekFrom::End(0))
            .map_err(io_error(seek_context(self.stream)))?;
        check_len(len, self.expected_bytes, self.stream)
    }
}

/// Reads exactly one block from a sequential stream. Running out of data
/// part-way is a format error, not an I/O error.
pub fn read_block_from<R: Read + ?Sized>(
    reader: &mut R,
    block: &mut [u8],
    stream: Stream,
) -> Result<()> {
    match reader.read_exact(block) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(FormatError::Truncated(stream).into()),
        Err(e) => Err(io_error(read_context(stream))(e)),
    }
}

/// Confirms a sequential stream has no bytes left.
pub fn expect_end<R: Read + ?Sized>(reader: &mut R, stream: Stream) -> Result<()> {
    let mut probe = [0u8; 1];
    loop {
        match reader.read(&mut probe) {
            Ok(0) => return Ok(()),
            Ok(_) => return Err(FormatError::TrailingData(stream).into()),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(io_error(read_context(stream))(e)),
        }
    }
}

pub(crate) fn check_len(actual: u64, expected: u64, stream: Stream) -> Result<()> {
    if actual < expected {
        Err(Error::Format(FormatError::Truncated(stream)))
    } else if actual > expected {
        Err(Error::Format(FormatError::TrailingData(stream)))
    } else {
        Ok(())
    }
}

pub(crate) fn read_context(stream: Stream) -> &'static str {
    match stream {
        Stream::Message => "Failed to read message",
        Stream::SecretKey => "Failed to read from secret key file",
        Stream::PublicKey => "Failed to read from public key file",
        Stream::Signature => "Failed to read from signature file",
    }
}

pub(crate) fn write_context(stream: Stream) -> &'static str {
    match stream {
        Stream::Message => "Failed to write message",
        Stream::SecretKey => "Failed to write secret key",
        Stream::PublicKey => "Failed to write to public key file",
        Stream::Signature => "Failed to write to signature file",
    }
}

fn seek_context(stream: Stream) -> &'static str {
    match stream {
        Stream::PublicKey => "Failed to seek within public key file",
        Stream::Signature => "Failed to seek within signature file",
        _ => "Failed to seek within secret key file",
    }
}
