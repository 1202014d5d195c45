// Copyright (c) 2022-2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use crate::base::read::io::{compressed::CompressedReader, hashed::HashedReader};
use crate::entry::ZipEntry;
use crate::error::{Result, ZipError};
use crate::spec::compression::Compression;
use crate::spec::data_descriptor::DataDescriptor;

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_lite::io::{AsyncBufRead, AsyncRead, AsyncReadExt, Take};
use pin_project::pin_project;

/// A marker for an entry reader which carries its entry's metadata.
pub struct WithEntry(pub(crate) ZipEntry);

/// A marker for an entry reader without attached metadata.
pub struct WithoutEntry;

/// A ZIP entry reader which may implement decompression.
///
/// The reader yields an entry's uncompressed data and stops at its end; the underlying reader is left positioned for
/// whatever follows the entry's data (a data descriptor or the next record).
#[pin_project]
pub struct ZipEntryReader<R, E> {
    #[pin]
    reader: HashedReader<CompressedReader<Take<R>>>,
    entry: E,
}

impl<R> ZipEntryReader<R, WithoutEntry>
where
    R: AsyncBufRead + Unpin,
{
    /// Constructs an entry reader over a bounded view of `size` compressed bytes.
    pub(crate) fn new_with_owned(reader: R, compression: Compression, size: u64) -> Self {
        let reader = HashedReader::new(CompressedReader::new(reader.take(size), compression));
        Self { reader, entry: WithoutEntry }
    }

    /// Constructs an entry reader for a Stored entry terminated by a data descriptor.
    pub(crate) fn new_with_scan(reader: R, zip64: bool, limit: u64) -> Self {
        let reader = HashedReader::new(CompressedReader::new_with_scan(reader.take(u64::MAX), zip64, limit));
        Self { reader, entry: WithoutEntry }
    }

    pub(crate) fn into_with_entry(self, entry: ZipEntry) -> ZipEntryReader<R, WithEntry> {
        ZipEntryReader { reader: self.reader, entry: WithEntry(entry) }
    }
}

impl<R, E> ZipEntryReader<R, E>
where
    R: AsyncBufRead + Unpin,
{
    /// Computes and returns the CRC32 hash of bytes read by this reader so far.
    ///
    /// This hash should only be computed once EOF has been reached.
    pub fn compute_hash(&mut self) -> u32 {
        self.reader.swap_and_compute_hash()
    }

    /// Returns the number of uncompressed bytes read by this reader so far.
    pub fn bytes_read(&self) -> u64 {
        self.reader.bytes_read()
    }

    /// Returns the data descriptor recovered by a scanning reader, if any.
    pub(crate) fn descriptor(&self) -> Option<DataDescriptor> {
        self.reader.reader.descriptor()
    }

    /// Consumes this reader and returns the bounded view over the inner value.
    pub(crate) fn into_take(self) -> Take<R> {
        self.reader.into_inner().into_inner()
    }

    /// Consumes this reader and returns the inner value.
    pub(crate) fn into_inner(self) -> R {
        self.into_take().into_inner()
    }
}

impl<R> ZipEntryReader<R, WithEntry>
where
    R: AsyncBufRead + Unpin,
{
    /// Returns an immutable reference to the entry being read.
    pub fn entry(&self) -> &ZipEntry {
        &self.entry.0
    }

    /// Reads all bytes until EOF has been reached, appending them to buf, and verifies the CRC32 values.
    ///
    /// For an entry written with a data descriptor the declared CRC is only known once the descriptor has been read,
    /// so verification is deferred to the reader's finishing step in that case.
    ///
    /// This is a helper function synonymous to [`AsyncReadExt::read_to_end()`].
    pub async fn read_to_end_checked(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let read = self.read_to_end(buf).await?;

        if self.entry.0.data_descriptor() || self.compute_hash() == self.entry.0.crc32() {
            Ok(read)
        } else {
            Err(ZipError::CRC32CheckError)
        }
    }

    /// Reads all bytes until EOF has been reached, placing them into buf, and verifies the CRC32 values.
    ///
    /// This is a helper function synonymous to [`AsyncReadExt::read_to_string()`].
    pub async fn read_to_string_checked(&mut self, buf: &mut String) -> Result<usize> {
        let read = self.read_to_string(buf).await?;

        if self.entry.0.data_descriptor() || self.compute_hash() == self.entry.0.crc32() {
            Ok(read)
        } else {
            Err(ZipError::CRC32CheckError)
        }
    }

    /// Splits this reader into its entry and an equivalent reader without attached metadata.
    pub(crate) fn into_without_entry(self) -> (ZipEntry, ZipEntryReader<R, WithoutEntry>) {
        (self.entry.0, ZipEntryReader { reader: self.reader, entry: WithoutEntry })
    }
}

impl<R, E> AsyncRead for ZipEntryReader<R, E>
where
    R: AsyncBufRead + Unpin,
{
    fn poll_read(self: Pin<&mut Self>, c: &mut Context<'_>, b: &mut [u8]) -> Poll<std::io::Result<usize>> {
        let mut this = self.project();
        let read = match ready!(this.reader.as_mut().poll_read(c, b)) {
            Ok(read) => read,
            Err(err) => return Poll::Ready(Err(err)),
        };

        // A Stored entry's bounded view returning EOF with bytes still owed means the source ended mid-entry.
        if read == 0 && !b.is_empty() {
            if let CompressedReader::Stored(take) = &this.reader.as_ref().get_ref().reader {
                if take.limit() != 0 {
                    return Poll::Ready(Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "source ended before the entry's declared size",
                    )));
                }
            }
        }

        Poll::Ready(Ok(read))
    }
}
