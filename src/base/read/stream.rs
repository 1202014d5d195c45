// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! A ZIP reader which acts over a non-seekable source.
//!
//! # API Design
//! As opposed to other ZIP readers, it's important that the data of an entry is fully read before the proceeding
//! entry is read. This is as a result of not being able to seek forwards or backwards, so we must end up at the start
//! of the next entry.
//!
//! **We encode this invariant within Rust's type system so that it can be enforced at compile time.**
//!
//! This requires that any transition methods between these encoded types consume the reader and provide a new owned
//! reader back. This is certainly something to keep in mind when working with this reader, but idiomatic code can
//! still be produced nevertheless.
//!
//! # Considerations
//! As the central directory of a ZIP archive is stored at the end of it, a non-seekable reader doesn't have access
//! to it; it is discarded when reached. We have to rely on information provided within the local file header which
//! may not be accurate or complete. This results in:
//! - No file comment being available (defaults to an empty string) unless a Unicode comment extra field was written.
//! - No internal or external file attributes being available.
//! - The extra field data potentially being inconsistent with what's stored in the central directory.
//! - None of the following being available upfront when the entry was written with a data descriptor (defaults to 0,
//!   populated on the entry handed back once the entry's data has been fully consumed):
//!     - CRC
//!     - compressed size
//!     - uncompressed size
//!
//! # Example
//! ```no_run
//! # use futures_lite::io::Cursor;
//! # use zipstream::error::Result;
//! # use zipstream::base::read::stream::ZipFileReader;
//! #
//! # async fn run() -> Result<()> {
//! let mut zip = ZipFileReader::new(Cursor::new([0; 0]));
//!
//! // Print the name of every file in a ZIP archive.
//! while let Some(entry) = zip.next_with_entry().await? {
//!     println!("File: {}", entry.reader().entry().filename().as_str().unwrap());
//!     (_, zip) = entry.skip().await?;
//! }
//! #
//! #     Ok(())
//! # }
//! ```

use crate::base::read::counting::Counting;
use crate::base::read::io::entry::{WithEntry, WithoutEntry, ZipEntryReader};
use crate::entry::ZipEntry;
use crate::error::{Result, ZipError};
use crate::spec::compression::Compression;
use crate::spec::data_descriptor::DataDescriptor;
use crate::spec::header::HeaderId;

#[cfg(feature = "tokio")]
use crate::tokio::read::stream::Ready as TokioReady;

use futures_lite::io::{AsyncBufRead, AsyncReadExt};

#[cfg(feature = "tokio")]
use tokio_util::compat::TokioAsyncReadCompatExt;

/// How far past a declared compressed size the descriptor scan will go before giving up.
const DESCRIPTOR_SCAN_MARGIN: u64 = 64 * 1024;

/// A type which encodes that [`ZipFileReader`] is ready to open a new entry.
pub struct Ready<R>(R);

/// A type which encodes that [`ZipFileReader`] is currently reading an entry.
pub struct Reading<R, E>(ZipEntryReader<R, E>, Framing);

/// How the end of the current entry's data is determined, and how the entry is checked once it has been reached.
#[derive(Copy, Clone, Debug)]
enum Framing {
    /// The local file header declared the sizes and CRC upfront.
    Declared { crc32: u32, uncompressed_size: u64 },
    /// A data descriptor follows the data; decompression delimits the data itself.
    Descriptor { zip64: bool, payload_start: u64 },
    /// A data descriptor follows the data and also delimits it; the entry reader consumes it while scanning.
    ScannedDescriptor,
}

/// A ZIP reader which acts over a non-seekable source.
///
/// See the [module-level docs](.) for more information.
pub struct ZipFileReader<S>(S);

impl<R> ZipFileReader<Ready<Counting<R>>>
where
    R: AsyncBufRead + Unpin,
{
    /// Constructs a new ZIP reader from a non-seekable source.
    ///
    /// No I/O is performed until the first entry is opened.
    pub fn new(reader: R) -> Self {
        Self(Ready(Counting::new(reader)))
    }

    /// Opens the next entry for reading if the central directory hasn’t yet been reached.
    pub async fn next_without_entry(mut self) -> Result<Option<ZipFileReader<Reading<Counting<R>, WithoutEntry>>>> {
        let entry = match crate::base::read::lfh(&mut self.0 .0).await? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let (reader, framing) = entry_reader(self.0 .0, &entry);
        Ok(Some(ZipFileReader(Reading(reader, framing))))
    }

    /// Opens the next entry for reading if the central directory hasn’t yet been reached.
    pub async fn next_with_entry(mut self) -> Result<Option<ZipFileReader<Reading<Counting<R>, WithEntry>>>> {
        let entry = match crate::base::read::lfh(&mut self.0 .0).await? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let (reader, framing) = entry_reader(self.0 .0, &entry);
        Ok(Some(ZipFileReader(Reading(reader.into_with_entry(entry), framing))))
    }

    /// Returns the offset of the reader within the source, in bytes.
    pub fn offset(&self) -> u64 {
        self.0 .0.bytes_read()
    }

    /// Consumes the `ZipFileReader` returning the original `reader`
    pub async fn into_inner(self) -> R {
        self.0 .0.into_inner()
    }
}

#[cfg(feature = "tokio")]
impl<R> ZipFileReader<TokioReady<R>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    /// Constructs a new tokio-specific ZIP reader from a non-seekable source.
    pub fn with_tokio(reader: R) -> ZipFileReader<TokioReady<R>> {
        Self(Ready(Counting::new(reader.compat())))
    }
}

fn entry_reader<R>(reader: Counting<R>, entry: &ZipEntry) -> (ZipEntryReader<Counting<R>, WithoutEntry>, Framing)
where
    R: AsyncBufRead + Unpin,
{
    let payload_start = reader.bytes_read();

    if !entry.data_descriptor() {
        let framing = Framing::Declared { crc32: entry.crc32(), uncompressed_size: entry.uncompressed_size() };
        return (ZipEntryReader::new_with_owned(reader, entry.compression(), entry.compressed_size()), framing);
    }

    let zip64 = entry
        .extra_fields()
        .iter()
        .any(|field| field.header_id() == HeaderId::ZIP64_EXTENDED_INFORMATION_EXTRA_FIELD);

    match entry.compression() {
        Compression::Stored => {
            // Writers aren't obliged to declare a size alongside a descriptor, but when one is present it bounds
            // how far the scan is allowed to go.
            let limit = match entry.compressed_size() {
                0 => u64::MAX,
                declared => declared.saturating_add(DESCRIPTOR_SCAN_MARGIN),
            };
            (ZipEntryReader::new_with_scan(reader, zip64, limit), Framing::ScannedDescriptor)
        }
        #[cfg(feature = "deflate")]
        Compression::Deflate => {
            let framing = Framing::Descriptor { zip64, payload_start };
            (ZipEntryReader::new_with_owned(reader, entry.compression(), u64::MAX), framing)
        }
    }
}

impl<R, E> ZipFileReader<Reading<Counting<R>, E>>
where
    R: AsyncBufRead + Unpin,
{
    /// Returns an immutable reference to the inner entry reader.
    pub fn reader(&self) -> &ZipEntryReader<Counting<R>, E> {
        &self.0 .0
    }

    /// Returns a mutable reference to the inner entry reader.
    pub fn reader_mut(&mut self) -> &mut ZipEntryReader<Counting<R>, E> {
        &mut self.0 .0
    }
}

impl<R> ZipFileReader<Reading<Counting<R>, WithEntry>>
where
    R: AsyncBufRead + Unpin,
{
    /// Converts the reader back into the Ready state if EOF has been reached.
    ///
    /// The values observed while reading are checked against the header's declared values, or against the trailing
    /// data descriptor for an entry written with one. The entry handed back carries the descriptor's values.
    pub async fn done(mut self) -> Result<(ZipEntry, ZipFileReader<Ready<Counting<R>>>)> {
        if self.0 .0.read(&mut [0; 1]).await? != 0 {
            return Err(ZipError::EOFNotReached);
        }

        let Reading(reader, framing) = self.0;
        let (mut entry, reader) = reader.into_without_entry();
        let (descriptor, inner) = finish_entry(reader, framing).await?;

        if let Some(descriptor) = descriptor {
            apply_descriptor(&mut entry, &descriptor);
        }

        Ok((entry, ZipFileReader(Ready(inner))))
    }

    /// Reads until EOF and converts the reader back into the Ready state.
    ///
    /// An entry whose sizes were declared upfront is discarded without decompressing the remainder, and without any
    /// CRC claim being made. An entry delimited by a data descriptor has to be decompressed to find its end, so its
    /// trailer is read and verified just as in [`Self::done()`].
    pub async fn skip(mut self) -> Result<(ZipEntry, ZipFileReader<Ready<Counting<R>>>)> {
        if !matches!(self.0 .1, Framing::Declared { .. }) {
            let mut buf = [0; 8192];
            while self.0 .0.read(&mut buf).await? != 0 {}
        }

        let Reading(reader, framing) = self.0;
        let (mut entry, reader) = reader.into_without_entry();

        let (descriptor, inner) = match framing {
            Framing::Declared { .. } => (None, discard_entry(reader).await?),
            framing => finish_entry(reader, framing).await?,
        };

        if let Some(descriptor) = descriptor {
            apply_descriptor(&mut entry, &descriptor);
        }

        Ok((entry, ZipFileReader(Ready(inner))))
    }
}

impl<R> ZipFileReader<Reading<Counting<R>, WithoutEntry>>
where
    R: AsyncBufRead + Unpin,
{
    /// Converts the reader back into the Ready state if EOF has been reached.
    ///
    /// Returns the entry's data descriptor when it was delimited by one.
    pub async fn done(mut self) -> Result<(Option<DataDescriptor>, ZipFileReader<Ready<Counting<R>>>)> {
        if self.0 .0.read(&mut [0; 1]).await? != 0 {
            return Err(ZipError::EOFNotReached);
        }

        let Reading(reader, framing) = self.0;
        let (descriptor, inner) = finish_entry(reader, framing).await?;

        Ok((descriptor, ZipFileReader(Ready(inner))))
    }

    /// Reads until EOF and converts the reader back into the Ready state.
    pub async fn skip(mut self) -> Result<(Option<DataDescriptor>, ZipFileReader<Ready<Counting<R>>>)> {
        if !matches!(self.0 .1, Framing::Declared { .. }) {
            let mut buf = [0; 8192];
            while self.0 .0.read(&mut buf).await? != 0 {}
        }

        let Reading(reader, framing) = self.0;
        let (descriptor, inner) = match framing {
            Framing::Declared { .. } => (None, discard_entry(reader).await?),
            framing => finish_entry(reader, framing).await?,
        };

        Ok((descriptor, ZipFileReader(Ready(inner))))
    }
}

fn apply_descriptor(entry: &mut ZipEntry, descriptor: &DataDescriptor) {
    entry.crc32 = descriptor.crc;
    entry.compressed_size = descriptor.compressed_size;
    entry.uncompressed_size = descriptor.uncompressed_size;
}

/// Verifies a fully-read entry against its framing and positions the inner reader at the next record.
async fn finish_entry<R>(
    mut reader: ZipEntryReader<Counting<R>, WithoutEntry>,
    framing: Framing,
) -> Result<(Option<DataDescriptor>, Counting<R>)>
where
    R: AsyncBufRead + Unpin,
{
    let crc = reader.compute_hash();
    let uncompressed = reader.bytes_read();

    match framing {
        Framing::Declared { crc32, uncompressed_size } => {
            if uncompressed != uncompressed_size {
                return Err(ZipError::SizeCheckError(uncompressed_size, uncompressed));
            }
            if crc != crc32 {
                return Err(ZipError::CRC32CheckError);
            }

            // Some encoders pad the declared compressed span beyond what the decompressor consumes.
            Ok((None, discard_entry(reader).await?))
        }
        Framing::Descriptor { zip64, payload_start } => {
            let mut inner = reader.into_inner();
            let compressed = inner.bytes_read() - payload_start;

            let running = DataDescriptor { crc, compressed_size: compressed, uncompressed_size: uncompressed };
            let descriptor = DataDescriptor::from_reader(&mut inner, zip64, &running).await?;

            if descriptor.compressed_size != compressed || descriptor.uncompressed_size != uncompressed {
                return Err(ZipError::SizeCheckError(descriptor.uncompressed_size, uncompressed));
            }
            if descriptor.crc != crc {
                return Err(ZipError::CRC32CheckError);
            }

            Ok((Some(descriptor), inner))
        }
        Framing::ScannedDescriptor => {
            let descriptor = reader.descriptor().ok_or(ZipError::EOFNotReached)?;
            if descriptor.crc != crc {
                return Err(ZipError::CRC32CheckError);
            }

            Ok((Some(descriptor), reader.into_inner()))
        }
    }
}

/// Discards the unread remainder of an entry's bounded compressed span without decompressing it.
async fn discard_entry<R>(reader: ZipEntryReader<Counting<R>, WithoutEntry>) -> Result<Counting<R>>
where
    R: AsyncBufRead + Unpin,
{
    let mut take = reader.into_take();
    let mut buf = [0; 8192];
    while take.read(&mut buf).await? != 0 {}

    Ok(take.into_inner())
}
