// Copyright (c) 2022 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use crate::base::read::io::scan::DescriptorScanReader;
use crate::spec::compression::Compression;
use crate::spec::data_descriptor::DataDescriptor;

use std::pin::Pin;
use std::task::{Context, Poll};

#[cfg(feature = "deflate")]
use async_compression::futures::bufread;
use futures_lite::io::{AsyncBufRead, AsyncRead};
use pin_project::pin_project;

/// A wrapping reader which holds concrete types for all respective compression method readers.
#[pin_project(project = CompressedReaderProj)]
pub(crate) enum CompressedReader<R> {
    Stored(#[pin] R),
    StoredScan(#[pin] DescriptorScanReader<R>),
    #[cfg(feature = "deflate")]
    Deflate(#[pin] bufread::DeflateDecoder<R>),
}

impl<R> CompressedReader<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Constructs a new wrapping reader from a generic [`AsyncBufRead`] implementer.
    pub(crate) fn new(reader: R, compression: Compression) -> Self {
        match compression {
            Compression::Stored => CompressedReader::Stored(reader),
            #[cfg(feature = "deflate")]
            Compression::Deflate => CompressedReader::Deflate(bufread::DeflateDecoder::new(reader)),
        }
    }

    /// Constructs a new wrapping reader for a Stored entry delimited by a trailing data descriptor.
    pub(crate) fn new_with_scan(reader: R, zip64: bool, limit: u64) -> Self {
        CompressedReader::StoredScan(DescriptorScanReader::new(reader, zip64, limit))
    }

    /// Returns the data descriptor recovered by the scanning variant, if complete.
    pub(crate) fn descriptor(&self) -> Option<DataDescriptor> {
        match self {
            CompressedReader::StoredScan(inner) => inner.descriptor(),
            _ => None,
        }
    }

    /// Consumes this reader and returns the inner value.
    pub(crate) fn into_inner(self) -> R {
        match self {
            CompressedReader::Stored(inner) => inner,
            CompressedReader::StoredScan(inner) => inner.into_inner(),
            #[cfg(feature = "deflate")]
            CompressedReader::Deflate(inner) => inner.into_inner(),
        }
    }
}

impl<R> AsyncRead for CompressedReader<R>
where
    R: AsyncBufRead + Unpin,
{
    fn poll_read(self: Pin<&mut Self>, c: &mut Context<'_>, b: &mut [u8]) -> Poll<std::io::Result<usize>> {
        match self.project() {
            CompressedReaderProj::Stored(inner) => inner.poll_read(c, b),
            CompressedReaderProj::StoredScan(inner) => inner.poll_read(c, b),
            #[cfg(feature = "deflate")]
            CompressedReaderProj::Deflate(inner) => inner.poll_read(c, b),
        }
    }
}
