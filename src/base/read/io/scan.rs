// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use crate::error::ZipError;
use crate::spec::consts::{DATA_DESCRIPTOR_SIGNATURE, SIGNATURE_LENGTH};
use crate::spec::data_descriptor::DataDescriptor;

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use crc32fast::Hasher;
use futures_lite::io::{AsyncBufRead, AsyncRead};
use pin_project::pin_project;

/// A reader for a Stored entry whose length is only declared by a trailing data descriptor.
///
/// Stored data doesn't self-delimit, so the payload is terminated by scanning for the descriptor's signature. Any
/// occurrence of the signature within the data itself is ruled out by checking the candidate descriptor's CRC32 and
/// size fields against the values accumulated so far; a candidate that doesn't match is emitted as payload and the
/// scan continues.
///
/// Bytes past the end of a confirmed descriptor are never consumed from the underlying reader.
#[pin_project]
pub(crate) struct DescriptorScanReader<R> {
    #[pin]
    inner: R,
    window: Vec<u8>,
    cleared: usize,
    hasher: Hasher,
    emitted: u64,
    limit: u64,
    zip64: bool,
    descriptor: Option<DataDescriptor>,
}

enum Scan {
    Found { index: usize, descriptor: DataDescriptor },
    NotFound { cleared: usize },
}

impl<R> DescriptorScanReader<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Constructs a new scanning reader which gives up once `limit` payload bytes have accumulated.
    pub(crate) fn new(inner: R, zip64: bool, limit: u64) -> Self {
        Self {
            inner,
            window: Vec::new(),
            cleared: 0,
            hasher: Hasher::default(),
            emitted: 0,
            limit,
            zip64,
            descriptor: None,
        }
    }

    /// Returns the entry's data descriptor once the end of the payload has been found.
    pub(crate) fn descriptor(&self) -> Option<DataDescriptor> {
        self.descriptor
    }

    /// Consumes this reader and returns the inner value.
    pub(crate) fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> AsyncRead for DescriptorScanReader<R>
where
    R: AsyncBufRead + Unpin,
{
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<std::io::Result<usize>> {
        let mut this = self.project();

        loop {
            let emittable = (*this.cleared).min(this.window.len());
            if emittable > 0 && !buf.is_empty() {
                let count = emittable.min(buf.len());
                buf[..count].copy_from_slice(&this.window[..count]);
                this.hasher.update(&buf[..count]);
                *this.emitted += count as u64;
                this.window.drain(..count);
                *this.cleared -= count;

                return Poll::Ready(Ok(count));
            }

            if this.descriptor.is_some() || buf.is_empty() {
                return Poll::Ready(Ok(0));
            }

            let consumed = {
                let chunk = ready!(this.inner.as_mut().poll_fill_buf(cx))?;
                if chunk.is_empty() {
                    return Poll::Ready(Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "source ended before a data descriptor was found",
                    )));
                }

                // The window never grows past one lookahead before a refill, so this stays chunk-sized.
                let mut probe = std::mem::take(this.window);
                probe.extend_from_slice(chunk);

                match scan_probe(&probe, this.hasher, *this.emitted, *this.zip64) {
                    Scan::Found { index, descriptor } => {
                        let consumed = index + lookahead(*this.zip64) - (probe.len() - chunk.len());
                        probe.truncate(index);
                        *this.cleared = probe.len();
                        *this.window = probe;
                        *this.descriptor = Some(descriptor);
                        consumed
                    }
                    Scan::NotFound { cleared } => {
                        let consumed = chunk.len();
                        *this.cleared = cleared;
                        *this.window = probe;
                        consumed
                    }
                }
            };
            this.inner.as_mut().consume(consumed);

            if this.descriptor.is_none() && *this.emitted + this.window.len() as u64 > *this.limit {
                return Poll::Ready(Err(std::io::Error::other(ZipError::UnableToLocateDataDescriptor)));
            }
        }
    }
}

fn lookahead(zip64: bool) -> usize {
    SIGNATURE_LENGTH + DataDescriptor::field_length(zip64)
}

/// Searches `probe` for a descriptor confirmed by the running CRC32 and counters.
///
/// `hasher` and `emitted` cover the bytes already handed to the caller; everything in `probe` ahead of a candidate
/// signature would be payload, so it is folded into a copy of the hasher before comparing.
fn scan_probe(probe: &[u8], hasher: &Hasher, emitted: u64, zip64: bool) -> Scan {
    let lookahead = lookahead(zip64);
    let signature = DATA_DESCRIPTOR_SIGNATURE.to_le_bytes();
    let mut search = 0;

    while search + SIGNATURE_LENGTH <= probe.len() {
        let Some(relative) = probe[search..].windows(SIGNATURE_LENGTH).position(|window| window == signature) else {
            break;
        };
        let index = search + relative;

        if probe.len() - index < lookahead {
            // Partial candidate; everything before it is cleared while we wait for the rest.
            return Scan::NotFound { cleared: index };
        }

        let mut candidate_hasher = hasher.clone();
        candidate_hasher.update(&probe[..index]);
        let crc = candidate_hasher.finalize();
        let count = emitted + index as u64;

        let descriptor = DataDescriptor::from_field_bytes(&probe[index + SIGNATURE_LENGTH..index + lookahead], zip64);
        if descriptor.crc == crc && descriptor.compressed_size == count && descriptor.uncompressed_size == count {
            return Scan::Found { index, descriptor };
        }

        tracing::trace!(index, "descriptor signature did not check out, treating it as entry data");
        search = index + 1;
    }

    // A signature could still begin within the last three bytes.
    Scan::NotFound { cleared: probe.len().saturating_sub(SIGNATURE_LENGTH - 1) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::consts::DATA_DESCRIPTOR_LENGTH;

    use futures_lite::future::block_on;
    use futures_lite::io::{AsyncReadExt, BufReader, Cursor};

    fn descriptor_for(data: &[u8]) -> Vec<u8> {
        let mut bytes = DATA_DESCRIPTOR_SIGNATURE.to_le_bytes().to_vec();
        bytes.extend_from_slice(&crc32fast::hash(data).to_le_bytes());
        bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        bytes
    }

    fn scan_all(stream: Vec<u8>) -> (Vec<u8>, DataDescriptor, u64) {
        // A one-byte buffer forces the scanner to work across refill boundaries.
        let mut reader = DescriptorScanReader::new(BufReader::with_capacity(1, Cursor::new(stream)), false, u64::MAX);
        let mut payload = Vec::new();
        block_on(reader.read_to_end(&mut payload)).unwrap();
        let descriptor = reader.descriptor().unwrap();
        (payload, descriptor, reader.emitted)
    }

    #[test]
    fn plain_payload() {
        let data = b"some stored bytes".to_vec();
        let mut stream = data.clone();
        stream.extend_from_slice(&descriptor_for(&data));
        stream.extend_from_slice(b"next header");

        let (payload, descriptor, emitted) = scan_all(stream);
        assert_eq!(payload, data);
        assert_eq!(emitted, data.len() as u64);
        assert_eq!(descriptor.crc, crc32fast::hash(&data));
    }

    #[test]
    fn empty_payload() {
        let (payload, descriptor, _) = scan_all(descriptor_for(&[]));
        assert!(payload.is_empty());
        assert_eq!(descriptor.uncompressed_size, 0);
    }

    #[test]
    fn signature_embedded_in_payload() {
        let mut data = b"prefix".to_vec();
        data.extend_from_slice(&DATA_DESCRIPTOR_SIGNATURE.to_le_bytes());
        data.extend_from_slice(&[0u8; DATA_DESCRIPTOR_LENGTH]);
        data.extend_from_slice(b"suffix");

        let mut stream = data.clone();
        stream.extend_from_slice(&descriptor_for(&data));

        let (payload, descriptor, _) = scan_all(stream);
        assert_eq!(payload, data);
        assert_eq!(descriptor.uncompressed_size, data.len() as u64);
    }

    #[test]
    fn does_not_consume_past_the_descriptor() {
        let data = b"bounded".to_vec();
        let mut stream = data.clone();
        stream.extend_from_slice(&descriptor_for(&data));
        stream.extend_from_slice(b"tail");

        let mut source = BufReader::with_capacity(1, Cursor::new(stream));
        {
            let mut reader = DescriptorScanReader::new(&mut source, false, u64::MAX);
            let mut payload = Vec::new();
            block_on(reader.read_to_end(&mut payload)).unwrap();
        }

        let mut rest = Vec::new();
        block_on(source.read_to_end(&mut rest)).unwrap();
        assert_eq!(rest, b"tail");
    }

    #[test]
    fn missing_descriptor_is_eof() {
        let mut reader = DescriptorScanReader::new(BufReader::new(Cursor::new(b"no trailer".to_vec())), false, u64::MAX);
        let mut payload = Vec::new();
        let err = block_on(reader.read_to_end(&mut payload)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn scan_bound_is_enforced() {
        let stream = vec![0u8; 64];

        let mut reader = DescriptorScanReader::new(BufReader::new(Cursor::new(stream)), false, 16);
        let mut payload = Vec::new();
        let err = block_on(reader.read_to_end(&mut payload)).unwrap_err();
        assert!(err.get_ref().is_some_and(|inner| inner.is::<ZipError>()));
    }
}
