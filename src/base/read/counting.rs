// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_lite::io::{AsyncBufRead, AsyncRead};
use pin_project::pin_project;

/// A wrapping reader which tracks the absolute offset of bytes consumed from the source.
///
/// The offset is what positions entries within the stream: the compressed length of an entry whose size is only
/// declared by a trailing data descriptor is the distance the offset moved while its data was read.
#[pin_project]
pub struct Counting<R> {
    #[pin]
    inner: R,
    bytes_read: u64,
}

impl<R> Counting<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, bytes_read: 0 }
    }

    /// Returns the number of bytes consumed from the underlying reader so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Consumes this reader and returns the inner value.
    pub(crate) fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> AsyncRead for Counting<R>
where
    R: AsyncRead + Unpin,
{
    fn poll_read(self: Pin<&mut Self>, c: &mut Context<'_>, b: &mut [u8]) -> Poll<std::io::Result<usize>> {
        let project = self.project();
        let read = ready!(project.inner.poll_read(c, b))?;
        *project.bytes_read += read as u64;

        Poll::Ready(Ok(read))
    }
}

impl<R> AsyncBufRead for Counting<R>
where
    R: AsyncBufRead + Unpin,
{
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<&[u8]>> {
        self.project().inner.poll_fill_buf(cx)
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        let project = self.project();
        project.inner.consume(amt);
        *project.bytes_read += amt as u64;
    }
}
