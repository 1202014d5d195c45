// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use crate::error::{Result, ZipError};
use futures_lite::io::{AsyncRead, AsyncReadExt};

/// Read and return a dynamic length vector of bytes from a reader which impls AsyncRead.
#[tracing::instrument(skip(reader))]
pub(crate) async fn read_bytes(reader: impl AsyncRead + Unpin, length: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(length);
    reader.take(length as u64).read_to_end(&mut buffer).await?;

    if buffer.len() != length {
        return Err(ZipError::UnexpectedEof);
    }

    Ok(buffer)
}

macro_rules! read_int_helper {
    ($type:ty, $size:expr, $name:ident) => {
        #[tracing::instrument(skip(reader))]
        pub(crate) async fn $name(mut reader: impl AsyncRead + Unpin) -> Result<$type> {
            let mut buf = [0u8; $size];
            reader.read_exact(&mut buf).await?;
            Ok(<$type>::from_le_bytes(buf))
        }
    };
}

read_int_helper!(u32, 4, read_u32);
