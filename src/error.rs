// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! A module which holds relevant error reporting structures/types.

use thiserror::Error;

/// A Result type alias over ZipError to minimise repetition.
pub type Result<V> = std::result::Result<V, ZipError>;

/// An enum of possible errors and their descriptions.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ZipError {
    #[error("encountered an unexpected header (actual: {0:#x}, expected: {1:#x})")]
    UnexpectedHeaderError(u32, u32),
    #[error("the source ended before the current record was complete")]
    UnexpectedEof,
    #[error("compression type {0} is not supported")]
    CompressionNotSupported(u16),
    #[error("feature not supported: '{0}'")]
    FeatureNotSupported(&'static str),
    #[error("a computed CRC32 value did not match the expected value")]
    CRC32CheckError,
    #[error("a size field did not match the number of bytes consumed (expected: {0}, actual: {1})")]
    SizeCheckError(u64, u64),
    #[error("extra field size was indicated to be {0} but only {1} bytes remain")]
    InvalidExtraFieldLength(u16, u16),
    #[error("zip64 extended information field was incomplete")]
    Zip64ExtendedFieldIncomplete,
    #[error("unable to locate the data descriptor within the scan bound")]
    UnableToLocateDataDescriptor,
    #[error("end of file has not been reached")]
    EOFNotReached,
    #[error("attempted to convert non-UTF8 bytes to a string/str")]
    StringNotUtf8,
    #[error("an upstream reader returned an error: {0}")]
    UpstreamReadError(std::io::Error),
}

impl From<std::io::Error> for ZipError {
    fn from(value: std::io::Error) -> Self {
        if value.kind() == std::io::ErrorKind::UnexpectedEof {
            return ZipError::UnexpectedEof;
        }

        match value.downcast::<ZipError>() {
            Ok(inner) => inner,
            Err(value) => ZipError::UpstreamReadError(value),
        }
    }
}
