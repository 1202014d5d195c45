// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use crate::error::Result;
use crate::spec::consts::{DATA_DESCRIPTOR_LENGTH, DATA_DESCRIPTOR_SIGNATURE, ZIP64_DATA_DESCRIPTOR_LENGTH};

use futures_lite::io::{AsyncRead, AsyncReadExt};

/// A data descriptor, normalised to 64-bit sizes.
///
/// The wire layout is either 12 or 20 bytes (32-bit or zip64 sizes) and may or may not be prefixed with the optional
/// `0x08074b50` signature, giving four accepted combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDescriptor {
    pub crc: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

impl DataDescriptor {
    /// Returns the length of the descriptor's fields, excluding the optional signature.
    pub(crate) fn field_length(zip64: bool) -> usize {
        if zip64 {
            ZIP64_DATA_DESCRIPTOR_LENGTH
        } else {
            DATA_DESCRIPTOR_LENGTH
        }
    }

    /// Parses descriptor fields (signature already stripped, if any) from a buffer of `field_length` bytes.
    pub(crate) fn from_field_bytes(data: &[u8], zip64: bool) -> Self {
        let crc = u32::from_le_bytes(data[0..4].try_into().unwrap());

        let (compressed_size, uncompressed_size) = if zip64 {
            (
                u64::from_le_bytes(data[4..12].try_into().unwrap()),
                u64::from_le_bytes(data[12..20].try_into().unwrap()),
            )
        } else {
            (
                u32::from_le_bytes(data[4..8].try_into().unwrap()).into(),
                u32::from_le_bytes(data[8..12].try_into().unwrap()).into(),
            )
        };

        DataDescriptor { crc, compressed_size, uncompressed_size }
    }

    /// Reads a data descriptor which directly follows an entry's data.
    ///
    /// Whether the optional signature is present is decided against `running`, the values observed while reading the
    /// entry: a signature-less descriptor whose CRC happens to equal the signature is only accepted when it matches
    /// those values outright. No bytes beyond the descriptor itself are consumed.
    pub(crate) async fn from_reader<R>(reader: &mut R, zip64: bool, running: &DataDescriptor) -> Result<DataDescriptor>
    where
        R: AsyncRead + Unpin,
    {
        let length = Self::field_length(zip64);
        let mut buffer = [0u8; ZIP64_DATA_DESCRIPTOR_LENGTH];
        reader.read_exact(&mut buffer[..length]).await?;

        if u32::from_le_bytes(buffer[0..4].try_into().unwrap()) != DATA_DESCRIPTOR_SIGNATURE {
            return Ok(Self::from_field_bytes(&buffer[..length], zip64));
        }

        let unprefixed = Self::from_field_bytes(&buffer[..length], zip64);
        if unprefixed == *running {
            return Ok(unprefixed);
        }

        let mut trailing = [0u8; 4];
        reader.read_exact(&mut trailing).await?;
        buffer.copy_within(4..length, 0);
        buffer[length - 4..length].copy_from_slice(&trailing);

        Ok(Self::from_field_bytes(&buffer[..length], zip64))
    }
}
