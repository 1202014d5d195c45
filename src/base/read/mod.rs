// Copyright (c) 2022-2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! A module which supports reading ZIP files.

pub mod counting;
pub mod stream;

pub(crate) mod io;

// Re-exported as part of the public API.
pub use crate::base::read::io::entry::WithEntry;
pub use crate::base::read::io::entry::WithoutEntry;
pub use crate::base::read::io::entry::ZipEntryReader;

use crate::date::ZipDateTime;
use crate::entry::ZipEntry;
use crate::error::{Result, ZipError};
use crate::spec::compression::Compression;
use crate::spec::consts::{CDH_SIGNATURE, EOCDR_SIGNATURE, LFH_SIGNATURE, NON_ZIP64_MAX_SIZE};
use crate::spec::header::InfoZipUnicodeCommentExtraField;
use crate::spec::header::InfoZipUnicodePathExtraField;
use crate::spec::header::{ExtraField, LocalFileHeader, Zip64ExtendedInformationExtraField};
use crate::spec::parse::parse_extra_fields;
use crate::string::{StringEncoding, ZipString};

use futures_lite::io::AsyncRead;

pub(crate) fn get_zip64_extra_field(extra_fields: &[ExtraField]) -> Option<&Zip64ExtendedInformationExtraField> {
    for field in extra_fields {
        if let ExtraField::Zip64ExtendedInformation(zip64field) = field {
            return Some(zip64field);
        }
    }
    None
}

fn get_combined_sizes(
    uncompressed_size: u32,
    compressed_size: u32,
    extra_field: &Option<&Zip64ExtendedInformationExtraField>,
) -> Result<(u64, u64)> {
    let mut uncompressed_size = uncompressed_size as u64;
    let mut compressed_size = compressed_size as u64;

    if let Some(extra_field) = extra_field {
        if let Some(size) = extra_field.uncompressed_size {
            uncompressed_size = size;
        }
        if let Some(size) = extra_field.compressed_size {
            compressed_size = size;
        }
    } else if uncompressed_size == NON_ZIP64_MAX_SIZE as u64 || compressed_size == NON_ZIP64_MAX_SIZE as u64 {
        // A saturated size field promises a zip64 extra field carrying the real value.
        return Err(ZipError::Zip64ExtendedFieldIncomplete);
    }

    Ok((uncompressed_size, compressed_size))
}

/// Parses the next record in the stream as a local file header, or signals the end of the entry sequence if the
/// central directory (or, for an archive with no entries at all, the EOCDR) has been reached instead.
pub(crate) async fn lfh<R>(mut reader: R) -> Result<Option<ZipEntry>>
where
    R: AsyncRead + Unpin,
{
    let signature = crate::utils::read_u32(&mut reader).await?;
    match signature {
        actual if actual == LFH_SIGNATURE => (),
        actual if actual == CDH_SIGNATURE || actual == EOCDR_SIGNATURE => return Ok(None),
        actual => return Err(ZipError::UnexpectedHeaderError(actual, LFH_SIGNATURE)),
    };

    let header = LocalFileHeader::from_reader(&mut reader).await?;

    if header.flags.encrypted {
        return Err(ZipError::FeatureNotSupported("encryption"));
    }

    let filename_basic = crate::utils::read_bytes(&mut reader, header.file_name_length.into()).await?;
    let compression = Compression::try_from(header.compression)?;
    let extra_field = crate::utils::read_bytes(&mut reader, header.extra_field_length.into()).await?;
    let extra_fields = parse_extra_fields(extra_field, header.uncompressed_size, header.compressed_size)?;

    let zip64_extra_field = get_zip64_extra_field(&extra_fields);
    let (uncompressed_size, compressed_size) =
        get_combined_sizes(header.uncompressed_size, header.compressed_size, &zip64_extra_field)?;

    let filename = detect_filename(filename_basic, header.flags.filename_unicode, extra_fields.as_ref());
    let comment = detect_comment(extra_fields.as_ref());

    let entry = ZipEntry {
        filename,
        compression,
        version: header.version,
        flags: header.flags.raw,
        data_descriptor: header.flags.data_descriptor,
        crc32: header.crc,
        uncompressed_size,
        compressed_size,
        last_modification_date: ZipDateTime::from_raw(header.mod_date, header.mod_time),
        extra_fields,
        comment,
    };

    Ok(Some(entry))
}

fn detect_comment(extra_fields: &[ExtraField]) -> ZipString {
    // A local file header carries no comment field of its own, so the extra's CRC has no basic bytes to be held
    // against; a version-1 field is the only source there is and is taken as authoritative.
    let unicode_extra = extra_fields.iter().find_map(|field| match field {
        ExtraField::InfoZipUnicodeComment(InfoZipUnicodeCommentExtraField::V1 { unicode, .. }) => {
            Some(std::string::String::from_utf8(unicode.clone()))
        }
        _ => None,
    });

    match unicode_extra {
        Some(Ok(s)) => s.into(),
        _ => ZipString::new(Vec::new(), StringEncoding::Utf8),
    }
}

fn detect_filename(basic: Vec<u8>, basic_is_utf8: bool, extra_fields: &[ExtraField]) -> ZipString {
    if basic_is_utf8 {
        ZipString::new(basic, StringEncoding::Utf8)
    } else {
        let unicode_extra = extra_fields.iter().find_map(|field| match field {
            ExtraField::InfoZipUnicodePath(InfoZipUnicodePathExtraField::V1 { crc32, unicode }) => {
                if *crc32 == crc32fast::hash(&basic) {
                    Some(std::string::String::from_utf8(unicode.clone()))
                } else {
                    None
                }
            }
            _ => None,
        });
        if let Some(Ok(s)) = unicode_extra {
            ZipString::new_with_alternative(s, basic)
        } else {
            // Do not treat as UTF-8 if UTF-8 flags are not set,
            // some string in MBCS may be valid UTF-8 in form, but they are not in truth.
            if basic.is_ascii() {
                // SAFETY:
                // a valid ASCII string is always a valid UTF-8 string
                unsafe { std::string::String::from_utf8_unchecked(basic).into() }
            } else {
                ZipString::new(basic, StringEncoding::Raw)
            }
        }
    }
}
