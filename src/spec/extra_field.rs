// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use crate::error::{Result as ZipResult, ZipError};
use crate::spec::consts::NON_ZIP64_MAX_SIZE;
use crate::spec::header::{
    ExtendedTimestampExtraField, ExtraField, HeaderId, InfoZipUnicodeCommentExtraField, InfoZipUnicodePathExtraField,
    NtfsExtraField, UnknownExtraField, Zip64ExtendedInformationExtraField,
};

/// Parse a zip64 extra field from bytes.
/// The content of "data" should exclude the header.
///
/// The size fields are stored positionally and only for header fields which were saturated, so the 32-bit header
/// values are needed to know which of them are present.
fn zip64_extended_information_field_from_bytes(
    data: &[u8],
    uncompressed_size: u32,
    compressed_size: u32,
) -> ZipResult<Zip64ExtendedInformationExtraField> {
    let mut cursor = 0;
    let mut field = Zip64ExtendedInformationExtraField { uncompressed_size: None, compressed_size: None };

    if uncompressed_size == NON_ZIP64_MAX_SIZE {
        field.uncompressed_size = Some(read_u64(data, &mut cursor)?);
    }
    if compressed_size == NON_ZIP64_MAX_SIZE {
        field.compressed_size = Some(read_u64(data, &mut cursor)?);
    }

    // Any remaining portion (header offset, disk start number) only occurs within the central directory.
    Ok(field)
}

fn extended_timestamp_field_from_bytes(data: &[u8]) -> ZipResult<ExtendedTimestampExtraField> {
    let Some((&flags, mut rest)) = data.split_first() else {
        return Err(ZipError::InvalidExtraFieldLength(1, 0));
    };

    let mut times = [None; 3];
    for (index, time) in times.iter_mut().enumerate() {
        if flags & (1 << index) != 0 {
            // A trailing time indicated by the flags byte may be omitted from a local file header regardless.
            if let Some((bytes, remainder)) = rest.split_first_chunk::<4>() {
                *time = Some(i32::from_le_bytes(*bytes));
                rest = remainder;
            }
        }
    }

    Ok(ExtendedTimestampExtraField {
        flags,
        mod_time: times[0],
        access_time: times[1],
        creation_time: times[2],
    })
}

fn ntfs_field_from_bytes(data: &[u8]) -> Option<NtfsExtraField> {
    // Four reserved bytes, then (tag, size) attributes. Only attribute 0x0001 is defined.
    let mut rest = data.get(4..)?;

    while rest.len() >= 4 {
        let tag = u16::from_le_bytes(rest[0..2].try_into().unwrap());
        let size = u16::from_le_bytes(rest[2..4].try_into().unwrap()) as usize;
        let attribute = rest.get(4..4 + size)?;

        if tag == 0x0001 && size >= 24 {
            return Some(NtfsExtraField {
                mod_time: u64::from_le_bytes(attribute[0..8].try_into().unwrap()),
                access_time: u64::from_le_bytes(attribute[8..16].try_into().unwrap()),
                creation_time: u64::from_le_bytes(attribute[16..24].try_into().unwrap()),
            });
        }

        rest = &rest[4 + size..];
    }

    None
}

fn info_zip_unicode_comment_field_from_bytes(data: &[u8]) -> ZipResult<InfoZipUnicodeCommentExtraField> {
    let Some((&version, rest)) = data.split_first() else {
        return Err(ZipError::InvalidExtraFieldLength(1, 0));
    };

    if version == 1 {
        let Some((crc32, unicode)) = rest.split_first_chunk::<4>() else {
            return Err(ZipError::InvalidExtraFieldLength(5, data.len() as u16));
        };
        Ok(InfoZipUnicodeCommentExtraField::V1 { crc32: u32::from_le_bytes(*crc32), unicode: unicode.to_vec() })
    } else {
        Ok(InfoZipUnicodeCommentExtraField::Unknown { version, data: rest.to_vec() })
    }
}

fn info_zip_unicode_path_field_from_bytes(data: &[u8]) -> ZipResult<InfoZipUnicodePathExtraField> {
    let Some((&version, rest)) = data.split_first() else {
        return Err(ZipError::InvalidExtraFieldLength(1, 0));
    };

    if version == 1 {
        let Some((crc32, unicode)) = rest.split_first_chunk::<4>() else {
            return Err(ZipError::InvalidExtraFieldLength(5, data.len() as u16));
        };
        Ok(InfoZipUnicodePathExtraField::V1 { crc32: u32::from_le_bytes(*crc32), unicode: unicode.to_vec() })
    } else {
        Ok(InfoZipUnicodePathExtraField::Unknown { version, data: rest.to_vec() })
    }
}

fn read_u64(data: &[u8], cursor: &mut usize) -> ZipResult<u64> {
    let Some(bytes) = data.get(*cursor..*cursor + 8) else {
        return Err(ZipError::Zip64ExtendedFieldIncomplete);
    };
    *cursor += 8;
    Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
}

pub(crate) fn extra_field_from_bytes(
    header_id: HeaderId,
    data_size: u16,
    data: &[u8],
    uncompressed_size: u32,
    compressed_size: u32,
) -> ZipResult<ExtraField> {
    match header_id {
        HeaderId::ZIP64_EXTENDED_INFORMATION_EXTRA_FIELD => Ok(ExtraField::Zip64ExtendedInformation(
            zip64_extended_information_field_from_bytes(data, uncompressed_size, compressed_size)?,
        )),
        HeaderId::EXTENDED_TIMESTAMP_EXTRA_FIELD => {
            Ok(ExtraField::ExtendedTimestamp(extended_timestamp_field_from_bytes(data)?))
        }
        HeaderId::NTFS_EXTRA_FIELD => match ntfs_field_from_bytes(data) {
            Some(field) => Ok(ExtraField::Ntfs(field)),
            None => Ok(ExtraField::Unknown(UnknownExtraField { header_id, data_size, content: data.to_vec() })),
        },
        HeaderId::INFO_ZIP_UNICODE_COMMENT_EXTRA_FIELD => {
            Ok(ExtraField::InfoZipUnicodeComment(info_zip_unicode_comment_field_from_bytes(data)?))
        }
        HeaderId::INFO_ZIP_UNICODE_PATH_EXTRA_FIELD => {
            Ok(ExtraField::InfoZipUnicodePath(info_zip_unicode_path_field_from_bytes(data)?))
        }
        header_id => Ok(ExtraField::Unknown(UnknownExtraField { header_id, data_size, content: data.to_vec() })),
    }
}
