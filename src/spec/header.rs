// Copyright (c) 2021-2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

/// The 26-byte fixed portion of a local file header, excluding the signature.
pub struct LocalFileHeader {
    pub version: u16,
    pub flags: GeneralPurposeFlag,
    pub compression: u16,
    pub mod_time: u16,
    pub mod_date: u16,
    pub crc: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

/// The general purpose bit flags, with the raw word retained alongside the decoded bits.
#[derive(Copy, Clone, Debug)]
pub struct GeneralPurposeFlag {
    pub raw: u16,
    pub encrypted: bool,
    pub data_descriptor: bool,
    pub filename_unicode: bool,
}

/// 2 byte header ids
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HeaderId(pub u16);

impl HeaderId {
    pub const ZIP64_EXTENDED_INFORMATION_EXTRA_FIELD: HeaderId = HeaderId(0x0001);
    pub const EXTENDED_TIMESTAMP_EXTRA_FIELD: HeaderId = HeaderId(0x5455);
    pub const NTFS_EXTRA_FIELD: HeaderId = HeaderId(0x000A);
    pub const INFO_ZIP_UNICODE_COMMENT_EXTRA_FIELD: HeaderId = HeaderId(0x6375);
    pub const INFO_ZIP_UNICODE_PATH_EXTRA_FIELD: HeaderId = HeaderId(0x7075);
}

impl From<u16> for HeaderId {
    fn from(value: u16) -> Self {
        HeaderId(value)
    }
}

impl From<HeaderId> for u16 {
    fn from(value: HeaderId) -> Self {
        value.0
    }
}

/// Represents each extra field.
/// Not strictly part of the spec, but is the most useful way to represent the data.
#[derive(Clone, Debug)]
pub enum ExtraField {
    Zip64ExtendedInformation(Zip64ExtendedInformationExtraField),
    ExtendedTimestamp(ExtendedTimestampExtraField),
    Ntfs(NtfsExtraField),
    InfoZipUnicodeComment(InfoZipUnicodeCommentExtraField),
    InfoZipUnicodePath(InfoZipUnicodePathExtraField),
    Unknown(UnknownExtraField),
}

impl ExtraField {
    /// Returns the header id of this extra field.
    pub fn header_id(&self) -> HeaderId {
        match self {
            ExtraField::Zip64ExtendedInformation(_) => HeaderId::ZIP64_EXTENDED_INFORMATION_EXTRA_FIELD,
            ExtraField::ExtendedTimestamp(_) => HeaderId::EXTENDED_TIMESTAMP_EXTRA_FIELD,
            ExtraField::Ntfs(_) => HeaderId::NTFS_EXTRA_FIELD,
            ExtraField::InfoZipUnicodeComment(_) => HeaderId::INFO_ZIP_UNICODE_COMMENT_EXTRA_FIELD,
            ExtraField::InfoZipUnicodePath(_) => HeaderId::INFO_ZIP_UNICODE_PATH_EXTRA_FIELD,
            ExtraField::Unknown(field) => field.header_id,
        }
    }
}

/// An extended information header for Zip64.
///
/// The size fields are only present when the corresponding 32-bit field in the local file header was saturated.
#[derive(Clone, Debug)]
pub struct Zip64ExtendedInformationExtraField {
    pub uncompressed_size: Option<u64>,
    pub compressed_size: Option<u64>,
}

/// The Info-ZIP extended timestamp field (0x5455), carrying unix times at one-second resolution.
///
/// Within a local file header all times indicated by the flags byte are present; the access and creation times are
/// retained but unused by this crate.
#[derive(Clone, Copy, Debug)]
pub struct ExtendedTimestampExtraField {
    pub flags: u8,
    pub mod_time: Option<i32>,
    pub access_time: Option<i32>,
    pub creation_time: Option<i32>,
}

/// The PKWARE NTFS field (0x000A), carrying times as 100ns intervals since 1601-01-01.
#[derive(Clone, Copy, Debug)]
pub struct NtfsExtraField {
    pub mod_time: u64,
    pub access_time: u64,
    pub creation_time: u64,
}

/// The Info-ZIP Unicode comment field (0x6375).
#[derive(Clone, Debug)]
pub enum InfoZipUnicodeCommentExtraField {
    V1 { crc32: u32, unicode: Vec<u8> },
    Unknown { version: u8, data: Vec<u8> },
}

/// The Info-ZIP Unicode path field (0x7075).
#[derive(Clone, Debug)]
pub enum InfoZipUnicodePathExtraField {
    V1 { crc32: u32, unicode: Vec<u8> },
    Unknown { version: u8, data: Vec<u8> },
}

/// Represents any unparsed extra field.
#[derive(Clone, Debug)]
pub struct UnknownExtraField {
    pub header_id: HeaderId,
    pub data_size: u16,
    pub content: Vec<u8>,
}
