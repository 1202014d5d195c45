// Copyright (c) 2021-2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use crate::date::ZipDateTime;
use crate::spec::compression::Compression;
use crate::spec::header::ExtraField;
use crate::string::ZipString;

#[cfg(feature = "chrono")]
use chrono::{DateTime, Utc};

/// Seconds between 1601-01-01 (the NTFS epoch) and 1970-01-01.
#[cfg(feature = "chrono")]
const NTFS_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

/// An immutable store of data about a ZIP entry, parsed from its local file header.
///
/// For an entry written with a data descriptor, the CRC and both sizes are zero until the entry's data has been fully
/// consumed and the trailing descriptor read; the finished entry handed back by the stream reader carries the
/// recovered values.
#[derive(Clone)]
pub struct ZipEntry {
    pub(crate) filename: ZipString,
    pub(crate) compression: Compression,
    pub(crate) version: u16,
    pub(crate) flags: u16,
    pub(crate) data_descriptor: bool,
    pub(crate) crc32: u32,
    pub(crate) uncompressed_size: u64,
    pub(crate) compressed_size: u64,
    pub(crate) last_modification_date: ZipDateTime,
    pub(crate) extra_fields: Vec<ExtraField>,
    pub(crate) comment: ZipString,
}

impl ZipEntry {
    /// Returns the entry's filename.
    ///
    /// # Note
    /// This will return the raw filename stored during ZIP creation. If calling this method on entries retrieved from
    /// untrusted ZIP files, the filename should be sanitised before being used as a path to prevent [directory
    /// traversal attacks](https://en.wikipedia.org/wiki/Directory_traversal_attack).
    pub fn filename(&self) -> &ZipString {
        &self.filename
    }

    /// Returns whether or not the entry represents a directory.
    pub fn dir(&self) -> bool {
        self.filename.as_bytes().ends_with(b"/")
    }

    /// Returns the entry's compression method.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Returns the minimum version needed to extract the entry.
    pub fn version_needed(&self) -> u16 {
        self.version
    }

    /// Returns the entry's general purpose bit flags as stored.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Returns whether or not the entry is followed by a data descriptor.
    pub fn data_descriptor(&self) -> bool {
        self.data_descriptor
    }

    /// Returns the entry's CRC32 value.
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Returns the entry's uncompressed size.
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Returns the entry's compressed size.
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Returns the entry's last modification date & time as stored in the header's MS-DOS fields.
    pub fn last_modification_date(&self) -> &ZipDateTime {
        &self.last_modification_date
    }

    /// Returns the entry's last modification time at the best resolution available.
    ///
    /// An NTFS extra field (100ns resolution) is preferred over an extended timestamp extra field (one second), which
    /// in turn is preferred over the MS-DOS fields (two seconds, no timezone).
    ///
    /// Note that this requires the `chrono` feature.
    #[cfg(feature = "chrono")]
    pub fn modified(&self) -> DateTime<Utc> {
        for field in &self.extra_fields {
            if let ExtraField::Ntfs(ntfs) = field {
                let secs = (ntfs.mod_time / 10_000_000) as i64 - NTFS_UNIX_OFFSET_SECS;
                let nanos = (ntfs.mod_time % 10_000_000) as u32 * 100;
                if let Some(date) = DateTime::from_timestamp(secs, nanos) {
                    return date;
                }
            }
        }

        for field in &self.extra_fields {
            if let ExtraField::ExtendedTimestamp(timestamp) = field {
                if let Some(mod_time) = timestamp.mod_time {
                    if let Some(date) = DateTime::from_timestamp(mod_time.into(), 0) {
                        return date;
                    }
                }
            }
        }

        self.last_modification_date.as_chrono().single().unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Returns the entry's extra fields.
    pub fn extra_fields(&self) -> &[ExtraField] {
        &self.extra_fields
    }

    /// Returns the entry's file comment.
    ///
    /// The local file header carries no comment field, so this is only non-empty when a Unicode comment extra field
    /// was present.
    pub fn comment(&self) -> &ZipString {
        &self.comment
    }
}
