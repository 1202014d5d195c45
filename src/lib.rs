// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! An asynchronous ZIP archive reader with a heavy focus on streaming support.
//!
//! ## Features
//! - Decodes archives from a forward-only source; no seeking, no central directory.
//! - Entries are yielded in the order they appear in the stream, with their data exposed as an `AsyncRead`.
//! - Support for the Stored and Deflate compression methods.
//! - Support for data descriptors (including the Stored + descriptor combination), ZIP64 sizes, and the extended
//!   timestamp, NTFS, and Info-ZIP Unicode extra fields.
//! - Aims for reasonable [specification](https://pkware.cachefly.net/webdocs/casestudies/APPNOTE.TXT) compliance.
//!
//! [Read more.](https://github.com/Majored/rs-async-zip)

pub mod base;
pub mod error;

#[cfg(feature = "tokio")]
pub mod tokio;

pub(crate) mod date;
pub(crate) mod entry;
pub(crate) mod spec;
pub(crate) mod string;
pub(crate) mod utils;

pub use crate::spec::compression::Compression;
pub use crate::spec::data_descriptor::DataDescriptor;
pub use crate::spec::header::{
    ExtendedTimestampExtraField, ExtraField, HeaderId, InfoZipUnicodeCommentExtraField, InfoZipUnicodePathExtraField,
    NtfsExtraField, UnknownExtraField, Zip64ExtendedInformationExtraField,
};

pub use crate::date::{builder::ZipDateTimeBuilder, ZipDateTime};
pub use crate::entry::ZipEntry;
pub use crate::string::{StringEncoding, ZipString};
