// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! Helpers which write raw archive bytes so that tests have full control over every record and field.

#![allow(dead_code)]

use std::io::Write;

pub const STORED: u16 = 0;
pub const DEFLATE: u16 = 8;

pub const FLAG_DATA_DESCRIPTOR: u16 = 0x8;
pub const FLAG_UTF8: u16 = 0x800;

pub const LFH_SIGNATURE: u32 = 0x04034b50;
pub const CDH_SIGNATURE: u32 = 0x02014b50;
pub const EOCDR_SIGNATURE: u32 = 0x06054b50;
pub const DD_SIGNATURE: u32 = 0x08074b50;

pub const INFO_ZIP_UNICODE_PATH: u16 = 0x7075;
pub const INFO_ZIP_UNICODE_COMMENT: u16 = 0x6375;

// 2024-03-02 12:34:56 in MS-DOS representation.
pub const DOS_DATE: u16 = ((44 << 9) | (3 << 5) | 2) as u16;
pub const DOS_TIME: u16 = ((12 << 11) | (34 << 5) | (56 >> 1)) as u16;

/// Encodes a version-1 Info-ZIP Unicode path or comment extra field.
pub fn unicode_extra_field(header_id: u16, crc: u32, unicode: &str) -> Vec<u8> {
    let mut extra = Vec::new();
    extra.extend_from_slice(&header_id.to_le_bytes());
    extra.extend_from_slice(&((5 + unicode.len()) as u16).to_le_bytes());
    extra.push(1);
    extra.extend_from_slice(&crc.to_le_bytes());
    extra.extend_from_slice(unicode.as_bytes());
    extra
}

/// Compresses `data` as a raw deflate stream.
pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Every field of a local entry, so tests can write lying headers as easily as honest ones.
pub struct RawEntry {
    pub name: Vec<u8>,
    pub flags: u16,
    pub method: u16,
    pub crc: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub extra: Vec<u8>,
    pub body: Vec<u8>,
}

#[derive(Default)]
pub struct ArchiveBuilder {
    bytes: Vec<u8>,
    central: Vec<u8>,
    entries: u16,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry with its sizes and CRC declared in the local file header.
    pub fn entry(mut self, name: &str, data: &[u8], method: u16) -> Self {
        let body = match method {
            STORED => data.to_vec(),
            DEFLATE => deflate(data),
            other => panic!("no writer support for method {other}"),
        };

        self.push(RawEntry {
            name: name.as_bytes().to_vec(),
            flags: 0,
            method,
            crc: crc32fast::hash(data),
            compressed_size: body.len() as u32,
            uncompressed_size: data.len() as u32,
            extra: Vec::new(),
            body,
        });
        self
    }

    /// Appends an entry with zeroed header sizes and a trailing data descriptor.
    pub fn descriptor_entry(mut self, name: &str, data: &[u8], method: u16, signature: bool) -> Self {
        let mut body = match method {
            STORED => data.to_vec(),
            DEFLATE => deflate(data),
            other => panic!("no writer support for method {other}"),
        };
        let compressed_len = body.len() as u32;

        if signature {
            body.extend_from_slice(&DD_SIGNATURE.to_le_bytes());
        }
        body.extend_from_slice(&crc32fast::hash(data).to_le_bytes());
        body.extend_from_slice(&compressed_len.to_le_bytes());
        body.extend_from_slice(&(data.len() as u32).to_le_bytes());

        self.push(RawEntry {
            name: name.as_bytes().to_vec(),
            flags: FLAG_DATA_DESCRIPTOR,
            method,
            crc: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            extra: Vec::new(),
            body,
        });
        self
    }

    /// Appends an entry with saturated 32-bit sizes, a zip64 extra field, and a 20-byte trailing descriptor.
    pub fn zip64_descriptor_entry(mut self, name: &str, data: &[u8], method: u16) -> Self {
        let mut body = match method {
            STORED => data.to_vec(),
            DEFLATE => deflate(data),
            other => panic!("no writer support for method {other}"),
        };
        let compressed_len = body.len() as u64;

        body.extend_from_slice(&DD_SIGNATURE.to_le_bytes());
        body.extend_from_slice(&crc32fast::hash(data).to_le_bytes());
        body.extend_from_slice(&compressed_len.to_le_bytes());
        body.extend_from_slice(&(data.len() as u64).to_le_bytes());

        let mut extra = Vec::new();
        extra.extend_from_slice(&0x0001u16.to_le_bytes());
        extra.extend_from_slice(&16u16.to_le_bytes());
        extra.extend_from_slice(&0u64.to_le_bytes());
        extra.extend_from_slice(&0u64.to_le_bytes());

        self.push(RawEntry {
            name: name.as_bytes().to_vec(),
            flags: FLAG_DATA_DESCRIPTOR,
            method,
            crc: 0,
            compressed_size: 0xFFFFFFFF,
            uncompressed_size: 0xFFFFFFFF,
            extra,
            body,
        });
        self
    }

    /// Appends an entry with saturated 32-bit sizes resolved by a zip64 extra field.
    pub fn zip64_entry(mut self, name: &str, data: &[u8]) -> Self {
        let mut extra = Vec::new();
        extra.extend_from_slice(&0x0001u16.to_le_bytes());
        extra.extend_from_slice(&16u16.to_le_bytes());
        extra.extend_from_slice(&(data.len() as u64).to_le_bytes());
        extra.extend_from_slice(&(data.len() as u64).to_le_bytes());

        self.push(RawEntry {
            name: name.as_bytes().to_vec(),
            flags: 0,
            method: STORED,
            crc: crc32fast::hash(data),
            compressed_size: 0xFFFFFFFF,
            uncompressed_size: 0xFFFFFFFF,
            extra,
            body: data.to_vec(),
        });
        self
    }

    /// Appends a directory entry.
    pub fn directory(mut self, name: &str) -> Self {
        assert!(name.ends_with('/'));

        self.push(RawEntry {
            name: name.as_bytes().to_vec(),
            flags: 0,
            method: STORED,
            crc: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            extra: Vec::new(),
            body: Vec::new(),
        });
        self
    }

    /// Appends a fully caller-specified entry.
    pub fn push_raw(mut self, entry: RawEntry) -> Self {
        self.push(entry);
        self
    }

    fn push(&mut self, entry: RawEntry) {
        let offset = self.bytes.len() as u32;

        self.bytes.extend_from_slice(&LFH_SIGNATURE.to_le_bytes());
        self.bytes.extend_from_slice(&20u16.to_le_bytes());
        self.bytes.extend_from_slice(&entry.flags.to_le_bytes());
        self.bytes.extend_from_slice(&entry.method.to_le_bytes());
        self.bytes.extend_from_slice(&DOS_TIME.to_le_bytes());
        self.bytes.extend_from_slice(&DOS_DATE.to_le_bytes());
        self.bytes.extend_from_slice(&entry.crc.to_le_bytes());
        self.bytes.extend_from_slice(&entry.compressed_size.to_le_bytes());
        self.bytes.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
        self.bytes.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        self.bytes.extend_from_slice(&(entry.extra.len() as u16).to_le_bytes());
        self.bytes.extend_from_slice(&entry.name);
        self.bytes.extend_from_slice(&entry.extra);
        self.bytes.extend_from_slice(&entry.body);

        // The matching central directory record; only its signature matters to the reader, but writing the whole
        // record keeps the archives valid for other tooling.
        self.central.extend_from_slice(&CDH_SIGNATURE.to_le_bytes());
        self.central.extend_from_slice(&20u16.to_le_bytes());
        self.central.extend_from_slice(&20u16.to_le_bytes());
        self.central.extend_from_slice(&entry.flags.to_le_bytes());
        self.central.extend_from_slice(&entry.method.to_le_bytes());
        self.central.extend_from_slice(&DOS_TIME.to_le_bytes());
        self.central.extend_from_slice(&DOS_DATE.to_le_bytes());
        self.central.extend_from_slice(&entry.crc.to_le_bytes());
        self.central.extend_from_slice(&entry.compressed_size.to_le_bytes());
        self.central.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
        self.central.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        self.central.extend_from_slice(&0u16.to_le_bytes());
        self.central.extend_from_slice(&0u16.to_le_bytes());
        self.central.extend_from_slice(&0u16.to_le_bytes());
        self.central.extend_from_slice(&0u16.to_le_bytes());
        self.central.extend_from_slice(&0u32.to_le_bytes());
        self.central.extend_from_slice(&offset.to_le_bytes());
        self.central.extend_from_slice(&entry.name);

        self.entries += 1;
    }

    /// Appends the central directory and EOCDR, returning the completed archive.
    pub fn build(self) -> Vec<u8> {
        let mut bytes = self.bytes;
        let central_offset = bytes.len() as u32;

        bytes.extend_from_slice(&self.central);

        bytes.extend_from_slice(&EOCDR_SIGNATURE.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&self.entries.to_le_bytes());
        bytes.extend_from_slice(&self.entries.to_le_bytes());
        bytes.extend_from_slice(&(self.central.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&central_offset.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());

        bytes
    }
}
