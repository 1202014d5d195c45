// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! A ZIP reader which acts over a non-seekable source, using tokio's IO types.
//!
//! Constructed via [`ZipFileReader::with_tokio()`]; all transitions are those of the base reader.
//!
//! [`ZipFileReader::with_tokio()`]: crate::base::read::stream::ZipFileReader::with_tokio
//!
//! # Example
//! ```no_run
//! # use zipstream::base::read::stream::ZipFileReader;
//! # use zipstream::error::Result;
//! # use tokio::io::BufReader;
//! #
//! # async fn run() -> Result<()> {
//! let file = tokio::fs::File::open("./Archive.zip").await?;
//! let mut zip = ZipFileReader::with_tokio(BufReader::new(file));
//!
//! while let Some(entry) = zip.next_with_entry().await? {
//!     println!("File: {}", entry.reader().entry().filename().as_str().unwrap());
//!     (_, zip) = entry.skip().await?;
//! }
//! #
//! #     Ok(())
//! # }
//! ```

use crate::base::read::counting::Counting;

use tokio_util::compat::Compat;

/// The base reader's `Ready` typestate, specialised for a wrapped tokio reader.
pub type Ready<R> = crate::base::read::stream::Ready<Counting<Compat<R>>>;

/// The base reader's `Reading` typestate, specialised for a wrapped tokio reader.
pub type Reading<R, E> = crate::base::read::stream::Reading<Counting<Compat<R>>, E>;
