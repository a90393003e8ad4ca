//! A streaming `multipart/form-data` body encoder
//!
//! This crate builds a `multipart/form-data` request body part by part from
//! in-memory fields, byte buffers, arbitrary readers and files on disk, and exposes
//! the result as one lazily produced byte stream. Nothing is buffered beyond the
//! headers of each part: readers and files are pulled only while the body is read.
//!
//! # Features
//!
//! - Plain fields, in-memory files, reader backed files and files opened from disk
//! - Cryptographically random boundaries
//! - Synchronous [`std::io::Read`] and chunked [`http_body::Body`] read surfaces
//! - Deterministic release of the files the body opened
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//! use micro_multipart::Multipart;
//!
//! let mut multipart = Multipart::new();
//! multipart.add_field("title", "holiday").unwrap();
//! multipart.add_bytes_with_type("photo", "beach.png", &mime::IMAGE_PNG, b"\x89PNG").unwrap();
//! multipart.finalize().unwrap();
//!
//! let content_type = multipart.content_type().unwrap();
//! assert!(content_type.to_str().unwrap().starts_with("multipart/form-data; boundary="));
//!
//! let mut body = Vec::new();
//! multipart.read_to_end(&mut body).unwrap();
//! assert!(body.ends_with(b"--\r\n"));
//! ```
//!
//! # Architecture
//!
//! - [`Boundary`]: generation and validation of the delimiter token
//! - [`Multipart`]: the ordered part registry and the read state machine over it
//! - [`Resource`]: handles owned by a body and released when it is exhausted
//! - [`MultipartError`]: every failure the encoder reports
//!
//! # Lifecycle
//!
//! A body is created empty, parts are added in any order, and [`Multipart::finalize`]
//! appends the closing delimiter. Only a finalized body can be read; reading before
//! that fails with [`MultipartError::NotReady`]. The body is read forward only.
//! When the last byte has been produced every owned resource is released;
//! [`Multipart::close`] releases them early for a body that will not be read to the end.
//!
//! # Limitations
//!
//! - Field names and filenames are written verbatim, without escaping quotes or line breaks
//! - A body needs exclusive access while it is read

mod boundary;
mod error;
mod multipart;
mod part;
mod resource;

pub use boundary::Boundary;
pub use error::MultipartError;
pub use multipart::Multipart;
pub use resource::Resource;

mod utils;
pub(crate) use utils::ensure;
