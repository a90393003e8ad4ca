//! Parts of a multipart body.
//!
//! - [`header`]: encoding of the delimiter line and header block of one part
//! - [`source`]: the lazy byte producers that hold each part's framed bytes

pub(crate) mod header;
pub(crate) mod source;

pub(crate) use header::PartHead;
pub(crate) use source::PartSource;
