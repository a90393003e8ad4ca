//! Boundary generation and validation.
//!
//! A boundary separates the parts of a `multipart/form-data` body and marks its end.
//! Generated boundaries are 30 bytes drawn from the operating system's secure random
//! source, hex encoded into a 60 character lowercase token. Caller supplied boundaries
//! are checked against the `bchars` grammar of
//! [RFC 2046 Section 5.1.1](https://tools.ietf.org/html/rfc2046#section-5.1.1).

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;

use crate::ensure;
use crate::error::MultipartError;

/// Number of random bytes behind a generated boundary.
const BOUNDARY_ENTROPY: usize = 30;

/// Maximum boundary length allowed by RFC 2046.
const MAX_BOUNDARY_LEN: usize = 70;

/// The delimiter token of one multipart body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Boundary(String);

impl Boundary {
    /// Generates a fresh boundary from the operating system's secure random source.
    ///
    /// # Errors
    ///
    /// Returns [`MultipartError::Entropy`] if the random source cannot be read.
    pub fn random() -> Result<Self, MultipartError> {
        Self::random_from(&mut OsRng)
    }

    pub(crate) fn random_from<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self, MultipartError> {
        let mut entropy = [0u8; BOUNDARY_ENTROPY];
        rng.try_fill_bytes(&mut entropy).map_err(MultipartError::entropy)?;
        Ok(Self(hex::encode(entropy)))
    }

    /// Wraps a caller supplied boundary.
    ///
    /// # Errors
    ///
    /// Returns [`MultipartError::InvalidBoundary`] if the token is empty, longer than
    /// 70 characters, ends with a space, or contains a character outside `bchars`.
    pub fn new<S: Into<String>>(boundary: S) -> Result<Self, MultipartError> {
        let boundary = boundary.into();

        ensure!(!boundary.is_empty(), MultipartError::invalid_boundary("boundary is empty"));
        ensure!(
            boundary.len() <= MAX_BOUNDARY_LEN,
            MultipartError::invalid_boundary(format!(
                "boundary length {} exceed the limit {MAX_BOUNDARY_LEN}",
                boundary.len()
            ))
        );
        ensure!(!boundary.ends_with(' '), MultipartError::invalid_boundary("boundary ends with a space"));

        if let Some(c) = boundary.chars().find(|c| !is_bchar(*c)) {
            return Err(MultipartError::invalid_boundary(format!("boundary contains illegal character {c:?}")));
        }

        Ok(Self(boundary))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_bchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '\'' | '(' | ')' | '+' | '_' | ',' | '-' | '.' | '/' | ':' | '=' | '?' | ' ')
}

impl AsRef<str> for Boundary {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
