//! Part header encoding.
//!
//! Renders the delimiter line and the header block that open every part:
//!
//! ```text
//! \r\n--BOUNDARY\r\n
//! Content-Disposition: form-data; name="FIELD"[; filename="NAME"]\r\n
//! [Content-Type: TYPE\r\n]
//! \r\n
//! ```
//!
//! Names and filenames are written verbatim. Quotes, backslashes or line breaks
//! inside them are not escaped, so callers must not pass values that would break
//! the framing.

use bytes::{BufMut, BytesMut};
use mime::Mime;

use crate::boundary::Boundary;

const CRLF: &[u8] = b"\r\n";
const DASHES: &[u8] = b"--";
const DISPOSITION: &[u8] = b"Content-Disposition: form-data; name=\"";
const FILENAME: &[u8] = b"\"; filename=\"";
const CONTENT_TYPE: &[u8] = b"\r\nContent-Type: ";

/// The header block of a single part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PartHead<'a> {
    /// A plain form field.
    Field { name: &'a str },
    /// A file field carrying a filename and a content type.
    File { name: &'a str, file_name: &'a str, content_type: &'a Mime },
}

impl<'a> PartHead<'a> {
    pub(crate) fn field(name: &'a str) -> Self {
        Self::Field { name }
    }

    pub(crate) fn file(name: &'a str, file_name: &'a str, content_type: &'a Mime) -> Self {
        Self::File { name, file_name, content_type }
    }

    pub(crate) fn name(&self) -> &'a str {
        match self {
            Self::Field { name } | Self::File { name, .. } => *name,
        }
    }

    /// Number of bytes [`PartHead::encode`] writes.
    pub(crate) fn encoded_len(&self, boundary: &Boundary) -> usize {
        let delimiter = CRLF.len() + DASHES.len() + boundary.as_str().len() + CRLF.len();
        let disposition = DISPOSITION.len() + self.name().len() + 1;
        let file = match self {
            Self::Field { .. } => 0,
            Self::File { file_name, content_type, .. } => {
                FILENAME.len() + file_name.len() + CONTENT_TYPE.len() + content_type.as_ref().len()
            }
        };
        delimiter + disposition + file + CRLF.len() + CRLF.len()
    }

    /// Writes the delimiter line, the header block and the blank line that precedes the payload.
    pub(crate) fn encode(&self, boundary: &Boundary, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len(boundary));

        dst.put_slice(CRLF);
        dst.put_slice(DASHES);
        dst.put_slice(boundary.as_str().as_bytes());
        dst.put_slice(CRLF);

        dst.put_slice(DISPOSITION);
        dst.put_slice(self.name().as_bytes());
        match self {
            Self::Field { .. } => dst.put_u8(b'"'),
            Self::File { file_name, content_type, .. } => {
                dst.put_slice(FILENAME);
                dst.put_slice(file_name.as_bytes());
                dst.put_u8(b'"');
                dst.put_slice(CONTENT_TYPE);
                dst.put_slice(content_type.as_ref().as_bytes());
            }
        }

        dst.put_slice(CRLF);
        dst.put_slice(CRLF);
    }
}

/// Number of bytes [`encode_terminator`] writes.
pub(crate) fn terminator_len(boundary: &Boundary) -> usize {
    CRLF.len() + DASHES.len() + boundary.as_str().len() + DASHES.len() + CRLF.len()
}

/// Writes the closing delimiter `\r\n--BOUNDARY--\r\n`.
pub(crate) fn encode_terminator(boundary: &Boundary, dst: &mut BytesMut) {
    dst.reserve(terminator_len(boundary));
    dst.put_slice(CRLF);
    dst.put_slice(DASHES);
    dst.put_slice(boundary.as_str().as_bytes());
    dst.put_slice(DASHES);
    dst.put_slice(CRLF);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary() -> Boundary {
        Boundary::new("XyZ").unwrap()
    }

    #[test]
    fn test_field_head() {
        let boundary = boundary();
        let head = PartHead::field("title");

        let mut dst = BytesMut::new();
        head.encode(&boundary, &mut dst);

        assert_eq!(&dst[..], &b"\r\n--XyZ\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n"[..]);
        assert_eq!(head.encoded_len(&boundary), dst.len());
    }

    #[test]
    fn test_file_head() {
        let boundary = boundary();
        let head = PartHead::file("upload", "notes.txt", &mime::TEXT_PLAIN_UTF_8);

        let mut dst = BytesMut::new();
        head.encode(&boundary, &mut dst);

        let expected = concat!(
            "\r\n--XyZ\r\n",
            "Content-Disposition: form-data; name=\"upload\"; filename=\"notes.txt\"\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
        );
        assert_eq!(std::str::from_utf8(&dst[..]).unwrap(), expected);
        assert_eq!(head.encoded_len(&boundary), dst.len());
    }

    #[test]
    fn test_names_written_verbatim() {
        let boundary = boundary();
        let head = PartHead::file("a\"b", "c\\d", &mime::APPLICATION_OCTET_STREAM);

        let mut dst = BytesMut::new();
        head.encode(&boundary, &mut dst);

        let encoded = std::str::from_utf8(&dst[..]).unwrap();
        assert!(encoded.contains("name=\"a\"b\"; filename=\"c\\d\""));
    }

    #[test]
    fn test_terminator() {
        let boundary = boundary();
        let mut dst = BytesMut::new();
        encode_terminator(&boundary, &mut dst);

        assert_eq!(&dst[..], &b"\r\n--XyZ--\r\n"[..]);
        assert_eq!(terminator_len(&boundary), dst.len());
    }
}
