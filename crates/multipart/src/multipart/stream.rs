//! The read side of a [`Multipart`] body.
//!
//! After finalization the body is a cursor over its part sources. Each read is
//! forwarded to the source under the cursor; a drained source moves the cursor on
//! without surfacing anything to the caller. Passing the last source exhausts the
//! body and releases its owned resources.

use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use http_body::{Body, Frame};
use tracing::{debug, trace};

use super::{Multipart, State};
use crate::ensure;
use crate::error::MultipartError;

impl Multipart {
    /// Reads the next bytes of the body into `buf`.
    ///
    /// Returns `Ok(0)` only once the whole body has been read (or `buf` is empty).
    ///
    /// # Errors
    ///
    /// - [`MultipartError::NotReady`] if the body is not finalized; nothing is consumed.
    /// - [`MultipartError::Io`] if a part's reader fails.
    /// - [`MultipartError::Release`] if an owned resource fails to release at the end of
    ///   the body. Later reads return `Ok(0)`.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<usize, MultipartError> {
        ensure!(self.is_finalized(), MultipartError::NotReady);

        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let State::Streaming { cursor } = self.state else {
                return Ok(0);
            };

            let Some(source) = self.sources.get_mut(cursor) else {
                self.state = State::Exhausted;
                debug!(parts = cursor, resources = self.resources.open(), "multipart body exhausted");
                self.resources.release_all()?;
                return Ok(0);
            };

            let n = source.read(buf, &mut self.resources)?;
            if n > 0 {
                return Ok(n);
            }

            trace!(cursor, "part drained");
            self.state = State::Streaming { cursor: cursor + 1 };
        }
    }

    /// Reads the next chunk of the body, at most the configured chunk size.
    ///
    /// Returns `Ok(None)` once the body has been read to the end.
    ///
    /// # Errors
    ///
    /// See [`Multipart::fill`].
    pub fn next_chunk(&mut self) -> Result<Option<Bytes>, MultipartError> {
        let mut chunk = BytesMut::zeroed(self.chunk_size);
        let n = self.fill(&mut chunk)?;
        if n == 0 {
            return Ok(None);
        }

        chunk.truncate(n);
        Ok(Some(chunk.freeze()))
    }
}

impl Read for Multipart {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fill(buf).map_err(io::Error::from)
    }
}

/// Streams the body as data frames.
///
/// Frames are read synchronously inside `poll_frame`, so a part reader that blocks
/// (a file on slow storage, for instance) blocks the polling task.
impl Body for Multipart {
    type Data = Bytes;
    type Error = MultipartError;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        Poll::Ready(this.next_chunk().transpose().map(|chunk| chunk.map(Frame::data)))
    }

    fn is_end_stream(&self) -> bool {
        self.is_exhausted()
    }
}
