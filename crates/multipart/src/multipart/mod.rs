//! The multipart body builder.
//!
//! A [`Multipart`] collects parts in the order they are added. Each part becomes one
//! lazily read source holding its framed bytes. Once [`Multipart::finalize`] appends the
//! closing delimiter the body can be streamed, see the [`stream`] module for the read side.

mod stream;

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytes::BytesMut;
use http::{HeaderValue, Request, header};
use mime::Mime;
use tracing::{debug, warn};

use crate::boundary::Boundary;
use crate::error::MultipartError;
use crate::part::header::{encode_terminator, terminator_len};
use crate::part::{PartHead, PartSource};
use crate::resource::{Resource, ResourceTracker};

/// Default size of the chunks produced by [`Multipart::next_chunk`].
const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Parts may still be added; reading fails.
    Building,
    /// Finalized; `cursor` is the index of the source being read.
    Streaming { cursor: usize },
    /// Every source has been read, or the body was closed.
    Exhausted,
}

/// A streaming `multipart/form-data` body.
///
/// Parts are serialized in the order they are added. The body must be
/// [finalized](Multipart::finalize) before it can be read, either through
/// [`std::io::Read`], [`Multipart::next_chunk`] or [`http_body::Body`].
///
/// A body is read forward only and cannot be restarted. Reading it to the end releases
/// the files it opened; [`Multipart::close`] does the same for an abandoned body.
///
/// A body is not meant for concurrent use: every read takes `&mut self`.
pub struct Multipart {
    boundary: Option<Boundary>,
    sources: Vec<PartSource>,
    resources: ResourceTracker,
    state: State,
    /// Whether the last source is the closing delimiter rather than a part.
    terminated: bool,
    chunk_size: usize,
}

impl Multipart {
    /// Creates an empty body. The boundary is generated on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty body delimited by `boundary` instead of a random token.
    ///
    /// # Errors
    ///
    /// Returns [`MultipartError::InvalidBoundary`] if `boundary` is not a valid RFC 2046 boundary.
    pub fn with_boundary<S: Into<String>>(boundary: S) -> Result<Self, MultipartError> {
        Ok(Self { boundary: Some(Boundary::new(boundary)?), ..Self::default() })
    }

    /// Sets the maximum size of the chunks yielded by [`Multipart::next_chunk`] and the
    /// [`http_body::Body`] implementation.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Adds a plain form field.
    ///
    /// # Errors
    ///
    /// Fails if the body is already finalized or no boundary could be generated.
    pub fn add_field(&mut self, name: &str, value: &str) -> Result<(), MultipartError> {
        let head = PartHead::field(name);
        let mut part = self.encode_head(&head, value.len())?;
        part.extend_from_slice(value.as_bytes());
        self.append(&head, PartSource::Memory(part.freeze()));
        Ok(())
    }

    /// Adds an in-memory file typed `application/octet-stream`.
    ///
    /// # Errors
    ///
    /// See [`Multipart::add_field`].
    pub fn add_bytes(&mut self, name: &str, file_name: &str, data: &[u8]) -> Result<(), MultipartError> {
        self.add_bytes_with_type(name, file_name, &mime::APPLICATION_OCTET_STREAM, data)
    }

    /// Adds an in-memory file with an explicit content type.
    ///
    /// # Errors
    ///
    /// See [`Multipart::add_field`].
    pub fn add_bytes_with_type(
        &mut self,
        name: &str,
        file_name: &str,
        content_type: &Mime,
        data: &[u8],
    ) -> Result<(), MultipartError> {
        let head = PartHead::file(name, file_name, content_type);
        let mut part = self.encode_head(&head, data.len())?;
        part.extend_from_slice(data);
        self.append(&head, PartSource::Memory(part.freeze()));
        Ok(())
    }

    /// Adds a file read from `reader`, typed `application/octet-stream`.
    ///
    /// # Errors
    ///
    /// See [`Multipart::add_field`].
    pub fn add_reader<R>(&mut self, name: &str, file_name: &str, reader: R) -> Result<(), MultipartError>
    where
        R: Read + Send + 'static,
    {
        self.add_reader_with_type(name, file_name, &mime::APPLICATION_OCTET_STREAM, reader)
    }

    /// Adds a file read from `reader` with an explicit content type.
    ///
    /// The reader is only pulled while the body is streamed. It stays owned by the
    /// body but is not released early: it is dropped together with the body.
    ///
    /// # Errors
    ///
    /// See [`Multipart::add_field`].
    pub fn add_reader_with_type<R>(
        &mut self,
        name: &str,
        file_name: &str,
        content_type: &Mime,
        reader: R,
    ) -> Result<(), MultipartError>
    where
        R: Read + Send + 'static,
    {
        let head = PartHead::file(name, file_name, content_type);
        let part = self.encode_head(&head, 0)?;
        self.append(&head, PartSource::Stream { head: part.freeze(), reader: Box::new(reader) });
        Ok(())
    }

    /// Adds a file read from `resource`, handing its ownership to the body.
    ///
    /// The resource is released once the body is read to the end or closed, whether or
    /// not its own bytes were fully consumed.
    ///
    /// # Errors
    ///
    /// See [`Multipart::add_field`]. On error the resource is dropped without being released.
    pub fn add_resource_with_type<R>(
        &mut self,
        name: &str,
        file_name: &str,
        content_type: &Mime,
        resource: R,
    ) -> Result<(), MultipartError>
    where
        R: Resource + 'static,
    {
        let head = PartHead::file(name, file_name, content_type);
        let part = self.encode_head(&head, 0)?;
        let slot = self.resources.track(name, Box::new(resource));
        self.append(&head, PartSource::Resource { head: part.freeze(), slot });
        Ok(())
    }

    /// Adds the file at `path`, typed `application/octet-stream`.
    ///
    /// # Errors
    ///
    /// See [`Multipart::add_file_with_type`].
    pub fn add_file<P: AsRef<Path>>(&mut self, name: &str, path: P) -> Result<(), MultipartError> {
        self.add_file_with_type(name, &mime::APPLICATION_OCTET_STREAM, path)
    }

    /// Opens the file at `path` and adds it with an explicit content type.
    ///
    /// The part's filename is the final component of `path`. The opened file is owned by
    /// the body and closed once the body is read to the end or closed.
    ///
    /// # Errors
    ///
    /// Returns [`MultipartError::Open`] if the file cannot be opened, in which case
    /// nothing is added, and the errors of [`Multipart::add_field`].
    pub fn add_file_with_type<P: AsRef<Path>>(
        &mut self,
        name: &str,
        content_type: &Mime,
        path: P,
    ) -> Result<(), MultipartError> {
        let path = path.as_ref();
        self.check_writable(name)?;

        let file = File::open(path).map_err(|e| MultipartError::open(path, e))?;
        self.add_resource_with_type(name, &file_name_of(path), content_type, file)
    }

    /// Appends the closing delimiter and allows the body to be read.
    ///
    /// Calling it again has no effect.
    ///
    /// # Errors
    ///
    /// Returns [`MultipartError::Entropy`] if the body has no boundary yet and none could be generated.
    pub fn finalize(&mut self) -> Result<(), MultipartError> {
        if self.is_finalized() {
            return Ok(());
        }

        let boundary = self.ensure_boundary()?;
        let mut terminator = BytesMut::with_capacity(terminator_len(boundary));
        encode_terminator(boundary, &mut terminator);

        self.sources.push(PartSource::Memory(terminator.freeze()));
        self.terminated = true;
        self.state = State::Streaming { cursor: 0 };
        debug!(parts = self.sources.len() - 1, resources = self.resources.open(), "multipart body finalized");
        Ok(())
    }

    /// Whether [`Multipart::finalize`] (or [`Multipart::close`]) has been called.
    pub fn is_finalized(&self) -> bool {
        self.state != State::Building
    }

    /// Whether the body has been read to the end or closed.
    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    /// Number of parts added so far.
    pub fn parts(&self) -> usize {
        self.sources.len() - usize::from(self.terminated)
    }

    /// Number of owned resources not yet released.
    pub fn open_resources(&self) -> usize {
        self.resources.open()
    }

    /// The boundary of this body, generated on first use.
    ///
    /// # Errors
    ///
    /// Returns [`MultipartError::Entropy`] if no boundary could be generated.
    pub fn boundary(&mut self) -> Result<&str, MultipartError> {
        self.ensure_boundary().map(Boundary::as_str)
    }

    /// The `Content-Type` header value to send with this body:
    /// `multipart/form-data; boundary=<boundary>`.
    ///
    /// # Errors
    ///
    /// Returns [`MultipartError::Entropy`] if no boundary could be generated.
    pub fn content_type(&mut self) -> Result<HeaderValue, MultipartError> {
        let boundary = self.ensure_boundary()?;
        let value = format!("{}; boundary={boundary}", mime::MULTIPART_FORM_DATA);
        HeaderValue::try_from(value).map_err(|e| http::Error::from(e).into())
    }

    /// Finalizes the body and attaches it to a request.
    ///
    /// `Content-Type` is set to the multipart content type and `Transfer-Encoding` to
    /// `chunked`, replacing any values already present on `builder`.
    ///
    /// # Errors
    ///
    /// Fails if the body cannot be finalized or `builder` holds an invalid request.
    pub fn into_request(mut self, builder: http::request::Builder) -> Result<Request<Self>, MultipartError> {
        self.finalize()?;
        let content_type = self.content_type()?;

        let mut request = builder.body(self)?;
        let headers = request.headers_mut();
        headers.remove(header::CONTENT_LENGTH);
        headers.insert(header::CONTENT_TYPE, content_type);
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        Ok(request)
    }

    /// Abandons the body and releases every owned resource still held.
    ///
    /// Afterwards the body reads as exhausted and no parts can be added.
    ///
    /// # Errors
    ///
    /// Returns the first [`MultipartError::Release`] failure; every resource is attempted regardless.
    /// A failure is reported once, by whichever of `close` or the final read released the
    /// resource. Later calls return `Ok(())`.
    pub fn close(&mut self) -> Result<(), MultipartError> {
        if self.state != State::Exhausted {
            debug!(resources = self.resources.open(), "closing multipart body");
            self.state = State::Exhausted;
        }
        self.resources.release_all()
    }

    fn ensure_boundary(&mut self) -> Result<&Boundary, MultipartError> {
        let boundary = match self.boundary.take() {
            Some(boundary) => boundary,
            None => Boundary::random()?,
        };
        Ok(self.boundary.insert(boundary))
    }

    fn check_writable(&self, name: &str) -> Result<(), MultipartError> {
        if self.is_finalized() {
            warn!(field = name, "part added after multipart body was finalized");
            return Err(MultipartError::already_finalized(name));
        }
        Ok(())
    }

    /// Encodes the head of a new part into a buffer with room for `payload_len` more bytes.
    fn encode_head(&mut self, head: &PartHead<'_>, payload_len: usize) -> Result<BytesMut, MultipartError> {
        self.check_writable(head.name())?;

        let boundary = self.ensure_boundary()?;
        let mut part = BytesMut::with_capacity(head.encoded_len(boundary) + payload_len);
        head.encode(boundary, &mut part);
        Ok(part)
    }

    fn append(&mut self, head: &PartHead<'_>, source: PartSource) {
        match head {
            PartHead::Field { name } => debug!(field = name, index = self.sources.len(), "add field part"),
            PartHead::File { name, file_name, content_type } => debug!(
                field = name,
                file_name,
                content_type = %content_type,
                index = self.sources.len(),
                "add file part"
            ),
        }
        self.sources.push(source);
    }
}

/// The final component of `path`, or the whole path if it has none.
fn file_name_of(path: &Path) -> Cow<'_, str> {
    path.file_name().map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
}

impl Default for Multipart {
    fn default() -> Self {
        Self {
            boundary: None,
            sources: Vec::new(),
            resources: ResourceTracker::new(),
            state: State::Building,
            terminated: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl fmt::Debug for Multipart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multipart")
            .field("boundary", &self.boundary)
            .field("sources", &self.sources)
            .field("resources", &self.resources)
            .field("state", &self.state)
            .field("terminated", &self.terminated)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}
