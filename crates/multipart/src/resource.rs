//! Ownership and release of the handles a multipart body reads from.
//!
//! Files opened by [`Multipart::add_file`](crate::Multipart::add_file), and any
//! [`Resource`] handed over through
//! [`Multipart::add_resource_with_type`](crate::Multipart::add_resource_with_type),
//! belong to the body. They are released exactly once, when the body is read to the
//! end or when [`Multipart::close`](crate::Multipart::close) is called. A body dropped
//! before either simply drops its resources, which closes files without reporting errors.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};

use tracing::{debug, warn};

use crate::error::MultipartError;

/// A readable handle whose lifetime is managed by a multipart body.
pub trait Resource: Read + Send {
    /// Releases the underlying handle.
    ///
    /// Called at most once, after which the resource is never read again.
    fn release(self: Box<Self>) -> io::Result<()>;
}

impl Resource for File {
    fn release(self: Box<Self>) -> io::Result<()> {
        // the descriptor is closed on drop, std discards the close(2) status
        drop(self);
        Ok(())
    }
}

struct Entry {
    field: String,
    resource: Option<Box<dyn Resource>>,
}

/// Holds the owned resources of one body, indexed by the slot returned from [`ResourceTracker::track`].
#[derive(Default)]
pub(crate) struct ResourceTracker {
    entries: Vec<Entry>,
}

impl ResourceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `resource`, returning the slot used to read it.
    pub(crate) fn track(&mut self, field: &str, resource: Box<dyn Resource>) -> usize {
        self.entries.push(Entry { field: field.to_owned(), resource: Some(resource) });
        self.entries.len() - 1
    }

    /// Reads from the resource in `slot`. A released resource reads as exhausted.
    pub(crate) fn read(&mut self, slot: usize, buf: &mut [u8]) -> io::Result<usize> {
        match self.entries.get_mut(slot).and_then(|entry| entry.resource.as_mut()) {
            Some(resource) => resource.read(buf),
            None => Ok(0),
        }
    }

    /// Number of resources not yet released.
    pub(crate) fn open(&self) -> usize {
        self.entries.iter().filter(|entry| entry.resource.is_some()).count()
    }

    /// Releases every resource still held.
    ///
    /// All resources are attempted even if one fails; the first failure is returned.
    pub(crate) fn release_all(&mut self) -> Result<(), MultipartError> {
        let mut first_error = None;

        for entry in &mut self.entries {
            let Some(resource) = entry.resource.take() else {
                continue;
            };

            match resource.release() {
                Ok(()) => debug!(field = %entry.field, "released resource"),
                Err(e) => {
                    warn!(field = %entry.field, cause = %e, "failed to release resource");
                    if first_error.is_none() {
                        first_error = Some(MultipartError::release(&entry.field, e));
                    }
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for ResourceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTracker").field("tracked", &self.entries.len()).field("open", &self.open()).finish()
    }
}
