use std::cmp;
use std::fmt;
use std::io::{self, Read};

use bytes::{Buf, Bytes};

use crate::resource::ResourceTracker;

/// The framed bytes of one part, produced lazily.
///
/// Every variant starts with bytes already in memory (delimiter and headers, plus
/// the payload for `Memory`). Stream backed variants continue with a live reader.
pub(crate) enum PartSource {
    /// Framing, headers and payload held in memory.
    Memory(Bytes),

    /// In-memory head followed by a caller supplied reader.
    Stream { head: Bytes, reader: Box<dyn Read + Send> },

    /// In-memory head followed by a resource owned by the body's [`ResourceTracker`].
    Resource { head: Bytes, slot: usize },
}

impl PartSource {
    /// Reads the next bytes of this part. `Ok(0)` means the part is drained.
    pub(crate) fn read(&mut self, buf: &mut [u8], resources: &mut ResourceTracker) -> io::Result<usize> {
        match self {
            Self::Memory(bytes) => Ok(read_bytes(bytes, buf)),
            Self::Stream { head, .. } | Self::Resource { head, .. } if head.has_remaining() => {
                Ok(read_bytes(head, buf))
            }
            Self::Stream { reader, .. } => reader.read(buf),
            Self::Resource { slot, .. } => resources.read(*slot, buf),
        }
    }
}

fn read_bytes(bytes: &mut Bytes, buf: &mut [u8]) -> usize {
    let len = cmp::min(bytes.remaining(), buf.len());
    bytes.copy_to_slice(&mut buf[..len]);
    len
}

impl fmt::Debug for PartSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(bytes) => f.debug_tuple("Memory").field(&bytes.len()).finish(),
            Self::Stream { head, .. } => f.debug_struct("Stream").field("head", &head.len()).finish_non_exhaustive(),
            Self::Resource { head, slot } => f.debug_struct("Resource").field("head", &head.len()).field("slot", slot).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::tests::CountingResource;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    fn drain(source: &mut PartSource, resources: &mut ResourceTracker, step: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; step];
        loop {
            let n = source.read(&mut buf, resources).unwrap();
            if n == 0 {
                return out;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[test]
    fn test_memory() {
        let mut resources = ResourceTracker::new();
        let mut source = PartSource::Memory(Bytes::from_static(b"hello world"));
        assert_eq!(drain(&mut source, &mut resources, 4), b"hello world");
    }

    #[test]
    fn test_stream_head_first() {
        let mut resources = ResourceTracker::new();
        let mut source = PartSource::Stream {
            head: Bytes::from_static(b"head|"),
            reader: Box::new(Cursor::new(b"payload".to_vec())),
        };

        let mut buf = [0u8; 64];
        assert_eq!(source.read(&mut buf, &mut resources).unwrap(), 5);
        assert_eq!(&buf[..5], b"head|");

        assert_eq!(drain(&mut source, &mut resources, 3), b"payload");
    }

    #[test]
    fn test_resource() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut resources = ResourceTracker::new();
        let slot = resources.track("f", Box::new(CountingResource::new(b"from resource", &releases)));
        let mut source = PartSource::Resource { head: Bytes::from_static(b">"), slot };

        assert_eq!(drain(&mut source, &mut resources, 5), b">from resource");
    }
}
