//! Binary container segments and blob references.
//!
//! A `.bin` file is a table of segments addressed by the `localID` values that
//! the paired `.xdb` file stores next to each buffer. [`Container`] owns the
//! bytes and the segment table; [`Container::extract`] resolves a [`BlobRef`]
//! to the exact byte range without interpreting it.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;

use crate::error::{Error, Result};

/// Size of the length prefix in front of every segment of a `.bin` stream.
const SEGMENT_PREFIX_SIZE: usize = 4;

/// Reference to a contiguous region of a container segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlobRef {
    /// Segment id (`localID` in the XDB).
    pub container_id: u32,
    /// Number of bytes used from the start of the segment (`size` in the XDB).
    pub byte_length: u32,
}

impl BlobRef {
    #[must_use]
    pub const fn new(container_id: u32, byte_length: u32) -> Self {
        Self {
            container_id,
            byte_length,
        }
    }
}

/// An in-memory binary container with a registered segment table.
///
/// Read-only once built, so it can be shared across threads and extracted
/// from concurrently.
#[derive(Debug, Clone, Default)]
pub struct Container {
    data: Vec<u8>,
    segments: BTreeMap<u32, Range<usize>>,
}

impl Container {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a container from owned segments; segment `i` gets id `i`.
    #[must_use]
    pub fn from_segments<I, B>(segments: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        segments
            .into_iter()
            .enumerate()
            .fold(Self::new(), |container, (id, bytes)| {
                container.with_segment(id as u32, bytes.as_ref())
            })
    }

    /// Append `bytes` and register them under `id`, replacing any earlier
    /// segment with the same id.
    #[must_use]
    pub fn with_segment(mut self, id: u32, bytes: &[u8]) -> Self {
        let start = self.data.len();
        self.data.extend_from_slice(bytes);
        self.segments.insert(id, start..self.data.len());
        self
    }

    /// Parse a `.bin` segment stream: repeated `u32` little-endian length
    /// followed by that many bytes. Segment ids are ordinal positions.
    ///
    /// # Errors
    /// Returns [`Error::TruncatedSegment`] if a segment runs past the end.
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        let mut segments = BTreeMap::new();
        let mut pos = 0usize;
        let mut index = 0usize;

        while pos < data.len() {
            let remaining = data.len() - pos;
            if remaining < SEGMENT_PREFIX_SIZE {
                return Err(Error::TruncatedSegment {
                    index,
                    offset: pos,
                    expected: SEGMENT_PREFIX_SIZE,
                    actual: remaining,
                });
            }
            let len = (&data[pos..]).read_u32::<LittleEndian>()? as usize;
            let start = pos + SEGMENT_PREFIX_SIZE;
            let available = data.len() - start;
            if len > available {
                return Err(Error::TruncatedSegment {
                    index,
                    offset: pos,
                    expected: len,
                    actual: available,
                });
            }
            segments.insert(index as u32, start..start + len);
            pos = start + len;
            index += 1;
        }

        tracing::debug!("Parsed container: {} segments, {} bytes", segments.len(), data.len());

        Ok(Self { data, segments })
    }

    /// Read and parse a `.bin` file from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or its framing is broken.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(data)
    }

    /// Number of registered segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Full bytes of a segment, if registered.
    #[must_use]
    pub fn segment(&self, id: u32) -> Option<&[u8]> {
        self.segments.get(&id).map(|range| &self.data[range.clone()])
    }

    /// Resolve a blob reference to its bytes.
    ///
    /// # Errors
    /// Returns [`Error::OutOfRange`] if the segment is not registered or is
    /// shorter than `byte_length`.
    pub fn extract(&self, blob: BlobRef) -> Result<&[u8]> {
        let requested = blob.byte_length as usize;
        if requested == 0 {
            return Ok(&[]);
        }

        let segment = self.segment(blob.container_id).ok_or(Error::OutOfRange {
            container_id: blob.container_id,
            requested,
            available: 0,
        })?;

        segment.get(..requested).ok_or(Error::OutOfRange {
            container_id: blob.container_id,
            requested,
            available: segment.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(segments: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for s in segments {
            out.extend_from_slice(&(s.len() as u32).to_le_bytes());
            out.extend_from_slice(s);
        }
        out
    }

    #[test]
    fn test_extract_prefix_of_segment() {
        let container = Container::from_segments([&b"abcdef"[..], &b"xyz"[..]]);
        assert_eq!(container.extract(BlobRef::new(0, 4)).unwrap(), b"abcd");
        assert_eq!(container.extract(BlobRef::new(1, 3)).unwrap(), b"xyz");
    }

    #[test]
    fn test_zero_length_is_empty_even_for_unknown_id() {
        let container = Container::new();
        assert!(container.extract(BlobRef::new(42, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range() {
        let container = Container::from_segments([&b"abc"[..]]);
        assert!(matches!(
            container.extract(BlobRef::new(0, 4)),
            Err(Error::OutOfRange { container_id: 0, requested: 4, available: 3 })
        ));
        assert!(matches!(
            container.extract(BlobRef::new(7, 1)),
            Err(Error::OutOfRange { available: 0, .. })
        ));
    }

    #[test]
    fn test_parse_segment_stream() {
        let container = Container::parse(framed(&[b"hello", b"", b"world!"])).unwrap();
        assert_eq!(container.segment_count(), 3);
        assert_eq!(container.segment(0), Some(&b"hello"[..]));
        assert_eq!(container.segment(1), Some(&b""[..]));
        assert_eq!(container.extract(BlobRef::new(2, 5)).unwrap(), b"world");
    }

    #[test]
    fn test_parse_truncated_segment() {
        let mut data = framed(&[b"hello"]);
        data.pop();
        assert!(matches!(
            Container::parse(data),
            Err(Error::TruncatedSegment { index: 0, expected: 5, actual: 4, .. })
        ));

        assert!(matches!(
            Container::parse(vec![1, 0]),
            Err(Error::TruncatedSegment { expected: 4, actual: 2, .. })
        ));
    }

    #[test]
    fn test_concurrent_extract() {
        let container = Container::from_segments([vec![7u8; 64], vec![9u8; 32]]);
        std::thread::scope(|scope| {
            for id in 0..2u32 {
                let container = &container;
                scope.spawn(move || {
                    let bytes = container.extract(BlobRef::new(id, 16)).unwrap();
                    assert_eq!(bytes.len(), 16);
                });
            }
        });
    }
}
