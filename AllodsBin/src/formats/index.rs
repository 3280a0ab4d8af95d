//! Index buffers and LOD geometry fragments.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::error::{Error, Result};

/// Bytes per triangle in an index buffer (three `u16` indices).
pub const TRIANGLE_SIZE: usize = 6;

/// Three vertex indices into the decoded vertex sequence.
pub type Triangle = [u16; 3];

/// Split an index buffer into triangles. A trailing partial triangle is dropped.
#[must_use]
pub fn decode_triangles(buffer: &[u8]) -> Vec<Triangle> {
    buffer
        .chunks_exact(TRIANGLE_SIZE)
        .map(|chunk| {
            [
                LittleEndian::read_u16(&chunk[0..2]),
                LittleEndian::read_u16(&chunk[2..4]),
                LittleEndian::read_u16(&chunk[4..6]),
            ]
        })
        .collect()
}

/// One LOD of a model element: ranges into the shared vertex and index buffers.
///
/// Index bounds are byte offsets into the index buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GeometryFragment {
    pub vertex_begin: usize,
    pub vertex_end: usize,
    pub index_begin: usize,
    pub index_end: usize,
}

impl GeometryFragment {
    #[must_use]
    pub const fn new(vertex_begin: usize, vertex_end: usize, index_begin: usize, index_end: usize) -> Self {
        Self {
            vertex_begin,
            vertex_end,
            index_begin,
            index_end,
        }
    }

    /// Triangle offsets covered by this fragment.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFragment`] if the byte range is reversed, not
    /// triangle aligned, or past `index_buffer_len` bytes.
    pub fn triangle_range(&self, index_buffer_len: usize) -> Result<std::ops::Range<usize>> {
        let aligned = self.index_begin % TRIANGLE_SIZE == 0 && self.index_end % TRIANGLE_SIZE == 0;
        if self.index_begin > self.index_end || !aligned || self.index_end > index_buffer_len {
            return Err(Error::InvalidFragment {
                begin: self.index_begin,
                end: self.index_end,
                buffer_len: index_buffer_len,
            });
        }
        Ok(self.index_begin / TRIANGLE_SIZE..self.index_end / TRIANGLE_SIZE)
    }

    /// The fragment's triangles, in buffer order.
    ///
    /// # Errors
    /// See [`GeometryFragment::triangle_range`].
    pub fn slice<'a>(&self, triangles: &'a [Triangle]) -> Result<&'a [Triangle]> {
        let range = self.triangle_range(triangles.len() * TRIANGLE_SIZE)?;
        Ok(&triangles[range])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_bytes(triangles: &[Triangle]) -> Vec<u8> {
        triangles
            .iter()
            .flatten()
            .flat_map(|i| i.to_le_bytes())
            .collect()
    }

    #[test]
    fn test_decode_drops_partial_triangle() {
        let mut bytes = index_bytes(&[[0, 1, 2], [2, 1, 3]]);
        bytes.extend_from_slice(&[9, 0, 9]);
        assert_eq!(decode_triangles(&bytes), vec![[0, 1, 2], [2, 1, 3]]);
    }

    #[test]
    fn test_fragment_slice_keeps_order() {
        let triangles = decode_triangles(&index_bytes(&[[0, 1, 2], [2, 1, 3]]));
        let fragment = GeometryFragment::new(0, 4, 0, 12);
        assert_eq!(fragment.slice(&triangles).unwrap(), &[[0, 1, 2], [2, 1, 3]]);

        let second = GeometryFragment::new(0, 4, 6, 12);
        assert_eq!(second.slice(&triangles).unwrap(), &[[2, 1, 3]]);
    }

    #[test]
    fn test_fragment_invariants() {
        let triangles = vec![[0u16, 1, 2]; 2];
        for (begin, end) in [(12, 6), (0, 7), (3, 6), (0, 18)] {
            let fragment = GeometryFragment::new(0, 0, begin, end);
            assert!(matches!(
                fragment.slice(&triangles),
                Err(Error::InvalidFragment { .. })
            ));
        }
        assert!(GeometryFragment::new(0, 0, 6, 6).slice(&triangles).unwrap().is_empty());
    }
}
