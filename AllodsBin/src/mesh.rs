//! LOD mesh assembly.
//!
//! A model element's LOD is a slice of the shared triangle list. Assembly
//! pulls the referenced vertices out of the decoded vertex sequence, merges
//! vertices that decode to equal records and rewrites the triangles against
//! the compacted list.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::formats::index::{GeometryFragment, Triangle};
use crate::formats::vertex::{VertexKey, VertexRecord};

/// Self-contained geometry of one LOD.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LodMesh {
    /// Unique vertices in order of first reference.
    pub vertices: Vec<VertexRecord>,
    /// Triangles indexing into [`LodMesh::vertices`].
    pub triangles: Vec<Triangle>,
}

impl LodMesh {
    /// Assemble the LOD described by `fragment`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFragment`] if the fragment does not fit
    /// `triangles`, or [`Error::VertexIndexOutOfRange`] if a triangle points
    /// past the decoded vertices.
    pub fn build(vertices: &[VertexRecord], triangles: &[Triangle], fragment: &GeometryFragment) -> Result<Self> {
        let lod_triangles = fragment.slice(triangles)?;

        let mut mesh = Self {
            vertices: Vec::new(),
            triangles: Vec::with_capacity(lod_triangles.len()),
        };
        let mut by_source: HashMap<u16, u16> = HashMap::new();
        let mut by_key: HashMap<VertexKey, u16> = HashMap::new();

        for triangle in lod_triangles {
            let mut remapped = [0u16; 3];
            for (slot, &source) in remapped.iter_mut().zip(triangle) {
                *slot = match by_source.get(&source) {
                    Some(&local) => local,
                    None => {
                        let record = vertices.get(usize::from(source)).ok_or(Error::VertexIndexOutOfRange {
                            index: source,
                            vertex_count: vertices.len(),
                        })?;
                        // At most 65536 distinct sources, so local ids fit in u16
                        let local = *by_key.entry(record.key()).or_insert_with(|| {
                            mesh.vertices.push(record.clone());
                            (mesh.vertices.len() - 1) as u16
                        });
                        by_source.insert(source, local);
                        local
                    }
                };
            }
            mesh.triangles.push(remapped);
        }

        tracing::trace!(
            "LOD mesh: {} triangles, {} unique vertices",
            mesh.triangles.len(),
            mesh.vertices.len()
        );
        Ok(mesh)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}
