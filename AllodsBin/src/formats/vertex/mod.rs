//! Vertex declarations and vertex buffer decoding
//!
//! A vertex declaration names up to seven semantic attributes, each stored
//! as a packed element at a fixed offset inside a fixed-stride record.

mod decode;
mod types;

pub use decode::{decode_vertices, Influences, VertexKey, VertexRecord};
pub use types::{VertexComponent, VertexElementType, VertexLayout};
