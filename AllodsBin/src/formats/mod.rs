//! Asset format decoders
//!
//! The binary decoders (`vertex`, `index`, `skeleton`, `texture`) work on
//! in-memory buffers only. `xdb` reads the XML metadata that says which
//! buffers exist and how they are laid out.

pub mod index;
pub mod skeleton;
pub mod texture;
pub mod vertex;
pub mod xdb;

// Re-export main types
pub use index::{decode_triangles, GeometryFragment, Triangle};
pub use skeleton::{Bone, Skeleton};
pub use texture::{decode_texture, PixelFormat, TextureInfo, TextureOptions};
pub use vertex::{decode_vertices, VertexLayout, VertexRecord};
pub use xdb::{read_xdb, XdbDocument};
