#![allow(non_snake_case)]
//! # AllodsBin
//!
//! A pure-Rust library for decoding Allods Online asset files.
//!
//! Every asset is an XML metadata file (`.xdb`) paired with a binary blob
//! (`.bin`). The metadata names buffers inside the blob by segment id and
//! byte length; this crate extracts those buffers and decodes them.
//!
//! ## Supported Data
//!
//! - **BIN containers** - Segment extraction by blob reference
//! - **Vertex buffers** - Layout-driven decoding of packed vertex records
//! - **Index buffers** - Triangle lists and per-LOD geometry fragments
//! - **Skeletons** - Bone tables with hierarchy and world transforms
//! - **Textures** - Compressed mip streams rebuilt as DDS, optional PNG
//! - **XDB** - Model/texture metadata
//!
//! ## Quick Start
//!
//! ### Decoding buffers already in memory
//!
//! ```
//! use allodsbin::prelude::*;
//!
//! let layout = VertexLayout::new(12)
//!     .with_position(VertexComponent::new(VertexElementType::FLOAT3, 0));
//! let buffer: Vec<u8> = [1.0f32, 2.0, 3.0].iter().flat_map(|v| v.to_le_bytes()).collect();
//!
//! let vertices = decode_vertices(&layout, &buffer)?;
//! assert_eq!(vertices[0].position, [1.0, 2.0, 3.0]);
//! # Ok::<(), allodsbin::Error>(())
//! ```
//!
//! ### Importing a model from disk
//!
//! ```no_run
//! use allodsbin::import::{import_model, ImportOptions, TextureCache};
//! use std::path::Path;
//!
//! let mut textures = TextureCache::new();
//! let model = import_model(Path::new("Chest.(Geometry).xdb"), &ImportOptions::new(), &mut textures)?;
//! println!("{} elements, {} bones", model.elements.len(), model.skeleton.len());
//! # Ok::<(), allodsbin::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `allodsbin` command-line binary

pub mod container;
pub mod error;
pub mod formats;
pub mod import;
pub mod mesh;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::container::{BlobRef, Container};
    pub use crate::error::{Error, Result};
    pub use crate::formats::index::{decode_triangles, GeometryFragment, Triangle};
    pub use crate::formats::skeleton::{Bone, Skeleton, NO_PARENT};
    pub use crate::formats::texture::{
        decode_levels, decode_texture, dds_to_png, BlockPatternStats, LevelTable, PixelFormat,
        TextureInfo, TextureOptions,
    };
    pub use crate::formats::vertex::{
        decode_vertices, VertexComponent, VertexElementType, VertexLayout, VertexRecord,
    };
    pub use crate::formats::xdb::{read_xdb, Material, ModelElement, XdbDocument};
    pub use crate::import::{
        convert_texture, import_model, ImportOptions, ImportedModel, LodSelection, TextureCache,
    };
    pub use crate::mesh::LodMesh;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
