//! Model import options
//!
//! Controls which LODs are assembled, whether attachment slot bones are kept
//! and how diffuse textures are decoded.

use crate::formats::texture::TextureOptions;

/// Which LODs of each model element to assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LodSelection {
    /// Every LOD shared by all elements
    All,
    /// A single LOD by index
    Only(usize),
}

impl Default for LodSelection {
    fn default() -> Self {
        Self::Only(0)
    }
}

impl LodSelection {
    #[must_use]
    pub fn includes(self, lod: usize) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => selected == lod,
        }
    }
}

/// Options for [`import_model`](super::import_model).
///
/// # Example
///
/// ```
/// use allodsbin::import::{ImportOptions, LodSelection};
///
/// let options = ImportOptions::new()
///     .with_lods(LodSelection::All)
///     .with_slot_bones(true);
/// assert!(options.include_slot_bones);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// LODs to assemble (default: LOD 0 only)
    pub lods: LodSelection,

    /// Keep bones whose name contains `Slot`
    /// Default: false
    pub include_slot_bones: bool,

    /// Decode the diffuse texture of every material
    /// Default: true
    pub load_textures: bool,

    /// Options passed to the texture decoder
    pub texture: TextureOptions,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            lods: LodSelection::default(),
            include_slot_bones: false,
            load_textures: true,
            texture: TextureOptions::default(),
        }
    }
}

impl ImportOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_lods(mut self, lods: LodSelection) -> Self {
        self.lods = lods;
        self
    }

    #[must_use]
    pub fn with_slot_bones(mut self, include: bool) -> Self {
        self.include_slot_bones = include;
        self
    }

    /// Skip texture decoding entirely.
    #[must_use]
    pub fn no_textures(mut self) -> Self {
        self.load_textures = false;
        self
    }

    #[must_use]
    pub fn with_texture_options(mut self, texture: TextureOptions) -> Self {
        self.texture = texture;
        self
    }
}
