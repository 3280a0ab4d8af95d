//! Model import
//!
//! Ties the decoders together for assets on disk: reads a geometry XDB and
//! its `.bin`, decodes vertices, triangles and the skeleton, assembles the
//! selected LODs and decodes each material's diffuse texture.
//!
//! Texture XDB paths are relative to the resource root. The root is found by
//! walking up from the model's `.bin` once per component of its
//! `binaryFile` href.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

mod batch;
mod options;

pub use batch::{batch_convert_textures, find_xdb_files, BatchProgress, BatchTextureResult};
pub use options::{ImportOptions, LodSelection};

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::container::Container;
use crate::error::{Error, Result};
use crate::formats::index::{decode_triangles, GeometryFragment, Triangle};
use crate::formats::skeleton::Skeleton;
use crate::formats::texture::{decode_texture, TextureInfo, TextureOptions};
use crate::formats::vertex::{decode_vertices, VertexLayout, VertexRecord};
use crate::formats::xdb::{read_xdb, Material, ModelElement, XdbDocument};
use crate::mesh::LodMesh;

/// A texture decoded from its XDB and `.bin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedTexture {
    /// The texture XDB.
    pub source: PathBuf,
    /// The compressed stream that was decoded.
    pub binary: PathBuf,
    pub info: TextureInfo,
    /// DDS file bytes.
    pub dds: Vec<u8>,
}

/// Textures decoded so far, keyed by texture XDB path.
///
/// Owned by the caller and passed to each import, so materials sharing a
/// texture decode it once.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: HashMap<PathBuf, Arc<ConvertedTexture>>,
}

impl TextureCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, texture_xdb: &Path) -> Option<Arc<ConvertedTexture>> {
        self.entries.get(texture_xdb).cloned()
    }

    /// Return the cached texture or decode and remember it.
    ///
    /// # Errors
    /// See [`convert_texture`]. Failures are not cached.
    pub fn get_or_convert(
        &mut self,
        texture_xdb: &Path,
        base_dir: &Path,
        options: &TextureOptions,
    ) -> Result<Arc<ConvertedTexture>> {
        match self.entries.entry(texture_xdb.to_path_buf()) {
            Entry::Occupied(entry) => {
                tracing::debug!("Texture cache hit: {}", texture_xdb.display());
                Ok(Arc::clone(entry.get()))
            }
            Entry::Vacant(entry) => {
                let texture = Arc::new(convert_texture(texture_xdb, base_dir, options)?);
                Ok(Arc::clone(entry.insert(texture)))
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Arc<ConvertedTexture>)> {
        self.entries.iter().map(|(path, texture)| (path.as_path(), texture))
    }
}

/// One assembled LOD of a model element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedLod {
    pub lod: usize,
    pub fragment: GeometryFragment,
    pub mesh: LodMesh,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedElement {
    pub name: String,
    pub material_name: String,
    pub material: Material,
    pub lods: Vec<ImportedLod>,
    /// Texture XDB of the diffuse texture, when it decoded successfully.
    /// The bytes live in the [`TextureCache`].
    pub diffuse_texture: Option<PathBuf>,
}

/// Result of [`import_model`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedModel {
    /// File name up to the first `.`
    pub name: String,
    pub base_dir: PathBuf,
    pub elements: Vec<ImportedElement>,
    pub skeleton: Skeleton,
    /// Bones kept by the slot filter, as skeleton indices.
    pub bones: Vec<usize>,
    /// Non-fatal problems, such as textures that failed to decode.
    pub warnings: Vec<String>,
}

/// Resource root for a `.bin` whose `binaryFile` href is `binary_file`:
/// one directory up per href component.
///
/// Returns `None` if `bin_path` is not deep enough.
#[must_use]
pub fn resolve_base_dir(bin_path: &Path, binary_file: &str) -> Option<PathBuf> {
    let depth = Path::new(binary_file.trim_matches('/'))
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count();
    bin_path.ancestors().nth(depth).map(Path::to_path_buf)
}

/// Resource root of an asset, from its XDB path and `binaryFile` href.
///
/// The `.bin` is taken to sit next to the XDB.
///
/// # Errors
/// Returns [`Error::MissingBinaryFile`] without an href, or
/// [`Error::InvalidXdbValue`] if the href is deeper than the path.
pub fn base_dir_for(xdb_path: &Path, doc: &XdbDocument) -> Result<PathBuf> {
    let binary_file = doc.binary_file().ok_or_else(|| Error::MissingBinaryFile {
        path: xdb_path.to_path_buf(),
    })?;
    resolve_base_dir(&xdb_path.with_extension("bin"), binary_file).ok_or_else(|| Error::InvalidXdbValue {
        path: "binaryFile".to_string(),
        value: binary_file.to_string(),
    })
}

/// Decode a texture XDB and its `.bin` into a DDS file.
///
/// # Errors
/// Returns an error if the XDB cannot be read, lacks texture fields or a
/// `binaryFile`, or if the stream fails to decode.
pub fn convert_texture(texture_xdb: &Path, base_dir: &Path, options: &TextureOptions) -> Result<ConvertedTexture> {
    let doc = read_xdb(texture_xdb)?;
    let info = doc.texture_info()?;
    let binary_file = doc.binary_file().ok_or_else(|| Error::MissingBinaryFile {
        path: texture_xdb.to_path_buf(),
    })?;
    let binary = base_dir.join(binary_file);

    tracing::info!("Loading texture: {}", binary.display());
    let stream = std::fs::read(&binary)?;
    let dds = decode_texture(&stream, &info, options)?;

    Ok(ConvertedTexture {
        source: texture_xdb.to_path_buf(),
        binary,
        info,
        dds,
    })
}

fn missing(path: &str) -> Error {
    Error::MissingXdbField {
        path: path.to_string(),
    }
}

/// Model name from an XDB path, cut at the first `.`
fn model_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.split('.').next().map(str::to_string))
        .unwrap_or_default()
}

/// Import a geometry XDB and its `.bin` sibling.
///
/// # Errors
/// Returns [`Error::NoLods`] when the LOD selection matches nothing, and
/// any error from reading or decoding the model's buffers. Texture
/// failures are collected in [`ImportedModel::warnings`] instead.
pub fn import_model(xdb_path: &Path, options: &ImportOptions, cache: &mut TextureCache) -> Result<ImportedModel> {
    let xdb_path = std::path::absolute(xdb_path)?;
    let doc = read_xdb(&xdb_path)?;

    let base_dir = base_dir_for(&xdb_path, &doc)?;
    tracing::info!("Resource dir: {}", base_dir.display());

    let container = Container::open(xdb_path.with_extension("bin"))?;
    let model = decode_model(&doc, &container)?;

    let lod_count = model.elements.iter().map(|e| e.lods.len()).min().unwrap_or(0);
    let selected: Vec<usize> = (0..lod_count).filter(|&lod| options.lods.includes(lod)).collect();
    if selected.is_empty() {
        return Err(Error::NoLods { path: xdb_path });
    }

    let mut warnings = Vec::new();
    let mut elements = Vec::with_capacity(model.elements.len());
    for element in &model.elements {
        let vertices = model.vertices_for(element)?;
        let lods = selected
            .iter()
            .map(|&lod| {
                let fragment = element.lods[lod];
                let mesh = LodMesh::build(vertices, &model.triangles, &fragment)?;
                Ok(ImportedLod { lod, fragment, mesh })
            })
            .collect::<Result<Vec<_>>>()?;

        let diffuse_texture = match (&element.material.diffuse_texture, options.load_textures) {
            (Some(texture), true) => {
                let texture_xdb = base_dir.join(texture);
                match cache.get_or_convert(&texture_xdb, &base_dir, &options.texture) {
                    Ok(_) => Some(texture_xdb),
                    Err(e) => {
                        tracing::warn!("Failed to load texture {}: {}", texture_xdb.display(), e);
                        warnings.push(format!("Failed to load texture {}: {e}", texture_xdb.display()));
                        None
                    }
                }
            }
            _ => None,
        };

        elements.push(ImportedElement {
            name: element.name.clone(),
            material_name: element.material_name.clone(),
            material: element.material.clone(),
            lods,
            diffuse_texture,
        });
    }

    let bones = model.skeleton.visible_bones(options.include_slot_bones);
    tracing::debug!(
        "Imported {}: {} elements, LODs {:?}, {} of {} bones",
        xdb_path.display(),
        elements.len(),
        selected,
        bones.len(),
        model.skeleton.len()
    );

    Ok(ImportedModel {
        name: model_name(&xdb_path),
        base_dir,
        elements,
        skeleton: model.skeleton,
        bones,
        warnings,
    })
}

/// Buffers of a model decoded from its container.
#[derive(Debug)]
pub struct DecodedModel {
    pub declarations: Vec<VertexLayout>,
    pub elements: Vec<ModelElement>,
    pub triangles: Vec<Triangle>,
    pub skeleton: Skeleton,
    /// Whole vertex buffer decoded once per declaration in use.
    vertices: HashMap<usize, Vec<VertexRecord>>,
}

impl DecodedModel {
    /// Decoded vertex sequence an element's triangles index into.
    ///
    /// Triangle indices are absolute into the vertex buffer, so every
    /// element sharing a declaration sees the same sequence.
    ///
    /// # Errors
    /// Returns [`Error::InvalidXdbValue`] if the element's declaration is not
    /// among the decoded ones.
    pub fn vertices_for(&self, element: &ModelElement) -> Result<&[VertexRecord]> {
        self.vertices
            .get(&element.vertex_declaration_id)
            .map(Vec::as_slice)
            .ok_or_else(|| invalid_declaration(element.vertex_declaration_id))
    }
}

fn invalid_declaration(id: usize) -> Error {
    Error::InvalidXdbValue {
        path: "vertexDeclarationID".to_string(),
        value: id.to_string(),
    }
}

/// Decode every buffer a geometry XDB references.
///
/// The vertex buffer is decoded from its start with each declaration the
/// elements use. `vertexBufferOffset` does not shift decoding.
///
/// # Errors
/// Returns an error if a buffer reference is missing or out of range, or
/// if any decoder fails. The skeleton hierarchy is validated.
pub fn decode_model(doc: &XdbDocument, container: &Container) -> Result<DecodedModel> {
    let declarations = doc.vertex_declarations()?;
    let elements = doc.model_elements()?;

    let vertex_buffer = container.extract(doc.vertex_buffer()?.ok_or_else(|| missing("vertexBuffer"))?)?;
    let index_buffer = container.extract(doc.index_buffer()?.ok_or_else(|| missing("indexBuffer"))?)?;
    let triangles = decode_triangles(index_buffer);

    let skeleton = match doc.skeleton()? {
        Some(blob) => Skeleton::decode(container.extract(blob)?)?,
        None => Skeleton::default(),
    };
    skeleton.validate()?;

    let mut vertices = HashMap::new();
    for element in &elements {
        let id = element.vertex_declaration_id;
        if let Entry::Vacant(entry) = vertices.entry(id) {
            let layout = declarations.get(id).ok_or_else(|| invalid_declaration(id))?;
            entry.insert(decode_vertices(layout, vertex_buffer)?);
        }
    }

    tracing::debug!(
        "Decoded model buffers: {} declarations, {} elements, {} triangles, {} bones",
        declarations.len(),
        elements.len(),
        triangles.len(),
        skeleton.len()
    );

    Ok(DecodedModel {
        declarations,
        elements,
        triangles,
        skeleton,
        vertices,
    })
}
