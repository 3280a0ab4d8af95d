//! XDB metadata files
//!
//! An XDB is the XML half of an asset. For a model it lists the vertex
//! declarations, the [`BlobRef`]s of the vertex, index and skeleton buffers
//! inside the paired `.bin`, and the model elements with their LODs and
//! materials. For a texture it gives the dimensions and pixel format.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

mod element;
mod model;

use std::path::Path;
use std::str::FromStr;

use crate::container::BlobRef;
use crate::error::{Error, Result};
use crate::formats::index::GeometryFragment;
use crate::formats::texture::TextureInfo;
use crate::formats::vertex::{VertexComponent, VertexElementType, VertexLayout};

pub use element::{parse_xdb_tree, read_xdb_tree, XdbElement};
pub use model::{parse_bool, resource_path, BlendEffect, Material, ModelElement};

/// Element type tag marking an unused declaration slot.
const UNUSED_TYPE: &str = "UNUSED";

/// A parsed XDB file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XdbDocument {
    pub root: XdbElement,
}

/// Read an XDB file from disk.
///
/// # Errors
/// Returns an error if the file cannot be read or has invalid XML.
pub fn read_xdb<P: AsRef<Path>>(path: P) -> Result<XdbDocument> {
    Ok(XdbDocument {
        root: read_xdb_tree(path)?,
    })
}

fn required<'a>(element: &'a XdbElement, path: &str) -> Result<&'a str> {
    element.find_text(path).ok_or_else(|| Error::MissingXdbField {
        path: path.to_string(),
    })
}

fn parse_value<T: FromStr>(path: &str, text: &str) -> Result<T> {
    text.parse().map_err(|_| Error::InvalidXdbValue {
        path: path.to_string(),
        value: text.to_string(),
    })
}

fn required_value<T: FromStr>(element: &XdbElement, path: &str) -> Result<T> {
    parse_value(path, required(element, path)?)
}

fn optional_bool(element: &XdbElement, path: &str, default: bool) -> Result<bool> {
    element
        .find_text(path)
        .map_or(Ok(default), |text| parse_bool(path, text))
}

fn optional_f32(element: &XdbElement, path: &str, default: f32) -> Result<f32> {
    element
        .find_text(path)
        .map_or(Ok(default), |text| parse_value(path, text))
}

fn href<'a>(element: &'a XdbElement, path: &str) -> Option<&'a str> {
    element.find(path).and_then(|e| e.attribute("href"))
}

impl XdbDocument {
    /// Parse XDB text.
    ///
    /// # Errors
    /// Returns an error if the XML is malformed.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(Self {
            root: parse_xdb_tree(content)?,
        })
    }

    fn blob(&self, tag: &str) -> Result<Option<BlobRef>> {
        let Some(element) = self.root.find(tag) else {
            return Ok(None);
        };
        let container_id = required_value(element, "localID").map_err(|e| scoped(tag, e))?;
        let byte_length = required_value(element, "size").map_err(|e| scoped(tag, e))?;
        Ok(Some(BlobRef::new(container_id, byte_length)))
    }

    /// The `vertexBuffer` reference, if present.
    ///
    /// # Errors
    /// Returns an error if `localID` or `size` is missing or not a number.
    pub fn vertex_buffer(&self) -> Result<Option<BlobRef>> {
        self.blob("vertexBuffer")
    }

    /// The `indexBuffer` reference, if present.
    ///
    /// # Errors
    /// Same as [`XdbDocument::vertex_buffer`].
    pub fn index_buffer(&self) -> Result<Option<BlobRef>> {
        self.blob("indexBuffer")
    }

    /// The `skeleton` reference, if present.
    ///
    /// # Errors
    /// Same as [`XdbDocument::vertex_buffer`].
    pub fn skeleton(&self) -> Result<Option<BlobRef>> {
        self.blob("skeleton")
    }

    /// Vertex declarations in file order; model elements refer to them by position.
    ///
    /// # Errors
    /// Returns an error for a missing stride, a bad offset or an unknown
    /// element type.
    pub fn vertex_declarations(&self) -> Result<Vec<VertexLayout>> {
        self.root
            .find_all("vertexDeclarations/Item")
            .into_iter()
            .map(|item| {
                let stride = required_value(item, "stride")?;
                Ok(VertexLayout {
                    position: vertex_component(item, "position")?,
                    normal: vertex_component(item, "normal")?,
                    color: vertex_component(item, "color")?,
                    texcoord0: vertex_component(item, "texcoord0")?,
                    texcoord1: vertex_component(item, "texcoord1")?,
                    weights: vertex_component(item, "weights")?,
                    indices: vertex_component(item, "indices")?,
                    stride,
                })
            })
            .collect()
    }

    /// Model elements in file order.
    ///
    /// # Errors
    /// Returns an error if a required field is missing or malformed.
    pub fn model_elements(&self) -> Result<Vec<ModelElement>> {
        self.root
            .find_all("modelElements/Item")
            .into_iter()
            .map(|item| {
                let lods = item
                    .find_all("lods/Item")
                    .into_iter()
                    .map(geometry_fragment)
                    .collect::<Result<Vec<_>>>()?;
                let material = match item.find("material") {
                    Some(material) => parse_material(material)?,
                    None => Material::default(),
                };

                Ok(ModelElement {
                    name: item.find_text("name").unwrap_or_default().to_string(),
                    material_name: item.find_text("materialName").unwrap_or_default().to_string(),
                    material,
                    lods,
                    skin_index: required_value(item, "skinIndex")?,
                    vertex_buffer_offset: required_value(item, "vertexBufferOffset")?,
                    vertex_declaration_id: required_value(item, "vertexDeclarationID")?,
                    virtual_offset: optional_f32(item, "virtualOffset", 0.0)?,
                })
            })
            .collect()
    }

    /// Path of the paired binary, relative to the resource root.
    #[must_use]
    pub fn binary_file(&self) -> Option<&str> {
        href(&self.root, "binaryFile").map(|h| h.trim_matches('/'))
    }

    /// Dimensions and pixel format of a texture XDB.
    ///
    /// # Errors
    /// Returns an error if `width`, `height` or `type` is missing or invalid.
    pub fn texture_info(&self) -> Result<TextureInfo> {
        Ok(TextureInfo {
            width: required_value(&self.root, "width")?,
            height: required_value(&self.root, "height")?,
            pixel_format: required(&self.root, "type")?.parse()?,
        })
    }
}

fn scoped(parent: &str, err: Error) -> Error {
    match err {
        Error::MissingXdbField { path } => Error::MissingXdbField {
            path: format!("{parent}/{path}"),
        },
        Error::InvalidXdbValue { path, value } => Error::InvalidXdbValue {
            path: format!("{parent}/{path}"),
            value,
        },
        other => other,
    }
}

fn vertex_component(item: &XdbElement, slot: &str) -> Result<Option<VertexComponent>> {
    let Some(element) = item.find(slot) else {
        return Ok(None);
    };
    let Some(type_name) = element.find_text("type") else {
        return Ok(None);
    };
    if type_name.eq_ignore_ascii_case(UNUSED_TYPE) {
        return Ok(None);
    }

    let element_type = VertexElementType::from_str(type_name)?;
    let byte_offset = required_value(element, "offset").map_err(|e| scoped(slot, e))?;
    Ok(Some(VertexComponent::new(element_type, byte_offset)))
}

fn geometry_fragment(lod: &XdbElement) -> Result<GeometryFragment> {
    Ok(GeometryFragment::new(
        required_value(lod, "vertexBufferBegin")?,
        required_value(lod, "vertexBufferEnd")?,
        required_value(lod, "indexBufferBegin")?,
        required_value(lod, "indexBufferEnd")?,
    ))
}

fn parse_material(xml: &XdbElement) -> Result<Material> {
    Ok(Material {
        blend_effect: xml.find_text("BlendEffect").map(BlendEffect::from).unwrap_or_default(),
        diffuse_texture: href(xml, "diffuseTexture")
            .map(resource_path)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        scroll_alpha: optional_bool(xml, "scrollAlpha", true)?,
        scroll_rgb: optional_bool(xml, "ScrollRGB", true)?,
        transparency_texture: href(xml, "transparencyTexture").map(str::to_string),
        transparent: optional_bool(xml, "transparent", true)?,
        use_fog: optional_bool(xml, "useFog", true)?,
        u_translate_speed: optional_f32(xml, "uTranslateSpeed", 0.0)?,
        visible: optional_bool(xml, "visible", true)?,
        v_translate_speed: optional_f32(xml, "vTranslateSpeed", 0.0)?,
    })
}
