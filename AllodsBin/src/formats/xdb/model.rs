//! Model elements and materials described by a geometry XDB.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::formats::index::GeometryFragment;

/// How a material blends with what is behind it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum BlendEffect {
    #[default]
    Add,
    AddSmooth,
    Mul,
    Mul2x,
    Blend,
    Opaque,
    /// A tag this library has no name for; kept verbatim.
    Other(String),
}

impl BlendEffect {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Add => "BLEND_EFFECT_ADD",
            Self::AddSmooth => "BLEND_EFFECT_ADD_SMOOTH",
            Self::Mul => "BLEND_EFFECT_MUL",
            Self::Mul2x => "BLEND_EFFECT_MUL2X",
            Self::Blend => "BLEND_EFFECT_BLEND",
            Self::Opaque => "BLEND_EFFECT_OPAQUE",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for BlendEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for BlendEffect {
    fn from(s: &str) -> Self {
        match s.trim() {
            "BLEND_EFFECT_ADD" => Self::Add,
            "BLEND_EFFECT_ADD_SMOOTH" => Self::AddSmooth,
            "BLEND_EFFECT_MUL" => Self::Mul,
            "BLEND_EFFECT_MUL2X" => Self::Mul2x,
            "BLEND_EFFECT_BLEND" => Self::Blend,
            "BLEND_EFFECT_OPAQUE" => Self::Opaque,
            other => {
                tracing::warn!("Unknown blend effect {other:?}, keeping it verbatim");
                Self::Other(other.to_string())
            }
        }
    }
}

/// Surface description attached to a model element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub blend_effect: BlendEffect,
    /// Texture XDB path relative to the resource root, without the `#fragment`.
    pub diffuse_texture: Option<String>,
    pub scroll_alpha: bool,
    pub scroll_rgb: bool,
    /// Raw href, as stored.
    pub transparency_texture: Option<String>,
    pub transparent: bool,
    pub use_fog: bool,
    pub u_translate_speed: f32,
    pub visible: bool,
    pub v_translate_speed: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            blend_effect: BlendEffect::Add,
            diffuse_texture: None,
            scroll_alpha: true,
            scroll_rgb: true,
            transparency_texture: None,
            transparent: true,
            use_fog: true,
            u_translate_speed: 0.0,
            visible: true,
            v_translate_speed: 0.0,
        }
    }
}

/// A named part of a model: one material, one vertex declaration and a
/// geometry fragment per LOD.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelElement {
    pub name: String,
    pub material_name: String,
    pub material: Material,
    pub lods: Vec<GeometryFragment>,
    pub skin_index: i32,
    /// Byte offset of this element's vertices inside the vertex buffer.
    pub vertex_buffer_offset: usize,
    pub vertex_declaration_id: usize,
    pub virtual_offset: f32,
}

/// Parse an XDB boolean.
///
/// # Errors
/// Returns [`Error::InvalidXdbValue`] for anything but the usual yes/no spellings.
pub fn parse_bool(path: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(Error::InvalidXdbValue {
            path: path.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Strip the `#fragment` and leading slashes from a resource href.
#[must_use]
pub fn resource_path(href: &str) -> &str {
    let path = href.split('#').next().unwrap_or(href);
    path.trim_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        for yes in ["true", "True", "YES", "on", "1", "t", "y"] {
            assert!(parse_bool("visible", yes).unwrap(), "{yes}");
        }
        for no in ["false", "No", "off", "0", "f", "n"] {
            assert!(!parse_bool("visible", no).unwrap(), "{no}");
        }
        assert!(matches!(
            parse_bool("visible", "maybe"),
            Err(Error::InvalidXdbValue { .. })
        ));
    }

    #[test]
    fn test_resource_path() {
        assert_eq!(resource_path("/Tex/Stone.xdb#xpointer(/Texture)"), "Tex/Stone.xdb");
        assert_eq!(resource_path("Tex/Stone.xdb"), "Tex/Stone.xdb");
        assert_eq!(resource_path(""), "");
    }

    #[test]
    fn test_blend_effect_names() {
        assert_eq!(BlendEffect::from("BLEND_EFFECT_MUL"), BlendEffect::Mul);
        let other = BlendEffect::from("BLEND_EFFECT_NEW");
        assert_eq!(other.to_string(), "BLEND_EFFECT_NEW");
        assert_eq!(Material::default().blend_effect, BlendEffect::Add);
    }
}
