//! Vertex element encodings and layout descriptors.

use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

/// Packed encoding of one vertex element.
///
/// Names follow the `type` text used by vertex declarations in XDB files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[allow(non_camel_case_types)]
pub enum VertexElementType {
    FLOAT1,
    FLOAT2,
    FLOAT3,
    FLOAT4,
    FLOAT16_2,
    FLOAT16_4,
    /// 4 bytes, stored order (B, G, R, A for D3D colors).
    COLOR,
    UBYTE4,
    UBYTE4N,
    SHORT2,
    SHORT4,
    SHORT2N,
    SHORT4N,
    USHORT2N,
    USHORT4N,
    /// Three signed normalized 10-bit lanes packed in a `u32`.
    DEC3N,
}

impl VertexElementType {
    /// Encoded size in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::FLOAT1
            | Self::FLOAT16_2
            | Self::COLOR
            | Self::UBYTE4
            | Self::UBYTE4N
            | Self::SHORT2
            | Self::SHORT2N
            | Self::USHORT2N
            | Self::DEC3N => 4,
            Self::FLOAT2 | Self::FLOAT16_4 | Self::SHORT4 | Self::SHORT4N | Self::USHORT4N => 8,
            Self::FLOAT3 => 12,
            Self::FLOAT4 => 16,
        }
    }

    /// Number of scalar lanes.
    #[must_use]
    pub const fn lanes(self) -> usize {
        match self {
            Self::FLOAT1 => 1,
            Self::FLOAT2 | Self::FLOAT16_2 | Self::SHORT2 | Self::SHORT2N | Self::USHORT2N => 2,
            Self::FLOAT3 | Self::DEC3N => 3,
            Self::FLOAT4
            | Self::FLOAT16_4
            | Self::COLOR
            | Self::UBYTE4
            | Self::UBYTE4N
            | Self::SHORT4
            | Self::SHORT4N
            | Self::USHORT4N => 4,
        }
    }

    /// Raw byte lanes (colors and bone indices are kept as bytes).
    #[must_use]
    pub const fn is_byte_packed(self) -> bool {
        matches!(self, Self::COLOR | Self::UBYTE4 | Self::UBYTE4N)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FLOAT1 => "FLOAT1",
            Self::FLOAT2 => "FLOAT2",
            Self::FLOAT3 => "FLOAT3",
            Self::FLOAT4 => "FLOAT4",
            Self::FLOAT16_2 => "FLOAT16_2",
            Self::FLOAT16_4 => "FLOAT16_4",
            Self::COLOR => "COLOR",
            Self::UBYTE4 => "UBYTE4",
            Self::UBYTE4N => "UBYTE4N",
            Self::SHORT2 => "SHORT2",
            Self::SHORT4 => "SHORT4",
            Self::SHORT2N => "SHORT2N",
            Self::SHORT4N => "SHORT4N",
            Self::USHORT2N => "USHORT2N",
            Self::USHORT4N => "USHORT4N",
            Self::DEC3N => "DEC3N",
        }
    }
}

impl FromStr for VertexElementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("D3DDECLTYPE_").unwrap_or(&upper);
        match name {
            "FLOAT1" => Ok(Self::FLOAT1),
            "FLOAT2" => Ok(Self::FLOAT2),
            "FLOAT3" => Ok(Self::FLOAT3),
            "FLOAT4" => Ok(Self::FLOAT4),
            "FLOAT16_2" => Ok(Self::FLOAT16_2),
            "FLOAT16_4" => Ok(Self::FLOAT16_4),
            "COLOR" | "D3DCOLOR" => Ok(Self::COLOR),
            "UBYTE4" => Ok(Self::UBYTE4),
            "UBYTE4N" => Ok(Self::UBYTE4N),
            "SHORT2" => Ok(Self::SHORT2),
            "SHORT4" => Ok(Self::SHORT4),
            "SHORT2N" => Ok(Self::SHORT2N),
            "SHORT4N" => Ok(Self::SHORT4N),
            "USHORT2N" => Ok(Self::USHORT2N),
            "USHORT4N" => Ok(Self::USHORT4N),
            "DEC3N" => Ok(Self::DEC3N),
            _ => Err(Error::UnknownElementType(s.to_string())),
        }
    }
}

/// Where one attribute lives inside a vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VertexComponent {
    pub element_type: VertexElementType,
    pub byte_offset: usize,
}

impl VertexComponent {
    #[must_use]
    pub const fn new(element_type: VertexElementType, byte_offset: usize) -> Self {
        Self {
            element_type,
            byte_offset,
        }
    }

    /// One past the last byte this component reads, relative to the record.
    ///
    /// `None` when the offset is so large the end does not fit a `usize`.
    #[must_use]
    pub const fn end(&self) -> Option<usize> {
        self.byte_offset.checked_add(self.element_type.size())
    }
}

/// Per-file vertex declaration: optional semantic slots sharing one stride.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VertexLayout {
    pub position: Option<VertexComponent>,
    pub normal: Option<VertexComponent>,
    pub color: Option<VertexComponent>,
    pub texcoord0: Option<VertexComponent>,
    pub texcoord1: Option<VertexComponent>,
    pub weights: Option<VertexComponent>,
    pub indices: Option<VertexComponent>,
    pub stride: usize,
}

impl VertexLayout {
    #[must_use]
    pub fn new(stride: usize) -> Self {
        Self {
            stride,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_position(mut self, component: VertexComponent) -> Self {
        self.position = Some(component);
        self
    }

    #[must_use]
    pub fn with_normal(mut self, component: VertexComponent) -> Self {
        self.normal = Some(component);
        self
    }

    #[must_use]
    pub fn with_color(mut self, component: VertexComponent) -> Self {
        self.color = Some(component);
        self
    }

    #[must_use]
    pub fn with_texcoord0(mut self, component: VertexComponent) -> Self {
        self.texcoord0 = Some(component);
        self
    }

    #[must_use]
    pub fn with_texcoord1(mut self, component: VertexComponent) -> Self {
        self.texcoord1 = Some(component);
        self
    }

    #[must_use]
    pub fn with_weights(mut self, component: VertexComponent) -> Self {
        self.weights = Some(component);
        self
    }

    #[must_use]
    pub fn with_indices(mut self, component: VertexComponent) -> Self {
        self.indices = Some(component);
        self
    }

    /// Declared components with their semantic names, in declaration order.
    pub fn components(&self) -> impl Iterator<Item = (&'static str, VertexComponent)> + '_ {
        [
            ("position", self.position),
            ("normal", self.normal),
            ("color", self.color),
            ("texcoord0", self.texcoord0),
            ("texcoord1", self.texcoord1),
            ("weights", self.weights),
            ("indices", self.indices),
        ]
        .into_iter()
        .filter_map(|(name, component)| component.map(|c| (name, c)))
    }

    /// Check that every component fits inside the stride.
    ///
    /// # Errors
    /// Returns [`Error::MalformedLayout`] for the first component that does not fit.
    pub fn validate(&self) -> Result<()> {
        if self.stride == 0 {
            return Err(Error::MalformedLayout {
                component: "stride",
                offset: 0,
                size: 0,
                stride: 0,
            });
        }
        for (name, component) in self.components() {
            if component.end().is_none_or(|end| end > self.stride) {
                return Err(Error::MalformedLayout {
                    component: name,
                    offset: component.byte_offset,
                    size: component.element_type.size(),
                    stride: self.stride,
                });
            }
        }
        Ok(())
    }
}
