//! Layout-driven vertex buffer decoding.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use byteorder::{ByteOrder, LittleEndian};
use half::f16;
use rayon::prelude::*;
use serde::Serialize;
use smallvec::SmallVec;

use super::types::{VertexComponent, VertexElementType, VertexLayout};
use crate::error::{Error, Result};

/// Bone weights or indices of one vertex (at most 4).
pub type Influences<T> = SmallVec<[T; 4]>;

/// A decoded vertex. Attributes missing from the layout stay zero/empty.
///
/// Two records are equal when every decoded field compares equal; LOD
/// assembly relies on this to merge duplicated vertices.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VertexRecord {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [u8; 4],
    pub texcoord0: [f32; 2],
    pub texcoord1: [f32; 2],
    pub weights: Influences<f32>,
    pub bone_indices: Influences<u16>,
}

/// Hashable form of a [`VertexRecord`] with the same equality, except that
/// `-0.0` and `0.0` share a key and NaNs compare by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexKey {
    floats: SmallVec<[u32; 14]>,
    color: [u8; 4],
    bone_indices: Influences<u16>,
}

#[allow(clippy::float_cmp)]
fn float_key(value: f32) -> u32 {
    if value == 0.0 { 0 } else { value.to_bits() }
}

impl VertexRecord {
    #[must_use]
    pub fn key(&self) -> VertexKey {
        let floats = self
            .position
            .iter()
            .chain(&self.normal)
            .chain(&self.texcoord0)
            .chain(&self.texcoord1)
            .chain(&self.weights)
            .copied()
            .map(float_key)
            .collect();
        VertexKey {
            floats,
            color: self.color,
            bone_indices: self.bone_indices.clone(),
        }
    }
}

/// Read an element as up to four float lanes.
///
/// Integer encodings keep their integer value unless they are normalized
/// (`*N` types and `COLOR`).
fn read_lanes(element_type: VertexElementType, raw: &[u8]) -> [f32; 4] {
    let mut out = [0.0f32; 4];
    match element_type {
        VertexElementType::FLOAT1
        | VertexElementType::FLOAT2
        | VertexElementType::FLOAT3
        | VertexElementType::FLOAT4 => {
            for (i, lane) in out.iter_mut().take(element_type.lanes()).enumerate() {
                *lane = LittleEndian::read_f32(&raw[i * 4..]);
            }
        }
        VertexElementType::FLOAT16_2 | VertexElementType::FLOAT16_4 => {
            for (i, lane) in out.iter_mut().take(element_type.lanes()).enumerate() {
                *lane = f16::from_bits(LittleEndian::read_u16(&raw[i * 2..])).to_f32();
            }
        }
        VertexElementType::UBYTE4 => {
            for (lane, &b) in out.iter_mut().zip(raw) {
                *lane = f32::from(b);
            }
        }
        VertexElementType::COLOR | VertexElementType::UBYTE4N => {
            for (lane, &b) in out.iter_mut().zip(raw) {
                *lane = f32::from(b) / 255.0;
            }
        }
        VertexElementType::SHORT2 | VertexElementType::SHORT4 => {
            for (i, lane) in out.iter_mut().take(element_type.lanes()).enumerate() {
                *lane = f32::from(LittleEndian::read_i16(&raw[i * 2..]));
            }
        }
        VertexElementType::SHORT2N | VertexElementType::SHORT4N => {
            for (i, lane) in out.iter_mut().take(element_type.lanes()).enumerate() {
                *lane = (f32::from(LittleEndian::read_i16(&raw[i * 2..])) / 32767.0).max(-1.0);
            }
        }
        VertexElementType::USHORT2N | VertexElementType::USHORT4N => {
            for (i, lane) in out.iter_mut().take(element_type.lanes()).enumerate() {
                *lane = f32::from(LittleEndian::read_u16(&raw[i * 2..])) / 65535.0;
            }
        }
        VertexElementType::DEC3N => {
            let packed = LittleEndian::read_u32(raw);
            for (i, lane) in out.iter_mut().take(3).enumerate() {
                let bits = (packed >> (i * 10)) & 0x3FF;
                // Sign-extend the 10-bit lane
                let signed = ((bits << 22) as i32) >> 22;
                *lane = (signed as f32 / 511.0).max(-1.0);
            }
        }
    }
    out
}

/// Bytes of one component. The layout is validated, so the range is in bounds.
fn component_bytes(component: VertexComponent, record: &[u8]) -> &[u8] {
    &record[component.byte_offset..][..component.element_type.size()]
}

fn first_lanes<const N: usize>(component: VertexComponent, record: &[u8]) -> [f32; N] {
    let lanes = read_lanes(component.element_type, component_bytes(component, record));
    let mut out = [0.0f32; N];
    out.copy_from_slice(&lanes[..N]);
    out
}

fn read_color(component: VertexComponent, record: &[u8]) -> [u8; 4] {
    let raw = component_bytes(component, record);
    if component.element_type.is_byte_packed() {
        [raw[0], raw[1], raw[2], raw[3]]
    } else {
        let lanes = read_lanes(component.element_type, raw);
        lanes.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
}

fn read_weights(component: VertexComponent, record: &[u8]) -> Influences<f32> {
    let raw = component_bytes(component, record);
    let count = component.element_type.lanes();
    if component.element_type.is_byte_packed() {
        raw.iter().take(count).map(|&b| f32::from(b) / 255.0).collect()
    } else {
        read_lanes(component.element_type, raw)[..count].iter().copied().collect()
    }
}

fn read_bone_indices(component: VertexComponent, record: &[u8]) -> Influences<u16> {
    let raw = component_bytes(component, record);
    let count = component.element_type.lanes();
    if component.element_type.is_byte_packed() {
        raw.iter().take(count).map(|&b| u16::from(b)).collect()
    } else {
        read_lanes(component.element_type, raw)[..count]
            .iter()
            .map(|&v| v as u16)
            .collect()
    }
}

/// Decode a single record. `record` must be exactly one stride long and the
/// layout must already be validated.
fn decode_record(layout: &VertexLayout, record: &[u8]) -> VertexRecord {
    let mut vertex = VertexRecord::default();

    if let Some(c) = layout.position {
        vertex.position = first_lanes(c, record);
    }
    if let Some(c) = layout.normal {
        vertex.normal = first_lanes(c, record);
    }
    if let Some(c) = layout.color {
        vertex.color = read_color(c, record);
    }
    if let Some(c) = layout.texcoord0 {
        vertex.texcoord0 = first_lanes(c, record);
    }
    if let Some(c) = layout.texcoord1 {
        vertex.texcoord1 = first_lanes(c, record);
    }
    if let Some(c) = layout.weights {
        vertex.weights = read_weights(c, record);
    }
    if let Some(c) = layout.indices {
        vertex.bone_indices = read_bone_indices(c, record);
    }

    vertex
}

/// Decode every whole record of `buffer` using `layout`.
///
/// Returns `len / stride` records; a trailing partial record is dropped.
/// An empty buffer yields no records.
///
/// # Errors
/// Returns [`Error::MalformedLayout`] if the layout does not fit its stride,
/// or [`Error::TruncatedBuffer`] if a non-empty buffer is shorter than one record.
pub fn decode_vertices(layout: &VertexLayout, buffer: &[u8]) -> Result<Vec<VertexRecord>> {
    layout.validate()?;

    if !buffer.is_empty() && buffer.len() < layout.stride {
        return Err(Error::TruncatedBuffer {
            stride: layout.stride,
            actual: buffer.len(),
        });
    }

    let trailing = buffer.len() % layout.stride;
    if trailing != 0 {
        tracing::warn!(
            "Vertex buffer has {} trailing bytes after {} records (stride {})",
            trailing,
            buffer.len() / layout.stride,
            layout.stride
        );
    }

    let vertices: Vec<VertexRecord> = buffer
        .par_chunks_exact(layout.stride)
        .map(|record| decode_record(layout, record))
        .collect();

    tracing::debug!("Decoded {} vertices (stride {})", vertices.len(), layout.stride);

    Ok(vertices)
}
