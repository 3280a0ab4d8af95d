//! Skeleton buffer parsing.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{Bone, Skeleton};
use crate::error::{Error, Result};

/// Width of the NUL-padded bone name field.
pub const BONE_NAME_SIZE: usize = 64;

/// Size of one bone record: name, embedded id, parent, two 4x4 matrices.
pub const BONE_RECORD_SIZE: usize = BONE_NAME_SIZE + 2 + 2 + 64 + 64;

const HEADER_SIZE: usize = 4;

fn read_matrix(cursor: &mut Cursor<&[u8]>) -> Result<[f32; 16]> {
    let mut m = [0.0f32; 16];
    cursor.read_f32_into::<LittleEndian>(&mut m)?;
    Ok(m)
}

fn read_name(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let mut raw = [0u8; BONE_NAME_SIZE];
    cursor.read_exact(&mut raw)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(BONE_NAME_SIZE);
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

impl Skeleton {
    /// Parse a skeleton buffer.
    ///
    /// Bones are returned in file order; a bone's position in that order is
    /// its identity for parent references. The id stored inside each record
    /// is skipped.
    ///
    /// # Errors
    /// Returns [`Error::MalformedRecord`] if the buffer ends inside the
    /// header or a bone record.
    pub fn decode(buffer: &[u8]) -> Result<Self> {
        if buffer.is_empty() {
            return Ok(Self::default());
        }
        if buffer.len() < HEADER_SIZE {
            return Err(Error::MalformedRecord {
                index: 0,
                offset: 0,
                expected: HEADER_SIZE,
                actual: buffer.len(),
            });
        }

        let mut cursor = Cursor::new(buffer);
        let bone_count = cursor.read_u32::<LittleEndian>()? as usize;
        let mut bones = Vec::with_capacity(bone_count.min(buffer.len() / BONE_RECORD_SIZE));

        for index in 0..bone_count {
            let offset = HEADER_SIZE + index * BONE_RECORD_SIZE;
            let actual = buffer.len().saturating_sub(offset);
            if actual < BONE_RECORD_SIZE {
                return Err(Error::MalformedRecord {
                    index,
                    offset,
                    expected: BONE_RECORD_SIZE,
                    actual,
                });
            }

            let name = read_name(&mut cursor)?;
            let _embedded_id = cursor.read_u16::<LittleEndian>()?;
            let parent_index = cursor.read_u16::<LittleEndian>()?;
            let local_matrix = read_matrix(&mut cursor)?;
            let inverse_world_matrix = read_matrix(&mut cursor)?;

            bones.push(Bone {
                name,
                parent_index,
                local_matrix,
                inverse_world_matrix,
            });
        }

        let trailing = buffer.len() - HEADER_SIZE - bone_count * BONE_RECORD_SIZE;
        if trailing > 0 {
            tracing::debug!("Skeleton buffer has {} trailing bytes", trailing);
        }
        tracing::debug!("Decoded skeleton with {} bones", bones.len());

        Ok(Self { bones })
    }
}
