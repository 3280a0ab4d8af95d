//! Minimal DDS container assembly.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use byteorder::{LittleEndian, WriteBytesExt};

use super::PixelFormat;
use crate::error::Result;

pub const DDS_MAGIC: &[u8; 4] = b"DDS ";
pub const DDS_HEADER_SIZE: usize = 128;

const HEADER_STRUCT_SIZE: u32 = 124;
const PIXEL_FORMAT_SIZE: u32 = 32;

// CAPS | HEIGHT | WIDTH | PIXELFORMAT | MIPMAPCOUNT | LINEARSIZE
const HEADER_FLAGS: u32 = 0x000A1007;
const DDPF_FOURCC: u32 = 0x4;
// COMPLEX | TEXTURE | MIPMAP
const SURFACE_CAPS: u32 = 0x00401008;

/// Tool and vendor strings stored in the reserved area (44 bytes total).
const TOOL_NAME: &[u8] = b"Allods Blender Import ";
const TOOL_VERSION: &[u8; 10] = b"v0.1\0\0\0\0\0\0";
const VENDOR_NAME: &[u8; 12] = b"Elementarno\0";

/// Write a DDS header for a single-level texture followed by `payload`.
///
/// # Errors
/// Only fails if writing to the output buffer fails.
pub fn write_dds(width: u32, height: u32, format: PixelFormat, payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(DDS_HEADER_SIZE + payload.len());

    out.extend_from_slice(DDS_MAGIC);
    out.write_u32::<LittleEndian>(HEADER_STRUCT_SIZE)?;
    out.write_u32::<LittleEndian>(HEADER_FLAGS)?;
    out.write_u32::<LittleEndian>(height)?;
    out.write_u32::<LittleEndian>(width)?;
    out.write_u32::<LittleEndian>(payload.len() as u32)?;
    out.write_u32::<LittleEndian>(0)?; // depth
    out.write_u32::<LittleEndian>(1)?; // mip levels

    out.extend_from_slice(TOOL_NAME);
    out.extend_from_slice(TOOL_VERSION);
    out.extend_from_slice(VENDOR_NAME);

    out.write_u32::<LittleEndian>(PIXEL_FORMAT_SIZE)?;
    out.write_u32::<LittleEndian>(DDPF_FOURCC)?;
    out.extend_from_slice(format.fourcc());
    out.extend_from_slice(&[0u8; 20]); // bit count + RGBA masks

    out.write_u32::<LittleEndian>(SURFACE_CAPS)?;
    out.extend_from_slice(&[0u8; 16]); // caps2..caps4, reserved

    debug_assert_eq!(out.len(), DDS_HEADER_SIZE);
    out.extend_from_slice(payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddsfile::{D3DFormat, Dds};

    #[test]
    fn test_header_layout() {
        let dds = write_dds(8, 4, PixelFormat::Dxt5, &[0xAB; 32]).unwrap();

        assert_eq!(dds.len(), DDS_HEADER_SIZE + 32);
        assert_eq!(&dds[0..4], b"DDS ");
        assert_eq!(&dds[12..16], &4u32.to_le_bytes());
        assert_eq!(&dds[16..20], &8u32.to_le_bytes());
        assert_eq!(&dds[20..24], &32u32.to_le_bytes());
        assert_eq!(&dds[32..54], b"Allods Blender Import ");
        assert_eq!(&dds[64..75], b"Elementarno");
        assert_eq!(&dds[76..80], &32u32.to_le_bytes());
        assert_eq!(&dds[84..88], b"DXT5");
        assert_eq!(&dds[108..112], &[0x08, 0x10, 0x40, 0x00]);
        assert!(dds[DDS_HEADER_SIZE..].iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_standard_reader_accepts_header() {
        let bytes = write_dds(8, 8, PixelFormat::Dxt1, &[0u8; 32]).unwrap();
        let dds = Dds::read(&mut std::io::Cursor::new(&bytes)).unwrap();

        assert_eq!(dds.get_width(), 8);
        assert_eq!(dds.get_height(), 8);
        assert_eq!(dds.get_d3d_format(), Some(D3DFormat::DXT1));
        assert_eq!(dds.get_data(0).unwrap().len(), 32);
    }
}
