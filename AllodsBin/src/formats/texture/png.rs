//! DDS to PNG conversion for the DXT formats written by this crate.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use ddsfile::{D3DFormat, Dds};
use image::{ImageBuffer, RgbaImage};

use super::PixelFormat;
use crate::error::{Error, Result};

/// Pitch of one decoded 4x4 block row, 4 pixels * 4 bytes.
const BLOCK_PITCH: usize = 16;

/// Parse DDS bytes and decode the top level to RGBA8.
///
/// # Errors
/// Returns [`Error::DdsError`] if the header does not parse and
/// [`Error::UnsupportedPixelFormat`] for anything other than DXT1/3/5.
pub fn dds_to_rgba(dds_data: &[u8]) -> Result<(u32, u32, Vec<u8>)> {
    let dds = Dds::read(&mut std::io::Cursor::new(dds_data))
        .map_err(|e| Error::DdsError(format!("Failed to parse DDS: {e}")))?;

    let format = match dds.get_d3d_format() {
        Some(D3DFormat::DXT1) => PixelFormat::Dxt1,
        Some(D3DFormat::DXT3) => PixelFormat::Dxt3,
        Some(D3DFormat::DXT5) => PixelFormat::Dxt5,
        other => return Err(Error::UnsupportedPixelFormat(format!("{other:?}"))),
    };

    let data = dds
        .get_data(0)
        .map_err(|e| Error::DdsError(format!("No DDS data: {e}")))?;
    let rgba = decode_blocks(data, dds.get_width() as usize, dds.get_height() as usize, format);
    Ok((dds.get_width(), dds.get_height(), rgba))
}

/// Encode the top level of a DDS image as PNG.
///
/// # Errors
/// See [`dds_to_rgba`]; also [`Error::PngEncodeFailed`].
pub fn dds_to_png(dds_data: &[u8]) -> Result<Vec<u8>> {
    let (width, height, rgba) = dds_to_rgba(dds_data)?;

    let img: RgbaImage = ImageBuffer::from_raw(width, height, rgba)
        .ok_or_else(|| Error::DdsError("Failed to create image buffer".to_string()))?;

    let mut png_data = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_data);
    img.write_with_encoder(encoder).map_err(|e| Error::PngEncodeFailed {
        message: e.to_string(),
    })?;

    Ok(png_data)
}

fn decode_blocks(data: &[u8], width: usize, height: usize, format: PixelFormat) -> Vec<u8> {
    let mut rgba = vec![0u8; width * height * 4];
    let blocks_x = width.div_ceil(4);
    let block_size = format.block_size();
    let mut block_rgba = [0u8; 64];

    for (n, block) in data.chunks_exact(block_size).enumerate() {
        let (bx, by) = (n % blocks_x.max(1), n / blocks_x.max(1));
        if by * 4 >= height {
            break;
        }

        match format {
            PixelFormat::Dxt1 => bcdec_rs::bc1(block, &mut block_rgba, BLOCK_PITCH),
            PixelFormat::Dxt3 => bcdec_rs::bc2(block, &mut block_rgba, BLOCK_PITCH),
            PixelFormat::Dxt5 => bcdec_rs::bc3(block, &mut block_rgba, BLOCK_PITCH),
        }

        for py in 0..4 {
            let fy = by * 4 + py;
            if fy >= height {
                break;
            }
            for px in 0..4 {
                let fx = bx * 4 + px;
                if fx >= width {
                    break;
                }
                let src = (py * 4 + px) * 4;
                let dst = (fy * width + fx) * 4;
                rgba[dst..dst + 4].copy_from_slice(&block_rgba[src..src + 4]);
            }
        }
    }

    rgba
}
