//! Compressed texture streams
//!
//! A texture `.bin` holds a 2-byte header and a raw deflate stream. The
//! inflated bytes carry every mip level, smallest first, behind a small
//! level table. Decoding rebuilds a DDS file from the largest level.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

mod dds;
mod levels;
mod patterns;
mod png;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

pub use dds::{write_dds, DDS_HEADER_SIZE, DDS_MAGIC};
pub use levels::{inflate, LevelTable, LEVEL_HEADER_SIZE, STREAM_HEADER_SIZE};
pub use patterns::BlockPatternStats;
pub use png::{dds_to_png, dds_to_rgba};

/// Block-compressed pixel formats a texture descriptor may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PixelFormat {
    /// BC1, 8 bytes per 4x4 block
    Dxt1,
    /// BC2, 16 bytes per 4x4 block
    Dxt3,
    /// BC3, 16 bytes per 4x4 block
    Dxt5,
}

impl PixelFormat {
    /// FourCC tag stored in the DDS pixel format.
    #[must_use]
    pub const fn fourcc(self) -> &'static [u8; 4] {
        match self {
            Self::Dxt1 => b"DXT1",
            Self::Dxt3 => b"DXT3",
            Self::Dxt5 => b"DXT5",
        }
    }

    #[must_use]
    pub const fn block_size(self) -> usize {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt3 | Self::Dxt5 => 16,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dxt1 => "DXT1",
            Self::Dxt3 => "DXT3",
            Self::Dxt5 => "DXT5",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PixelFormat {
    type Err = Error;

    /// Accepts `DXT1`, `FORMAT_DXT1` and similar, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_uppercase();
        let tag = tag.strip_prefix("FORMAT_").unwrap_or(&tag);
        match tag {
            "DXT1" => Ok(Self::Dxt1),
            "DXT3" => Ok(Self::Dxt3),
            "DXT5" => Ok(Self::Dxt5),
            _ => Err(Error::UnsupportedPixelFormat(s.to_string())),
        }
    }
}

/// Declared dimensions and format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
}

impl TextureInfo {
    #[must_use]
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            pixel_format,
        }
    }
}

/// Options for texture decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureOptions {
    /// Fail with [`Error::InflatedTooLarge`] past this many inflated bytes
    pub max_inflated_size: Option<usize>,
    /// Run [`BlockPatternStats::scan`] and log the result
    pub scan_block_patterns: bool,
}

impl TextureOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_inflated_size(mut self, limit: usize) -> Self {
        self.max_inflated_size = Some(limit);
        self
    }

    #[must_use]
    pub fn with_block_pattern_scan(mut self, enabled: bool) -> Self {
        self.scan_block_patterns = enabled;
        self
    }
}

/// Inflate a stream and unpack its level table.
///
/// # Errors
/// See [`inflate`] and [`LevelTable::parse`].
pub fn decode_levels(stream: &[u8], options: &TextureOptions) -> Result<LevelTable> {
    let inflated = inflate(stream, options.max_inflated_size)?;
    let table = LevelTable::parse(inflated)?;

    if options.scan_block_patterns {
        let stats = BlockPatternStats::scan(&table);
        tracing::trace!(
            "Block patterns: {} blocks, {} endpoint matches, {} opaque alpha",
            stats.blocks,
            stats.endpoint_matches,
            stats.opaque_alpha_matches
        );
    }

    Ok(table)
}

/// Decode a compressed texture stream into a DDS file holding level 0.
///
/// Smaller levels are decoded and validated but not emitted.
///
/// # Errors
/// Any error from [`decode_levels`].
pub fn decode_texture(stream: &[u8], info: &TextureInfo, options: &TextureOptions) -> Result<Vec<u8>> {
    let table = decode_levels(stream, options)?;
    let base = table.level(0).ok_or(Error::InvalidLevelTable {
        level_count_minus_one: -1,
        base_level_size: table.base_level_size() as i32,
    })?;

    tracing::debug!(
        "Decoded {}x{} {} texture: {} levels, emitting {} bytes",
        info.width,
        info.height,
        info.pixel_format,
        table.level_count(),
        base.len()
    );

    write_dds(info.width, info.height, info.pixel_format, base)
}
