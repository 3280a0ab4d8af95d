//! Inflate and mip level table unpacking.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};
use flate2::{Decompress, FlushDecompress, Status};

use crate::error::{Error, Result};

/// Bytes discarded in front of the deflate stream.
pub const STREAM_HEADER_SIZE: usize = 2;

/// Each level is preceded by an 8-byte header; the first one holds the
/// level count and the size of the smallest level.
pub const LEVEL_HEADER_SIZE: usize = 8;

/// Levels beyond this would overflow any addressable size at 4x growth.
const MAX_LEVELS: usize = 32;

/// Output grows by this much whenever the inflater fills the buffer.
const INFLATE_CHUNK: usize = 64 * 1024;

/// Strip the stream header and raw-inflate the rest.
///
/// Inflation is incremental; with `max_inflated_size` set, decoding stops
/// as soon as the output would pass the limit.
///
/// # Errors
/// Returns [`Error::CorruptStream`] on a malformed or truncated deflate
/// stream and [`Error::InflatedTooLarge`] when the limit is exceeded.
pub fn inflate(stream: &[u8], max_inflated_size: Option<usize>) -> Result<Vec<u8>> {
    let body = stream.get(STREAM_HEADER_SIZE..).ok_or_else(|| Error::CorruptStream {
        message: format!("stream is {} bytes, shorter than its header", stream.len()),
    })?;

    let mut inflater = Decompress::new(false);
    let mut out: Vec<u8> = Vec::new();

    loop {
        if out.len() == out.capacity() {
            let grow = match max_inflated_size {
                // One byte past the limit is enough to detect overflow
                Some(limit) => INFLATE_CHUNK.min(limit.saturating_add(1).saturating_sub(out.len())).max(1),
                None => INFLATE_CHUNK,
            };
            out.reserve_exact(grow);
        }

        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();
        let status = inflater
            .decompress_vec(&body[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| Error::CorruptStream {
                message: format!("inflate failed after {consumed} input bytes: {e}"),
            })?;

        if let Some(limit) = max_inflated_size {
            if out.len() > limit {
                return Err(Error::InflatedTooLarge { limit });
            }
        }

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let stalled =
                    inflater.total_in() as usize == consumed && inflater.total_out() == produced;
                if stalled && out.len() < out.capacity() {
                    return Err(Error::CorruptStream {
                        message: format!(
                            "deflate stream ends early after {} input bytes",
                            inflater.total_in()
                        ),
                    });
                }
            }
        }
    }

    tracing::trace!("Inflated {} -> {} bytes", body.len(), out.len());
    Ok(out)
}

/// Mip levels of an inflated texture. Level 0 is the largest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    data: Vec<u8>,
    levels: Vec<Range<usize>>,
    base_level_size: usize,
}

impl LevelTable {
    /// Unpack the level table of an inflated stream.
    ///
    /// Levels are stored smallest first. The smallest holds
    /// `base_level_size` bytes and each larger level four times as many.
    ///
    /// # Errors
    /// Returns [`Error::InvalidLevelTable`] for negative or overflowing
    /// sizes and [`Error::TruncatedLevelTable`] when a level does not fit.
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        if data.len() < LEVEL_HEADER_SIZE {
            return Err(Error::TruncatedLevelTable {
                level: 0,
                offset: 0,
                expected: LEVEL_HEADER_SIZE,
                available: data.len(),
            });
        }

        let level_count_minus_one = LittleEndian::read_i32(&data[0..4]);
        let raw_base_size = LittleEndian::read_i32(&data[4..8]);
        let invalid = || Error::InvalidLevelTable {
            level_count_minus_one,
            base_level_size: raw_base_size,
        };

        let level_count = usize::try_from(level_count_minus_one)
            .ok()
            .and_then(|n| n.checked_add(1))
            .filter(|&n| n <= MAX_LEVELS)
            .ok_or_else(invalid)?;
        let base_level_size = usize::try_from(raw_base_size).map_err(|_| invalid())?;

        let mut levels = vec![0..0; level_count];
        let mut offset = LEVEL_HEADER_SIZE;
        let mut size = base_level_size;

        for level in (0..level_count).rev() {
            let end = offset.checked_add(size).ok_or_else(invalid)?;
            if end > data.len() {
                return Err(Error::TruncatedLevelTable {
                    level,
                    offset,
                    expected: size,
                    available: data.len().saturating_sub(offset),
                });
            }
            levels[level] = offset..end;

            if level > 0 {
                offset = end.checked_add(LEVEL_HEADER_SIZE).ok_or_else(invalid)?;
                size = size.checked_mul(4).ok_or_else(invalid)?;
            }
        }

        tracing::trace!(
            "Level table: {} levels, smallest {} bytes, largest {} bytes",
            level_count,
            base_level_size,
            levels[0].len()
        );

        Ok(Self {
            data,
            levels,
            base_level_size,
        })
    }

    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Size of the smallest level as declared in the header.
    #[must_use]
    pub fn base_level_size(&self) -> usize {
        self.base_level_size
    }

    /// Bytes of level `index` (0 = largest).
    #[must_use]
    pub fn level(&self, index: usize) -> Option<&[u8]> {
        self.levels.get(index).map(|range| &self.data[range.clone()])
    }

    /// Byte size of every level, largest first.
    #[must_use]
    pub fn level_sizes(&self) -> Vec<usize> {
        self.levels.iter().map(|range| range.len()).collect()
    }

    /// Total bytes held by the levels, excluding level headers.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.levels.iter().map(|range| range.len()).sum()
    }

    /// Iterate levels largest first.
    pub fn levels(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.levels.iter().map(|range| &self.data[range.clone()])
    }
}
