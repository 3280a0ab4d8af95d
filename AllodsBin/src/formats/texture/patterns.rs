//! Block pattern scan over decoded mip levels.
//!
//! Counts 16-byte blocks whose first 8 bytes end with one of a few fixed
//! masks. The counts never influence the produced DDS bytes; they are kept
//! as a diagnostic for comparing texture corpora.

use serde::Serialize;

use super::levels::LevelTable;

/// Block size the scan steps by.
const BLOCK_STRIDE: usize = 16;

/// Alpha-half patterns tested at the end of each block's first 8 bytes.
const ENDPOINT_PATTERNS: [&[u8]; 4] = [
    &[0xF3, 0x9C, 0xD3, 0x9C, 0xAA, 0xAA, 0xAA, 0xAA],
    &[0x49, 0x92, 0x24, 0x49, 0x92, 0x24],
    // Listed twice: matches count double
    &[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    &[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
];

const OPAQUE_PATTERNS: [&[u8]; 1] = [&[0xFF; 8]];

/// Results of [`BlockPatternStats::scan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockPatternStats {
    /// 16-byte blocks across all levels.
    pub blocks: usize,
    pub endpoint_matches: usize,
    pub opaque_alpha_matches: usize,
}

fn count_matches(level: &[u8], patterns: &[&[u8]]) -> usize {
    patterns
        .iter()
        .map(|pattern| {
            (8 - pattern.len()..level.len())
                .step_by(BLOCK_STRIDE)
                .filter(|&pos| level.get(pos..pos + pattern.len()) == Some(*pattern))
                .count()
        })
        .sum()
}

impl BlockPatternStats {
    #[must_use]
    pub fn scan(table: &LevelTable) -> Self {
        table.levels().fold(Self::default(), |stats, level| Self {
            blocks: stats.blocks + level.len() / BLOCK_STRIDE,
            endpoint_matches: stats.endpoint_matches + count_matches(level, &ENDPOINT_PATTERNS),
            opaque_alpha_matches: stats.opaque_alpha_matches + count_matches(level, &OPAQUE_PATTERNS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_level(level: &[u8]) -> LevelTable {
        let mut data = 0i32.to_le_bytes().to_vec();
        data.extend_from_slice(&(level.len() as i32).to_le_bytes());
        data.extend_from_slice(level);
        LevelTable::parse(data).unwrap()
    }

    #[test]
    fn test_scan_counts_block_aligned_masks() {
        let mut level = vec![0x11u8; 64];
        // Block 0: opaque alpha half
        level[0..8].fill(0xFF);
        // Block 1: 6-byte mask ending at byte 8 of the block
        level[18..24].copy_from_slice(&[0x49, 0x92, 0x24, 0x49, 0x92, 0x24]);
        // Block 2: the doubled mask
        level[32..40].copy_from_slice(&[0x01, 0, 0, 0, 0, 0, 0, 0]);
        // Not block aligned, ignored
        level[52..58].copy_from_slice(&[0x49, 0x92, 0x24, 0x49, 0x92, 0x24]);

        let stats = BlockPatternStats::scan(&table_with_level(&level));
        assert_eq!(
            stats,
            BlockPatternStats {
                blocks: 4,
                endpoint_matches: 3,
                opaque_alpha_matches: 1,
            }
        );
    }

    #[test]
    fn test_scan_short_level() {
        let stats = BlockPatternStats::scan(&table_with_level(&[0xFF; 4]));
        assert_eq!(stats, BlockPatternStats::default());
    }
}
