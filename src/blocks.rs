// src/blocks.rs
//
// Pure addressing logic for MIFARE Classic 1K: 16 sectors x 4 blocks,
// block 3 of every sector is the trailer (keys + access bits) and block 0
// is the read-only manufacturer block.

pub const BLOCK_SIZE: usize = 16;
pub const BLOCK_COUNT: u8 = 64;

/// First block considered for payload data. Sector 0 holds the manufacturer
/// block, so the scan starts at sector 1.
pub const FIRST_DATA_BLOCK: u8 = 4;

pub fn sector_of(block: u8) -> u8 {
    block / 4
}

/// Trailer blocks hold key material and access bits and must never be
/// read or written as data.
pub fn is_trailer(block: u8) -> bool {
    block % 4 == 3
}

pub fn is_manufacturer_block(block: u8) -> bool {
    block == 0
}

/// Candidate payload blocks in scan order: 4..63 ascending, trailers skipped.
pub fn candidate_write_blocks() -> impl Iterator<Item = u8> {
    (FIRST_DATA_BLOCK..BLOCK_COUNT).filter(|&b| !is_trailer(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailer_law() {
        for b in 0..BLOCK_COUNT {
            assert_eq!(is_trailer(b), b % 4 == 3);
        }
    }

    #[test]
    fn sector_mapping() {
        assert_eq!(sector_of(0), 0);
        assert_eq!(sector_of(3), 0);
        assert_eq!(sector_of(4), 1);
        assert_eq!(sector_of(63), 15);
    }

    #[test]
    fn candidates_exclude_trailers_and_sector_zero() {
        let candidates: Vec<u8> = candidate_write_blocks().collect();
        assert_eq!(candidates.first(), Some(&4));
        assert_eq!(candidates.len(), 45); // 15 sectors x 3 data blocks
        for &b in &candidates {
            assert!(!is_trailer(b));
            assert!(!is_manufacturer_block(b));
            assert!(sector_of(b) >= 1);
        }
    }

    #[test]
    fn candidates_skip_block_seven() {
        let candidates: Vec<u8> = candidate_write_blocks().take(6).collect();
        assert_eq!(candidates, vec![4, 5, 6, 8, 9, 10]);
    }
}
