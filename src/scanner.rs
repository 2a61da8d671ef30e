// src/scanner.rs
//
// Empty-block discovery. A block qualifies as a write target when it
// authenticates against some candidate key and its current contents are a
// factory fill pattern (all 0x00 or all 0xFF). Anything else is treated as
// data already in use and skipped, never overwritten.

use log::debug;

use crate::apdu::{self, CardChannel};
use crate::auth::{self, AuthOutcome};
use crate::blocks::{self, BLOCK_SIZE};
use crate::keys::KeySet;

/// A writable block plus the key that got us in.
#[derive(Debug, Clone, Copy)]
pub struct ScanHit {
    pub block: u8,
    pub auth: AuthOutcome,
}

/// Factory fill check. This cannot distinguish "never written" from user
/// data that happens to be a uniform fill; that ambiguity is inherent to
/// the card format and accepted as-is.
pub fn is_blank(data: &[u8; BLOCK_SIZE]) -> bool {
    data.iter().all(|&b| b == 0x00) || data.iter().all(|&b| b == 0xFF)
}

/// Find the next authenticated, blank block at or after `start`, walking the
/// candidate order (4..63, trailers excluded). Per-block auth and read
/// failures are absorbed; `None` means the whole card was exhausted.
pub fn next_empty_block<C: CardChannel>(
    channel: &C,
    keys: &KeySet,
    start: u8,
) -> Option<ScanHit> {
    for block in blocks::candidate_write_blocks().filter(|&b| b >= start) {
        let Some(outcome) = auth::authenticate_block(channel, block, keys) else {
            debug!("block {}: no candidate key authenticates, skipping", block);
            continue;
        };

        match apdu::read_block(channel, block) {
            Ok(Some(data)) if is_blank(&data) => {
                debug!("block {}: blank, selected", block);
                return Some(ScanHit {
                    block,
                    auth: outcome,
                });
            }
            Ok(Some(_)) => debug!("block {}: in use, skipping", block),
            // Read failure while scanning is "no data", not fatal.
            Ok(None) | Err(_) => debug!("block {}: unreadable, skipping", block),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimCard;

    #[test]
    fn blank_heuristic_is_uniform_fill() {
        assert!(is_blank(&[0x00; 16]));
        assert!(is_blank(&[0xFF; 16]));

        let mut mixed = [0x00; 16];
        mixed[3] = 0xFF;
        assert!(!is_blank(&mixed));

        let mut used = [0x00; 16];
        used[0] = b'H';
        assert!(!is_blank(&used));
    }

    #[test]
    fn factory_card_yields_block_four_first() {
        let card = SimCard::blank();
        let hit = next_empty_block(&card, &KeySet::default(), 4).unwrap();
        assert_eq!(hit.block, 4);
    }

    #[test]
    fn used_blocks_are_skipped() {
        let card = SimCard::blank();
        card.set_block(4, *b"already occupied");
        card.set_block(5, *b"this one as well");

        let hit = next_empty_block(&card, &KeySet::default(), 4).unwrap();
        assert_eq!(hit.block, 6);
    }

    #[test]
    fn scan_resumes_past_start() {
        let card = SimCard::blank();
        // Starting past block 6 must skip the trailer at 7 and land on 8.
        let hit = next_empty_block(&card, &KeySet::default(), 7).unwrap();
        assert_eq!(hit.block, 8);
    }

    #[test]
    fn unauthenticatable_card_exhausts() {
        let card = SimCard::blank();
        for sector in 1..16 {
            card.set_sector_keys(sector, [0x31; 6], [0x32; 6]);
        }
        assert!(next_empty_block(&card, &KeySet::default(), 4).is_none());
    }

    #[test]
    fn rescan_of_full_card_skips_everything() {
        let card = SimCard::blank();
        for block in blocks::candidate_write_blocks() {
            card.set_block(block, *b"0123456789abcdef");
        }
        assert!(next_empty_block(&card, &KeySet::default(), 4).is_none());
    }
}
