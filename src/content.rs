// src/content.rs
//
// Text collection from data blocks. The counterpart of the chunked writer:
// walk every sector the candidate keys can open, read its data blocks and
// keep whatever decodes as printable UTF-8 after stripping the zero padding.
// Blocks that are factory fill or not text at all are simply skipped.

use log::debug;

use crate::apdu::{self, CardChannel};
use crate::auth;
use crate::blocks::{self, BLOCK_SIZE};
use crate::error::EngineError;
use crate::keys::KeySet;

/// Trim trailing zero padding and decode, keeping only fragments with at
/// least one printable character. Non-UTF-8 contents (including all-0xFF
/// factory fill) yield `None`.
fn text_fragment(data: &[u8; BLOCK_SIZE]) -> Option<String> {
    let len = data.iter().rposition(|&b| b != 0x00).map_or(0, |i| i + 1);
    if len == 0 {
        return None;
    }
    let text = std::str::from_utf8(&data[..len]).ok()?;
    if !text.chars().any(|c| (' '..='~').contains(&c)) {
        return None;
    }
    Some(text.to_string())
}

/// Read every accessible data block and concatenate the text found, one
/// space between fragments from separate blocks. Sectors no candidate key
/// opens are skipped; a card where no sector opens at all is an error.
pub fn collect_text<C: CardChannel>(channel: &C, keys: &KeySet) -> Result<String, EngineError> {
    let mut any_auth = false;
    let mut fragments: Vec<String> = Vec::new();

    for sector in 0..16u8 {
        let first_block = sector * 4;
        // Block 0 is the manufacturer block, so sector 0 is probed via
        // block 1.
        let probe = if sector == 0 { 1 } else { first_block };

        if auth::authenticate_block(channel, probe, keys).is_none() {
            debug!("sector {}: no candidate key authenticates, skipping", sector);
            continue;
        }
        any_auth = true;

        for block in first_block..first_block + 4 {
            if blocks::is_trailer(block) || blocks::is_manufacturer_block(block) {
                continue;
            }
            // Read failures here are "no data", same as when scanning.
            match apdu::read_block(channel, block) {
                Ok(Some(data)) => {
                    if let Some(text) = text_fragment(&data) {
                        fragments.push(text);
                    }
                }
                Ok(None) | Err(_) => debug!("block {}: unreadable, skipping", block),
            }
        }
    }

    if !any_auth {
        return Err(EngineError::NoReadableSector);
    }
    Ok(fragments.join(" "))
}
