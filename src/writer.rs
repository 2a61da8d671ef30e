// src/writer.rs
//
// Chunked payload writing with read-back verification. Each 16-byte chunk
// gets its own freshly scanned target block, its own authentication right
// before the write, and a byte-exact read-back check. There is no hardware
// rollback: a failure mid-sequence leaves earlier chunks on the card and the
// operation is reported as failed anyway.

use log::{debug, info};

use crate::apdu::{self, CardChannel};
use crate::auth;
use crate::blocks::{BLOCK_SIZE, FIRST_DATA_BLOCK};
use crate::error::EngineError;
use crate::keys::KeySet;
use crate::scanner;

/// Split a payload into 16-byte chunks, zero-padding the final fragment.
/// The payload must be non-empty; the caller validates that before any
/// hardware interaction.
pub fn chunk_payload(payload: &[u8]) -> Vec<[u8; BLOCK_SIZE]> {
    payload
        .chunks(BLOCK_SIZE)
        .map(|fragment| {
            let mut chunk = [0u8; BLOCK_SIZE];
            chunk[..fragment.len()].copy_from_slice(fragment);
            chunk
        })
        .collect()
}

/// Write `payload` across as many blocks as needed and verify every block.
/// Returns the blocks written, in chunk order.
pub fn write_chunks<C: CardChannel>(
    channel: &C,
    keys: &KeySet,
    payload: &[u8],
) -> Result<Vec<u8>, EngineError> {
    if payload.is_empty() {
        return Err(EngineError::EmptyPayload);
    }

    let chunks = chunk_payload(payload);
    let mut written: Vec<u8> = Vec::with_capacity(chunks.len());
    let mut scan_from = FIRST_DATA_BLOCK;

    for (index, chunk) in chunks.iter().enumerate() {
        let chunk_no = index + 1;
        let block = loop {
            let Some(hit) = scanner::next_empty_block(channel, keys, scan_from) else {
                return Err(EngineError::NoWritableBlockFound { chunk: chunk_no });
            };

            // Authentication state from the scan's read must not be assumed
            // to survive until the write; authenticate again with the pair
            // the scanner discovered.
            if auth::reauthenticate(channel, hit.block, keys, hit.auth) {
                break hit.block;
            }
            debug!("block {}: lost authentication before write, resuming scan", hit.block);
            scan_from = hit.block + 1;
        };

        apdu::write_block(channel, block, chunk)?;

        match apdu::read_block(channel, block) {
            Ok(Some(data)) if data == *chunk => {
                debug!("chunk {} verified in block {}", chunk_no, block);
            }
            Ok(Some(_)) => return Err(EngineError::VerificationMismatch { block }),
            Ok(None) => return Err(EngineError::VerifyReadFailure { block }),
            Err(e) => return Err(e),
        }

        written.push(block);
        // The next chunk's search continues past this block so two chunks
        // never target the same address.
        scan_from = block + 1;
    }

    info!("wrote {} chunk(s) to blocks {:?}", written.len(), written);
    Ok(written)
}
