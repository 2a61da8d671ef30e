// src/auth.rs
//
// Key trial authentication: walk the candidate-key list in priority order,
// load each key into the single reusable reader slot and try Key A then
// Key B against the target block. First success wins; the search is
// deliberately greedy because vendors reuse a small set of default keys.

use log::debug;

use crate::apdu::{self, CardChannel, KeyType};
use crate::keys::KeySet;

/// The one volatile reader key slot the engine reuses for every trial.
pub const KEY_SLOT: u8 = 0x00;

/// A key/keyType pair that authenticated a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthOutcome {
    /// Index into the `KeySet` of the key that worked.
    pub key_index: usize,
    pub key_type: KeyType,
}

fn try_auth<C: CardChannel>(channel: &C, block: u8, key_type: KeyType) -> bool {
    // Transport hiccups during a trial count as a failed attempt; per-key
    // negatives never surface to the caller.
    matches!(apdu::authenticate(channel, block, key_type, KEY_SLOT), Ok(true))
}

/// Find the first candidate key that authenticates `block`, trying Key A
/// before Key B for each. Returns `None` when no key works.
pub fn authenticate_block<C: CardChannel>(
    channel: &C,
    block: u8,
    keys: &KeySet,
) -> Option<AuthOutcome> {
    for (key_index, key) in keys.iter().enumerate() {
        if !matches!(apdu::load_key(channel, KEY_SLOT, key), Ok(true)) {
            continue;
        }

        for key_type in [KeyType::A, KeyType::B] {
            if try_auth(channel, block, key_type) {
                debug!(
                    "block {} authenticated with key #{} ({:?})",
                    block, key_index, key_type
                );
                return Some(AuthOutcome { key_index, key_type });
            }
        }
    }
    None
}

/// Re-run a previously discovered key/keyType against `block`. Used right
/// before a write, where authentication state from the scan must not be
/// assumed to persist.
pub fn reauthenticate<C: CardChannel>(
    channel: &C,
    block: u8,
    keys: &KeySet,
    outcome: AuthOutcome,
) -> bool {
    let Some(key) = keys.get(outcome.key_index) else {
        return false;
    };
    if !matches!(apdu::load_key(channel, KEY_SLOT, key), Ok(true)) {
        return false;
    }
    try_auth(channel, block, outcome.key_type)
}
