// src/sim.rs
//
// In-memory MIFARE Classic 1K: 16 sectors of 4 blocks, per-sector Key A/B,
// a volatile reader key slot and the same pseudo-APDU surface the real
// reader exposes. Used by the test suite and handy for driving the engine
// without hardware.

use std::cell::RefCell;
use std::rc::Rc;

use crate::apdu::CardChannel;
use crate::blocks::{self, BLOCK_COUNT, BLOCK_SIZE};
use crate::error::EngineError;
use crate::keys::Key;
use crate::reader::Terminal;

const SW_OK: [u8; 2] = [0x90, 0x00];
const SW_AUTH_FAILED: [u8; 2] = [0x63, 0x00];
const SW_SECURITY: [u8; 2] = [0x69, 0x82];
const SW_INS_NOT_SUPPORTED: [u8; 2] = [0x6D, 0x00];

struct SimState {
    uid: Vec<u8>,
    data: [[u8; BLOCK_SIZE]; BLOCK_COUNT as usize],
    sector_keys: [(Key, Key); 16],
    loaded_key: Option<(u8, Key)>,
    auth_sector: Option<u8>,
    transmit_count: usize,
    auth_count: usize,
    read_count: usize,
    write_failure: Option<u16>,
    corrupt_writes: bool,
    auth_fail_attempts: Vec<usize>,
    read_fail_after: Option<usize>,
}

/// Simulated card. Clones share the same underlying state, so a terminal
/// can hand out a channel while the test keeps a handle for inspection.
#[derive(Clone)]
pub struct SimCard {
    state: Rc<RefCell<SimState>>,
}

impl SimCard {
    /// Factory-fresh card: all data blocks zero-filled, every sector keyed
    /// with the transport key FF FF FF FF FF FF for both A and B.
    pub fn blank() -> Self {
        let uid = vec![0x04, 0xA1, 0xB2, 0xC3];
        let mut data = [[0u8; BLOCK_SIZE]; BLOCK_COUNT as usize];
        data[0][..uid.len()].copy_from_slice(&uid);

        Self {
            state: Rc::new(RefCell::new(SimState {
                uid,
                data,
                sector_keys: [([0xFF; 6], [0xFF; 6]); 16],
                loaded_key: None,
                auth_sector: None,
                transmit_count: 0,
                auth_count: 0,
                read_count: 0,
                write_failure: None,
                corrupt_writes: false,
                auth_fail_attempts: Vec::new(),
                read_fail_after: None,
            })),
        }
    }

    pub fn set_uid(&self, uid: &[u8]) {
        self.state.borrow_mut().uid = uid.to_vec();
    }

    pub fn set_sector_keys(&self, sector: u8, key_a: Key, key_b: Key) {
        self.state.borrow_mut().sector_keys[sector as usize] = (key_a, key_b);
    }

    pub fn set_block(&self, block: u8, data: [u8; BLOCK_SIZE]) {
        self.state.borrow_mut().data[block as usize] = data;
    }

    pub fn block(&self, block: u8) -> [u8; BLOCK_SIZE] {
        self.state.borrow().data[block as usize]
    }

    /// Make every Update Binary come back with the given status word.
    pub fn fail_writes(&self, status: u16) {
        self.state.borrow_mut().write_failure = Some(status);
    }

    /// Writes report success but land corrupted, so read-back verification
    /// must catch them.
    pub fn corrupt_writes(&self) {
        self.state.borrow_mut().corrupt_writes = true;
    }

    /// Refuse the given authenticate attempts (1-based, counted across the
    /// session). Mimics a reader whose authentication state evaporates
    /// between commands.
    pub fn fail_auth_attempts(&self, attempts: &[usize]) {
        self.state.borrow_mut().auth_fail_attempts = attempts.to_vec();
    }

    /// After `successful` successful reads, every Read Binary fails.
    pub fn fail_reads_after(&self, successful: usize) {
        self.state.borrow_mut().read_fail_after = Some(successful);
    }

    pub fn transmit_count(&self) -> usize {
        self.state.borrow().transmit_count
    }
}

fn respond(data: &[u8], sw: [u8; 2]) -> Vec<u8> {
    let mut out = data.to_vec();
    out.extend_from_slice(&sw);
    out
}

impl CardChannel for SimCard {
    fn transmit(&self, apdu: &[u8]) -> Result<Vec<u8>, pcsc::Error> {
        let mut st = self.state.borrow_mut();
        st.transmit_count += 1;

        // Get Data (UID)
        if apdu == [0xFF, 0xCA, 0x00, 0x00, 0x00] {
            let uid = st.uid.clone();
            return Ok(respond(&uid, SW_OK));
        }

        // Load Authentication Key
        if apdu.len() == 11 && apdu[..3] == [0xFF, 0x82, 0x00] && apdu[4] == 0x06 {
            let mut key = [0u8; 6];
            key.copy_from_slice(&apdu[5..11]);
            st.loaded_key = Some((apdu[3], key));
            return Ok(respond(&[], SW_OK));
        }

        // Authenticate Block
        if apdu.len() == 10 && apdu[..7] == [0xFF, 0x86, 0x00, 0x00, 0x05, 0x01, 0x00] {
            let block = apdu[7];
            let key_type = apdu[8];
            let slot = apdu[9];

            st.auth_count += 1;
            if st.auth_fail_attempts.contains(&st.auth_count) {
                st.auth_sector = None;
                return Ok(respond(&[], SW_AUTH_FAILED));
            }

            let sector = blocks::sector_of(block);
            let (key_a, key_b) = st.sector_keys[sector as usize];
            let expected = match key_type {
                0x60 => key_a,
                0x61 => key_b,
                _ => return Ok(respond(&[], SW_AUTH_FAILED)),
            };

            let ok = matches!(st.loaded_key, Some((s, k)) if s == slot && k == expected);
            if ok {
                st.auth_sector = Some(sector);
                return Ok(respond(&[], SW_OK));
            }
            st.auth_sector = None;
            return Ok(respond(&[], SW_AUTH_FAILED));
        }

        // Read Binary
        if apdu.len() == 5 && apdu[..3] == [0xFF, 0xB0, 0x00] {
            let block = apdu[3];
            if block >= BLOCK_COUNT || st.auth_sector != Some(blocks::sector_of(block)) {
                return Ok(respond(&[], SW_SECURITY));
            }
            if let Some(limit) = st.read_fail_after {
                if st.read_count >= limit {
                    return Ok(respond(&[], SW_SECURITY));
                }
            }
            st.read_count += 1;
            let data = st.data[block as usize];
            return Ok(respond(&data, SW_OK));
        }

        // Update Binary
        if apdu.len() == 5 + BLOCK_SIZE && apdu[..3] == [0xFF, 0xD6, 0x00] {
            let block = apdu[3];
            if block >= BLOCK_COUNT
                || blocks::is_manufacturer_block(block)
                || st.auth_sector != Some(blocks::sector_of(block))
            {
                return Ok(respond(&[], SW_SECURITY));
            }
            if let Some(status) = st.write_failure {
                return Ok(respond(&[], status.to_be_bytes()));
            }

            let mut data = [0u8; BLOCK_SIZE];
            data.copy_from_slice(&apdu[5..]);
            if st.corrupt_writes {
                data[BLOCK_SIZE - 1] ^= 0xA5;
            }
            st.data[block as usize] = data;
            return Ok(respond(&[], SW_OK));
        }

        Ok(respond(&[], SW_INS_NOT_SUPPORTED))
    }
}

/// Simulated reader slot with scripted presence: the card shows up after a
/// fixed number of polls and optionally leaves after being seen a fixed
/// number of times.
pub struct SimTerminal {
    card: SimCard,
    polls: usize,
    present_polls: usize,
    present_at: Option<usize>,
    remove_after: Option<usize>,
}

impl SimTerminal {
    /// Card already on the reader and never removed.
    pub fn new(card: SimCard) -> Self {
        Self {
            card,
            polls: 0,
            present_polls: 0,
            present_at: Some(0),
            remove_after: None,
        }
    }

    /// A blank card that appears after `polls` presence polls.
    pub fn with_card_after(polls: usize) -> Self {
        let mut t = Self::new(SimCard::blank());
        t.present_at = Some(polls);
        t
    }

    pub fn never_present() -> Self {
        let mut t = Self::new(SimCard::blank());
        t.present_at = None;
        t
    }

    /// Remove the card after it has been observed present `polls` times.
    pub fn remove_after(mut self, polls: usize) -> Self {
        self.remove_after = Some(polls);
        self
    }

    /// Shared handle onto the terminal's card, for test inspection.
    pub fn card(&self) -> SimCard {
        self.card.clone()
    }
}

impl Terminal for SimTerminal {
    type Channel = SimCard;

    fn card_present(&mut self) -> Result<bool, EngineError> {
        let poll = self.polls;
        self.polls += 1;

        let mut present = match self.present_at {
            Some(at) => poll >= at,
            None => false,
        };
        if present {
            if let Some(limit) = self.remove_after {
                if self.present_polls >= limit {
                    present = false;
                } else {
                    self.present_polls += 1;
                }
            }
        }
        Ok(present)
    }

    fn connect(&mut self) -> Result<SimCard, EngineError> {
        Ok(self.card.clone())
    }
}
