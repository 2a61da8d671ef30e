// src/apdu.rs
//
// Pseudo-APDU codec for contactless storage cards (ACR122U/ACR1552U command
// set). Builds fixed-format frames, transmits them over an opaque channel
// and decodes the two-byte status word trailing every response.

use crate::blocks::{self, BLOCK_SIZE};
use crate::error::EngineError;
use crate::keys::Key;

pub const SW_SUCCESS: u16 = 0x9000;

/// Key type byte for the MIFARE authenticate command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    A = 0x60,
    B = 0x61,
}

/// Exclusive transmit/receive channel to one physical (or simulated) card.
/// `pcsc::Card` is the production implementation.
pub trait CardChannel {
    fn transmit(&self, apdu: &[u8]) -> Result<Vec<u8>, pcsc::Error>;
}

impl CardChannel for pcsc::Card {
    fn transmit(&self, apdu: &[u8]) -> Result<Vec<u8>, pcsc::Error> {
        let mut recv_buffer = [0u8; pcsc::MAX_BUFFER_SIZE];
        let resp = pcsc::Card::transmit(self, apdu, &mut recv_buffer)?;
        Ok(resp.to_vec())
    }
}

/// Decoded response: payload plus 16-bit status word.
#[derive(Debug, Clone)]
pub struct Response {
    pub data: Vec<u8>,
    pub sw: u16,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.sw == SW_SUCCESS
    }
}

fn exchange<C: CardChannel>(channel: &C, apdu: &[u8]) -> Result<Response, pcsc::Error> {
    let resp = channel.transmit(apdu)?;
    if resp.len() < 2 {
        return Err(pcsc::Error::InsufficientBuffer);
    }
    let sw = ((resp[resp.len() - 2] as u16) << 8) | (resp[resp.len() - 1] as u16);
    Ok(Response {
        data: resp[..resp.len() - 2].to_vec(),
        sw,
    })
}

/// Get Data (UID): FF CA 00 00 00
pub fn get_uid<C: CardChannel>(channel: &C) -> Result<Vec<u8>, EngineError> {
    let resp = exchange(channel, &[0xFF, 0xCA, 0x00, 0x00, 0x00])?;
    if resp.is_success() {
        Ok(resp.data)
    } else {
        Err(EngineError::UidReadFailure(resp.sw))
    }
}

/// Load Authentication Key into reader memory: FF 82 00 slot 06 [KEY].
/// A refused load is an expected negative; the caller moves to the next key.
pub fn load_key<C: CardChannel>(channel: &C, slot: u8, key: &Key) -> Result<bool, EngineError> {
    let mut apdu = vec![0xFF, 0x82, 0x00, slot, 0x06];
    apdu.extend_from_slice(key);
    Ok(exchange(channel, &apdu)?.is_success())
}

/// Authenticate Block: FF 86 00 00 05 01 00 Block KeyType Slot.
pub fn authenticate<C: CardChannel>(
    channel: &C,
    block: u8,
    key_type: KeyType,
    slot: u8,
) -> Result<bool, EngineError> {
    let apdu = [
        0xFF,
        0x86,
        0x00,
        0x00,
        0x05,
        0x01,
        0x00,
        block,
        key_type as u8,
        slot,
    ];
    Ok(exchange(channel, &apdu)?.is_success())
}

/// Read Binary: FF B0 00 Block 10. A non-success status means "no data",
/// which is recoverable while scanning; only the verifier treats it as fatal.
pub fn read_block<C: CardChannel>(
    channel: &C,
    block: u8,
) -> Result<Option<[u8; BLOCK_SIZE]>, EngineError> {
    let resp = exchange(channel, &[0xFF, 0xB0, 0x00, block, BLOCK_SIZE as u8])?;
    if !resp.is_success() || resp.data.len() != BLOCK_SIZE {
        return Ok(None);
    }
    let mut data = [0u8; BLOCK_SIZE];
    data.copy_from_slice(&resp.data);
    Ok(Some(data))
}

/// Update Binary: FF D6 00 Block 10 [Data].
/// Trailer blocks are refused here before anything reaches the hardware,
/// even though the scanner never proposes one.
pub fn write_block<C: CardChannel>(
    channel: &C,
    block: u8,
    data: &[u8; BLOCK_SIZE],
) -> Result<(), EngineError> {
    if blocks::is_trailer(block) {
        return Err(EngineError::TrailerWrite(block));
    }

    let mut apdu = vec![0xFF, 0xD6, 0x00, block, BLOCK_SIZE as u8];
    apdu.extend_from_slice(data);

    let resp = exchange(channel, &apdu)?;
    if resp.is_success() {
        Ok(())
    } else {
        Err(EngineError::WriteFailure {
            block,
            status: resp.sw,
        })
    }
}
