// src/engine.rs
//
// Blocking card operations. Every call owns the card session end to end:
// wait for the card, connect, run the commands, disconnect on every path,
// then wait (best effort) for the card to be taken away. Callers run these
// from a dedicated worker thread because each can block for the full
// presence/absence window; one operation per physical reader at a time.

use std::time::{Duration, SystemTime};

use log::info;
use serde::Serialize;

use crate::apdu;
use crate::content;
use crate::error::EngineError;
use crate::keys::KeySet;
use crate::presence;
use crate::reader::Terminal;
use crate::writer;

/// Waiting-phase configuration. Defaults: 10 s for the card to arrive,
/// 5 s for it to leave, polled every 500 ms.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub present: Duration,
    pub absent: Duration,
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            present: Duration::from_secs(10),
            absent: Duration::from_secs(5),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Outcome of a fully successful text write.
#[derive(Debug, Clone, Serialize)]
pub struct WriteResult {
    /// Card UID, uppercase hex.
    pub uid: String,
    /// Blocks written, in chunk order. Always one per chunk.
    pub blocks: Vec<u8>,
    pub text_written: String,
    pub timestamp: SystemTime,
}

/// Outcome of reading the text stored on a card.
#[derive(Debug, Clone, Serialize)]
pub struct ReadResult {
    /// Card UID, uppercase hex.
    pub uid: String,
    /// Concatenated text fragments from all accessible data blocks.
    pub text: String,
    pub timestamp: SystemTime,
}

pub struct Engine<T: Terminal> {
    terminal: T,
    keys: KeySet,
    timeouts: Timeouts,
}

impl<T: Terminal> Engine<T> {
    pub fn new(terminal: T, keys: KeySet, timeouts: Timeouts) -> Self {
        Self {
            terminal,
            keys,
            timeouts,
        }
    }

    /// Wait for a card and read its UID. Blocking.
    pub fn read_uid(&mut self) -> Result<String, EngineError> {
        let timeouts = self.timeouts;
        presence::wait_for_card(&mut self.terminal, timeouts.present, timeouts.poll_interval)?;

        let channel = self.terminal.connect()?;
        let result = apdu::get_uid(&channel).map(|uid| hex::encode_upper(uid));
        drop(channel);

        presence::wait_for_removal(&mut self.terminal, timeouts.absent, timeouts.poll_interval);

        if let Ok(uid) = &result {
            info!("read UID {}", uid);
        }
        result
    }

    /// Wait for a card, read its UID and collect the text stored in every
    /// sector the candidate keys open. Blocking.
    pub fn read_text(&mut self) -> Result<ReadResult, EngineError> {
        let timeouts = self.timeouts;
        presence::wait_for_card(&mut self.terminal, timeouts.present, timeouts.poll_interval)?;

        let channel = self.terminal.connect()?;
        let result: Result<ReadResult, EngineError> = (|| {
            let uid = hex::encode_upper(apdu::get_uid(&channel)?);
            let text = content::collect_text(&channel, &self.keys)?;
            Ok(ReadResult {
                uid,
                text,
                timestamp: SystemTime::now(),
            })
        })();
        drop(channel);

        presence::wait_for_removal(&mut self.terminal, timeouts.absent, timeouts.poll_interval);

        if let Ok(r) = &result {
            info!("read {} byte(s) of text from card {}", r.text.len(), r.uid);
        }
        result
    }

    /// Wait for a card and write `text` across empty blocks, verifying each.
    /// Blocking; uses the engine's default timeouts.
    pub fn write_text(&mut self, text: &str) -> Result<WriteResult, EngineError> {
        let timeouts = self.timeouts;
        self.write_text_with(text, timeouts)
    }

    /// Same as [`write_text`](Self::write_text) with per-call timeouts.
    pub fn write_text_with(
        &mut self,
        text: &str,
        timeouts: Timeouts,
    ) -> Result<WriteResult, EngineError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            // Validation failure, before any hardware interaction.
            return Err(EngineError::EmptyPayload);
        }

        presence::wait_for_card(&mut self.terminal, timeouts.present, timeouts.poll_interval)?;

        let channel = self.terminal.connect()?;
        let result: Result<WriteResult, EngineError> = (|| {
            // A card whose UID cannot be read is treated as fatal before any
            // sector work begins.
            let uid = hex::encode_upper(apdu::get_uid(&channel)?);
            let blocks = writer::write_chunks(&channel, &self.keys, trimmed.as_bytes())?;
            Ok(WriteResult {
                uid,
                blocks,
                text_written: trimmed.to_string(),
                timestamp: SystemTime::now(),
            })
        })();
        drop(channel);

        // Best effort on every path; a lingering card is only a warning and
        // never flips the operation's outcome.
        presence::wait_for_removal(&mut self.terminal, timeouts.absent, timeouts.poll_interval);

        if let Ok(r) = &result {
            info!("wrote {} byte(s) to card {}", trimmed.len(), r.uid);
        }
        result
    }
}
