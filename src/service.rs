// src/service.rs
//
// Card worker thread. Commands arrive over a sync channel and each one runs
// a whole blocking engine operation; one operation is in flight per reader
// at any time, which is exactly the serialization the engine requires.

use crossbeam_channel::{Receiver, Sender};
use log::{error, info};

use crate::engine::{Engine, Timeouts};
use crate::error::EngineError;
use crate::keys::KeySet;
use crate::reader::PcscTerminal;
use crate::types::{CardCommand, OutgoingMessage};

pub fn run(tx: Sender<OutgoingMessage>, rx: Receiver<CardCommand>) {
    info!("card worker started");

    while let Ok(cmd) = rx.recv() {
        match cmd {
            CardCommand::CheckReaderStatus => {
                let success = match PcscTerminal::first_available() {
                    Ok(_) => true,
                    Err(e) => {
                        error!("reader check failed: {}", e);
                        false
                    }
                };
                let _ = tx.send(OutgoingMessage::READER_STATUS { success });
            }

            CardCommand::ReadUid => {
                let msg = match build_engine(Timeouts::default()).and_then(|mut e| e.read_uid()) {
                    Ok(uid) => OutgoingMessage::UID_READ_SUCCESS { uid },
                    Err(e) => OutgoingMessage::UID_READ_ERROR {
                        error: e.to_string(),
                    },
                };
                let _ = tx.send(msg);
            }

            CardCommand::ReadText => {
                let msg = match build_engine(Timeouts::default()).and_then(|mut e| e.read_text()) {
                    Ok(result) => OutgoingMessage::DATA_READ_SUCCESS { result },
                    Err(e) => OutgoingMessage::DATA_READ_ERROR {
                        error: e.to_string(),
                    },
                };
                let _ = tx.send(msg);
            }

            CardCommand::WriteText {
                text,
                present_timeout_ms,
                absent_timeout_ms,
            } => {
                let timeouts = timeouts_from(present_timeout_ms, absent_timeout_ms);
                let msg = match build_engine(timeouts).and_then(|mut e| e.write_text(&text)) {
                    Ok(result) => OutgoingMessage::DATA_WRITE_SUCCESS { result },
                    Err(e) => OutgoingMessage::DATA_WRITE_ERROR {
                        error: e.to_string(),
                    },
                };
                let _ = tx.send(msg);
            }
        }
    }
}

fn build_engine(timeouts: Timeouts) -> Result<Engine<PcscTerminal>, EngineError> {
    let terminal = PcscTerminal::first_available()?;
    Ok(Engine::new(terminal, KeySet::default(), timeouts))
}

fn timeouts_from(present_ms: Option<u64>, absent_ms: Option<u64>) -> Timeouts {
    let defaults = Timeouts::default();
    Timeouts {
        present: present_ms
            .map(std::time::Duration::from_millis)
            .unwrap_or(defaults.present),
        absent: absent_ms
            .map(std::time::Duration::from_millis)
            .unwrap_or(defaults.absent),
        poll_interval: defaults.poll_interval,
    }
}
