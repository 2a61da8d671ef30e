// src/types.rs
use serde::{Deserialize, Serialize};

use crate::engine::{ReadResult, WriteResult};

// Messages sent TO the WebSocket client (Frontend)
#[derive(Serialize, Clone, Debug)]
#[serde(tag = "type")]
#[allow(non_camel_case_types)]
pub enum OutgoingMessage {
    READER_STATUS { success: bool },
    UID_READ_SUCCESS { uid: String },
    UID_READ_ERROR { error: String },
    DATA_READ_SUCCESS { result: ReadResult },
    DATA_READ_ERROR { error: String },
    DATA_WRITE_SUCCESS { result: WriteResult },
    DATA_WRITE_ERROR { error: String },
}

// Messages received FROM the WebSocket client
#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
#[allow(non_camel_case_types)]
pub enum IncomingMessage {
    GET_READER_STATUS,
    READ_UID,
    READ_TEXT,
    WRITE_TEXT {
        text: String,
        present_timeout_ms: Option<u64>,
        absent_timeout_ms: Option<u64>,
    },
}

// Internal commands sent from WS Server -> card worker thread
#[derive(Debug)]
pub enum CardCommand {
    ReadUid,
    ReadText,
    WriteText {
        text: String,
        present_timeout_ms: Option<u64>,
        absent_timeout_ms: Option<u64>,
    },
    CheckReaderStatus,
}
