// src/error.rs
use thiserror::Error;

/// Terminal failures of a whole engine operation.
///
/// Per-key and per-block negatives (a key that doesn't load, a block that
/// doesn't authenticate, a scan-time read that comes back non-9000) are
/// plain values inside the auth/scan loops and never show up here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no card reader detected")]
    NoReaderDetected,

    #[error("timed out waiting for a card ({0} ms)")]
    CardPresentTimeout(u64),

    #[error("payload is empty")]
    EmptyPayload,

    #[error("could not read card UID (status {0:04X})")]
    UidReadFailure(u16),

    #[error("no empty writable block found for chunk {chunk}")]
    NoWritableBlockFound { chunk: usize },

    #[error("no candidate key authenticates any sector")]
    NoReadableSector,

    #[error("write to block {block} rejected (status {status:04X})")]
    WriteFailure { block: u8, status: u16 },

    #[error("could not read back block {block} for verification")]
    VerifyReadFailure { block: u8 },

    #[error("verification mismatch in block {block}")]
    VerificationMismatch { block: u8 },

    #[error("refusing to write to trailer block {0}")]
    TrailerWrite(u8),

    #[error("transport error: {0}")]
    Transport(#[from] pcsc::Error),
}
