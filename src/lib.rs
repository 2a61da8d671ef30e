// src/lib.rs
//
// MIFARE Classic card-access engine over PC/SC, plus the WebSocket service
// front that drives it from a dedicated blocking worker thread.

pub mod apdu;
pub mod auth;
pub mod blocks;
pub mod content;
pub mod engine;
pub mod error;
pub mod keys;
pub mod presence;
pub mod reader;
pub mod scanner;
pub mod service;
pub mod sim;
pub mod types;
pub mod writer;
pub mod ws;

pub use engine::{Engine, ReadResult, Timeouts, WriteResult};
pub use error::EngineError;
pub use keys::KeySet;
