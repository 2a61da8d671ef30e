// src/reader.rs
//
// Terminal handle: where the engine gets its presence polls and its
// connected card channel from. The PC/SC implementation wraps a context
// plus one reader name; the engine never enumerates or selects readers
// beyond taking the first one available.

use std::ffi::CString;

use pcsc::{Context, Protocols, ReaderState, Scope, ShareMode, State};

use crate::apdu::CardChannel;
use crate::error::EngineError;

/// A handle to one physical (or simulated) reader slot.
pub trait Terminal {
    type Channel: CardChannel;

    /// One presence poll. Errors here are transient reader/service hiccups;
    /// the presence coordinator retries them until its deadline.
    fn card_present(&mut self) -> Result<bool, EngineError>;

    /// Open the exclusive session to the card currently on the reader.
    fn connect(&mut self) -> Result<Self::Channel, EngineError>;
}

pub struct PcscTerminal {
    ctx: Context,
    reader: CString,
}

impl PcscTerminal {
    /// Establish a PC/SC context and bind to the first reader found.
    pub fn first_available() -> Result<Self, EngineError> {
        let ctx = Context::establish(Scope::User)?;

        let mut readers_buf = [0; 2048];
        let reader = match ctx.list_readers(&mut readers_buf) {
            Ok(mut readers) => readers.next().map(CString::from),
            Err(pcsc::Error::NoReadersAvailable) => None,
            Err(e) => return Err(e.into()),
        };

        let reader = reader.ok_or(EngineError::NoReaderDetected)?;
        Ok(Self { ctx, reader })
    }
}

impl Terminal for PcscTerminal {
    type Channel = pcsc::Card;

    fn card_present(&mut self) -> Result<bool, EngineError> {
        let mut states = [ReaderState::new(self.reader.clone(), State::UNAWARE)];
        match self.ctx.get_status_change(std::time::Duration::ZERO, &mut states) {
            Ok(()) | Err(pcsc::Error::Timeout) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(states[0].event_state().intersects(State::PRESENT))
    }

    fn connect(&mut self) -> Result<pcsc::Card, EngineError> {
        // Dropping the returned Card disconnects it, which is the
        // guaranteed-cleanup path for the whole session.
        Ok(self
            .ctx
            .connect(&self.reader, ShareMode::Shared, Protocols::ANY)?)
    }
}
