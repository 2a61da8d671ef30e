// src/presence.rs
//
// Presence/absence timing. Both waits poll in small fixed steps against a
// caller-supplied deadline so the engine never blocks indefinitely. A card
// that never shows up is fatal; a card that is never taken away is only a
// warning, because by then the payload operation already settled.

use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::EngineError;
use crate::reader::Terminal;

/// Wait until a card is on the reader or `timeout` passes. Transient poll
/// errors (PC/SC service restarts, reader resets) are retried until the
/// deadline.
pub fn wait_for_card<T: Terminal>(
    terminal: &mut T,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<(), EngineError> {
    let deadline = Instant::now() + timeout;
    loop {
        match terminal.card_present() {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => debug!("presence poll failed ({}), retrying", e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(EngineError::CardPresentTimeout(timeout.as_millis() as u64));
        }
        std::thread::sleep(poll_interval.min(deadline - now));
    }
}

/// Wait until the card leaves the reader or `timeout` passes. Returns
/// whether removal was observed; timing out here is never an operation
/// failure.
pub fn wait_for_removal<T: Terminal>(
    terminal: &mut T,
    timeout: Duration,
    poll_interval: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        match terminal.card_present() {
            Ok(false) => return true,
            Ok(true) => {}
            Err(e) => debug!("removal poll failed ({}), retrying", e),
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(
                "card not removed within {} ms, continuing anyway",
                timeout.as_millis()
            );
            return false;
        }
        std::thread::sleep(poll_interval.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimTerminal;

    const POLL: Duration = Duration::from_millis(1);

    #[test]
    fn card_arriving_within_deadline_succeeds() {
        let mut terminal = SimTerminal::with_card_after(3);
        wait_for_card(&mut terminal, Duration::from_millis(200), POLL).unwrap();
    }

    #[test]
    fn absent_card_times_out() {
        let mut terminal = SimTerminal::never_present();
        match wait_for_card(&mut terminal, Duration::from_millis(10), POLL) {
            Err(EngineError::CardPresentTimeout(10)) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn removal_timeout_is_not_an_error() {
        let mut terminal = SimTerminal::with_card_after(0);
        // Card stays put; the wait must come back (false) instead of failing.
        assert!(!wait_for_removal(
            &mut terminal,
            Duration::from_millis(10),
            POLL
        ));
    }
}
