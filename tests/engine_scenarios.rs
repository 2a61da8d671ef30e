// End-to-end engine runs against the in-memory card simulator.

use std::time::Duration;

use mifare_service::engine::{Engine, Timeouts};
use mifare_service::error::EngineError;
use mifare_service::keys::KeySet;
use mifare_service::sim::{SimCard, SimTerminal};

fn fast_timeouts() -> Timeouts {
    Timeouts {
        present: Duration::from_millis(50),
        absent: Duration::from_millis(5),
        poll_interval: Duration::from_millis(1),
    }
}

fn engine_for(terminal: SimTerminal) -> Engine<SimTerminal> {
    Engine::new(terminal, KeySet::default(), fast_timeouts())
}

#[test]
fn empty_card_takes_first_candidate_block() {
    let terminal = SimTerminal::new(SimCard::blank());
    let card = terminal.card();
    let mut engine = engine_for(terminal);

    let result = engine.write_text("Hello world").unwrap();
    assert_eq!(result.blocks, vec![4]);
    assert_eq!(result.text_written, "Hello world");
    assert_eq!(result.uid, "04A1B2C3");

    let mut expected = [0u8; 16];
    expected[..11].copy_from_slice(b"Hello world");
    assert_eq!(card.block(4), expected);
}

#[test]
fn prefilled_block_shifts_chunks_to_next_empties() {
    let terminal = SimTerminal::new(SimCard::blank());
    let card = terminal.card();
    card.set_block(4, *b"someone was here");

    let mut engine = engine_for(terminal);
    let payload = "12345678901234567890"; // 20 bytes -> 2 chunks
    let result = engine.write_text(payload).unwrap();

    // Block 4 is in use, 7 is a trailer: chunk 1 -> 5, chunk 2 -> 6.
    assert_eq!(result.blocks, vec![5, 6]);
    assert_eq!(card.block(4), *b"someone was here");
}

#[test]
fn unknown_keys_fail_with_no_writable_block() {
    let terminal = SimTerminal::new(SimCard::blank());
    let card = terminal.card();
    for sector in 0..16 {
        card.set_sector_keys(sector, [0x5A; 6], [0xA5; 6]);
    }

    let mut engine = engine_for(terminal);
    match engine.write_text("locked out") {
        Err(EngineError::NoWritableBlockFound { chunk: 1 }) => {}
        other => panic!("unexpected: {:?}", other),
    }
    // Nothing was written anywhere.
    for block in 4..64u8 {
        let data = card.block(block);
        assert!(data.iter().all(|&b| b == 0));
    }
}

#[test]
fn missing_card_times_out_before_any_command() {
    let terminal = SimTerminal::never_present();
    let card = terminal.card();
    let mut engine = engine_for(terminal);

    match engine.write_text("nobody home") {
        Err(EngineError::CardPresentTimeout(_)) => {}
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(card.transmit_count(), 0);
}

#[test]
fn lingering_card_does_not_fail_the_write() {
    // The card never leaves the reader; the absent wait expires but the
    // write still reports success.
    let terminal = SimTerminal::new(SimCard::blank());
    let mut engine = engine_for(terminal);

    let result = engine.write_text("stays put").unwrap();
    assert_eq!(result.blocks, vec![4]);
}

#[test]
fn card_removed_promptly_still_succeeds() {
    let terminal = SimTerminal::with_card_after(2).remove_after(1);
    let mut engine = engine_for(terminal);
    assert!(engine.write_text("in and out").is_ok());
}

#[test]
fn round_trip_reconstructs_payload() {
    let terminal = SimTerminal::new(SimCard::blank());
    let card = terminal.card();
    let mut engine = engine_for(terminal);

    let payload = "a payload long enough to need three separate card blocks";
    let result = engine.write_text(payload).unwrap();
    assert_eq!(result.blocks.len(), payload.len().div_ceil(16));

    let mut bytes = Vec::new();
    for &block in &result.blocks {
        bytes.extend_from_slice(&card.block(block));
    }
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    assert_eq!(bytes, payload.as_bytes());
}

#[test]
fn whitespace_only_payload_is_rejected_without_hardware() {
    let terminal = SimTerminal::new(SimCard::blank());
    let card = terminal.card();
    let mut engine = engine_for(terminal);

    match engine.write_text("   \n") {
        Err(EngineError::EmptyPayload) => {}
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(card.transmit_count(), 0);
}

#[test]
fn written_text_reads_back() {
    let card = SimCard::blank();
    {
        let mut engine = engine_for(SimTerminal::new(card.clone()));
        engine.write_text("Hello world").unwrap();
    }

    let mut engine = engine_for(SimTerminal::new(card));
    let result = engine.read_text().unwrap();
    assert_eq!(result.text, "Hello world");
    assert_eq!(result.uid, "04A1B2C3");
}

#[test]
fn reading_a_fully_locked_card_fails() {
    let terminal = SimTerminal::new(SimCard::blank());
    let card = terminal.card();
    for sector in 0..16 {
        card.set_sector_keys(sector, [0x5A; 6], [0xA5; 6]);
    }

    let mut engine = engine_for(terminal);
    match engine.read_text() {
        Err(EngineError::NoReadableSector) => {}
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn read_uid_returns_uppercase_hex() {
    let terminal = SimTerminal::new(SimCard::blank());
    terminal.card().set_uid(&[0xDE, 0xAD, 0xBE, 0xEF]);
    let mut engine = engine_for(terminal);

    assert_eq!(engine.read_uid().unwrap(), "DEADBEEF");
}

#[test]
fn per_call_timeouts_override_defaults() {
    let terminal = SimTerminal::never_present();
    let mut engine = Engine::new(
        terminal,
        KeySet::default(),
        Timeouts {
            present: Duration::from_secs(60),
            ..fast_timeouts()
        },
    );

    let short = Timeouts {
        present: Duration::from_millis(5),
        ..fast_timeouts()
    };
    match engine.write_text_with("quick", short) {
        Err(EngineError::CardPresentTimeout(5)) => {}
        other => panic!("unexpected: {:?}", other),
    }
}
