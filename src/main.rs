use crossbeam_channel::unbounded;
use log::info;
use tokio::sync::broadcast;

use mifare_service::service;
use mifare_service::types::{CardCommand, OutgoingMessage};
use mifare_service::ws;

#[tokio::main]
async fn main() {
    env_logger::init();
    info!("Starting MIFARE card service...");

    // Channel: WS -> card worker (commands)
    // Crossbeam (sync) because the card worker is a blocking OS thread.
    let (cmd_tx, cmd_rx) = unbounded::<CardCommand>();

    // Channel: card worker -> WS (events)
    let (event_tx, event_rx) = broadcast::channel::<OutgoingMessage>(100);

    // The card worker itself is fully blocking (presence waits, transmits),
    // so it gets its own OS thread; a crossbeam channel bridges its events
    // into the tokio broadcast.
    let event_tx_clone = event_tx.clone();
    std::thread::spawn(move || {
        let (bridge_tx, bridge_rx) = unbounded::<OutgoingMessage>();

        std::thread::spawn(move || {
            service::run(bridge_tx, cmd_rx);
        });

        while let Ok(msg) = bridge_rx.recv() {
            let _ = event_tx_clone.send(msg);
        }
    });

    ws::start_server(cmd_tx, event_rx).await;
}
