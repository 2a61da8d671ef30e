// src/ws.rs
use crate::types::{CardCommand, IncomingMessage, OutgoingMessage};
use crossbeam_channel::Sender;
use futures::{SinkExt, StreamExt};
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::broadcast;
use warp::Filter;

pub async fn start_server(
    card_cmd_tx: Sender<CardCommand>,
    mut card_event_rx: broadcast::Receiver<OutgoingMessage>,
) {
    // Shared broadcast channel for WS clients
    let (ws_tx, _) = broadcast::channel::<OutgoingMessage>(32);
    let ws_tx = Arc::new(ws_tx);

    // Forward card worker events -> all WS clients
    let ws_tx_clone = ws_tx.clone();
    tokio::spawn(async move {
        while let Ok(msg) = card_event_rx.recv().await {
            let _ = ws_tx_clone.send(msg);
        }
    });

    let ws_route = warp::path::end()
        .and(warp::ws())
        .map(move |ws: warp::ws::Ws| {
            let card_cmd_tx = card_cmd_tx.clone();
            let ws_tx = ws_tx.clone();
            ws.on_upgrade(move |socket| handle_connection(socket, card_cmd_tx, ws_tx))
        });

    let routes = ws_route.with(warp::cors().allow_any_origin());

    info!("WebSocket server running on ws://127.0.0.1:3500");
    warp::serve(routes).run(([127, 0, 0, 1], 3500)).await;
}

async fn handle_connection(
    ws: warp::ws::WebSocket,
    card_cmd_tx: Sender<CardCommand>,
    ws_tx: Arc<broadcast::Sender<OutgoingMessage>>,
) {
    let (mut client_ws_tx, mut client_ws_rx) = ws.split();
    let mut rx_broadcast = ws_tx.subscribe();

    // Broadcasts -> this client
    tokio::spawn(async move {
        while let Ok(msg) = rx_broadcast.recv().await {
            let Ok(json) = serde_json::to_string(&msg) else {
                continue;
            };
            if client_ws_tx
                .send(warp::ws::Message::text(json))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    // Client -> card worker
    while let Some(result) = client_ws_rx.next().await {
        let Ok(msg) = result else { break };
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_str() else { continue };
        let Ok(parsed) = serde_json::from_str::<IncomingMessage>(text) else {
            debug!("ignoring unparseable client message: {}", text);
            continue;
        };

        let cmd = match parsed {
            IncomingMessage::GET_READER_STATUS => CardCommand::CheckReaderStatus,
            IncomingMessage::READ_UID => CardCommand::ReadUid,
            IncomingMessage::READ_TEXT => CardCommand::ReadText,
            IncomingMessage::WRITE_TEXT {
                text,
                present_timeout_ms,
                absent_timeout_ms,
            } => CardCommand::WriteText {
                text,
                present_timeout_ms,
                absent_timeout_ms,
            },
        };
        let _ = card_cmd_tx.send(cmd);
    }
}
