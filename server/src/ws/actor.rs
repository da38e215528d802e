use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

use crate::chat::dispatch::{Outcome, Relay};
use crate::error::RelayError;
use crate::state::{AppState, ConnectionSettings};
use crate::ws::registry::{Connection, ConnectionId};

/// Run the actor-per-connection pattern for an upgraded WebSocket.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards messages from an mpsc channel,
///   each write bounded by the configured send timeout
/// - Reader loop: decodes incoming text frames and dispatches them to the relay
///
/// Broadcasts only ever push onto the channel, so a slow client never stalls
/// delivery to anyone else. The loop also ends when the writer stops or the
/// keepalive expires; either way the connection goes through the relay's
/// disconnect path.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();
    let conn = Connection::new(tx.clone());
    let relay = state.relay.clone();
    let settings = state.connection;

    relay.on_connect(&conn);

    let mut writer_handle = tokio::spawn(writer_task(
        ws_sender,
        rx,
        conn.id(),
        settings.send_timeout,
    ));

    // Track pong reception
    let (pong_tx, pong_rx) = mpsc::unbounded_channel::<()>();
    let mut ping_handle = tokio::spawn(ping_task(tx.clone(), pong_rx, settings, conn.id()));

    loop {
        tokio::select! {
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(msg)) => match msg {
                    Message::Text(text) => {
                        handle_text(&relay, &conn, text.as_str());
                    }
                    Message::Binary(data) => {
                        tracing::debug!(
                            conn_id = %conn.id(),
                            bytes = data.len(),
                            "Ignoring binary frame"
                        );
                    }
                    Message::Pong(_) => {
                        let _ = pong_tx.send(());
                    }
                    Message::Ping(data) => {
                        let _ = tx.send(Message::Pong(data));
                    }
                    Message::Close(frame) => {
                        tracing::info!(
                            conn_id = %conn.id(),
                            reason = ?frame,
                            "Client initiated close"
                        );
                        break;
                    }
                },
                Some(Err(e)) => {
                    tracing::warn!(conn_id = %conn.id(), error = %e, "WebSocket receive error");
                    break;
                }
                None => {
                    tracing::info!(conn_id = %conn.id(), "WebSocket stream ended");
                    break;
                }
            },
            _ = &mut writer_handle => {
                tracing::info!(conn_id = %conn.id(), "Writer stopped, closing connection");
                break;
            }
            _ = &mut ping_handle => {
                tracing::info!(conn_id = %conn.id(), "Keepalive expired, closing connection");
                break;
            }
        }
    }

    writer_handle.abort();
    ping_handle.abort();

    match relay.on_disconnect(conn.id()) {
        Ok(departure) => {
            tracing::debug!(
                conn_id = %conn.id(),
                member_id = departure.identity.id,
                failed = departure.report.failed.len(),
                "Departure announced"
            );
        }
        Err(RelayError::NotFound(_)) => {
            tracing::debug!(conn_id = %conn.id(), "Connection closed before joining");
        }
        Err(e) => {
            tracing::warn!(conn_id = %conn.id(), error = %e, "Disconnect handling failed");
        }
    }
}

/// Dispatch one text frame and log whatever went wrong. Nothing here is fatal.
fn handle_text(relay: &Relay, conn: &Connection, text: &str) {
    match relay.on_frame(conn, text) {
        Ok(Outcome::Joined { .. }) => {}
        Ok(Outcome::Message { sender, report }) => {
            tracing::debug!(
                conn_id = %conn.id(),
                member_id = sender.id,
                recipients = report.delivered,
                "Chat message broadcast"
            );
        }
        Err(e @ RelayError::MalformedFrame(_)) => {
            tracing::warn!(
                conn_id = %conn.id(),
                error = %e,
                frame = %text.chars().take(100).collect::<String>(),
                "Dropping malformed frame"
            );
        }
        Err(e) => {
            tracing::debug!(conn_id = %conn.id(), error = %e, "Dropping frame");
        }
    }
}

/// Writer task: receives messages from mpsc channel and forwards them to the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    conn_id: ConnectionId,
    send_timeout: Duration,
) {
    while let Some(msg) = rx.recv().await {
        match timeout(send_timeout, ws_sender.send(msg)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket send failed");
                break;
            }
            Err(_) => {
                tracing::warn!(
                    conn_id = %conn_id,
                    timeout_ms = send_timeout.as_millis() as u64,
                    "WebSocket send timed out"
                );
                break;
            }
        }
    }
}

/// Sends periodic pings. Returns once a pong is late or the writer is gone,
/// which ends the reader loop.
async fn ping_task(
    tx: mpsc::UnboundedSender<Message>,
    mut pong_rx: mpsc::UnboundedReceiver<()>,
    settings: ConnectionSettings,
    conn_id: ConnectionId,
) {
    // interval() panics on a zero period
    let mut ping_timer = interval(settings.ping_interval.max(Duration::from_millis(1)));
    // Skip the first immediate tick
    ping_timer.tick().await;

    loop {
        ping_timer.tick().await;

        if tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
            // Writer task has died
            return;
        }

        match timeout(settings.pong_timeout, pong_rx.recv()).await {
            Ok(Some(())) => {}
            _ => {
                tracing::warn!(conn_id = %conn_id, "Pong timeout, closing connection");
                let _ = tx.send(Message::Close(Some(CloseFrame {
                    code: 1001,
                    reason: "Pong timeout".into(),
                })));
                return;
            }
        }
    }
}
