//! Per-connection session — canvas subscription, read loop, outbound drain.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use tileboard_core::protocol::{PixelWrite, ACK};

use crate::state::AppState;

/// A queued outbound unit. Entries leave the queue strictly in order,
/// one socket write in flight at a time.
enum Outbound {
    /// Text acknowledgment for a parsed pixel write.
    Ack,
    /// Full canvas snapshot, row-major bytes.
    Snapshot(Vec<u8>),
}

/// Run one client session to completion.
///
/// The session subscribes to the canvas for its whole lifetime. Inbound
/// frames and change notifications are handled on this task; everything
/// going out passes through the session's own queue, drained by a task
/// that owns the write half of the socket.
pub async fn handle_socket(state: Arc<AppState>, ws: WebSocket) {
    let conn_id = Uuid::new_v4();
    let (ws_tx, mut ws_rx) = ws.split();

    let (out_tx, out_rx) = mpsc::unbounded_channel::<Outbound>();
    let drain_task = tokio::spawn(drain_outbound(ws_tx, out_rx));

    let mut subscription = state.canvas.subscribe();
    info!(%conn_id, subscribers = state.canvas.subscriber_count(), "client connected");

    loop {
        tokio::select! {
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<PixelWrite>(&text) {
                        Ok(write) => {
                            if let Err(e) = state.canvas.write_pixel(write.x, write.y, write.color) {
                                // A rejected write still acks and still broadcasts
                                warn!(%conn_id, %e, "pixel write rejected");
                            }
                            if out_tx.send(Outbound::Ack).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(%conn_id, %e, "dropping malformed message");
                        }
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    warn!(%conn_id, "ignoring non-text frame");
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    // Axum answers pings itself
                }
                Some(Ok(Message::Close(_))) => {
                    debug!(%conn_id, "client requested close");
                    break;
                }
                Some(Err(e)) => {
                    error!(%conn_id, %e, "websocket error");
                    break;
                }
                None => break,
            },
            changed = subscription.changed() => {
                if changed.is_none() {
                    break;
                }
                let snapshot = state.canvas.snapshot();
                debug!(%conn_id, bytes = snapshot.len(), "queueing canvas snapshot");
                if out_tx.send(Outbound::Snapshot(snapshot)).is_err() {
                    break;
                }
            }
        }
    }

    // Unsubscribe before closing so nothing further lands in the queue,
    // then let the drain task flush it and run the close handshake.
    drop(subscription);
    drop(out_tx);
    if let Err(e) = drain_task.await {
        debug!(%conn_id, %e, "drain task aborted");
    }
    info!(%conn_id, subscribers = state.canvas.subscriber_count(), "client disconnected");
}

/// Consume the outbound queue, issuing exactly one socket write at a
/// time. When the queue closes, attempt a best-effort close handshake.
async fn drain_outbound(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut out_rx: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(entry) = out_rx.recv().await {
        let msg = match entry {
            Outbound::Ack => Message::Text(ACK.into()),
            Outbound::Snapshot(cells) => Message::Binary(cells.into()),
        };
        if let Err(e) = ws_tx.send(msg).await {
            debug!(%e, "socket write failed");
            return;
        }
    }

    if let Err(e) = ws_tx.send(Message::Close(None)).await {
        debug!(%e, "close handshake failed");
    }
}
