//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{validate_command, DuelHandle};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let connection_id = Uuid::new_v4();
    debug!(connection_id = %connection_id, "WebSocket upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, connection_id, state.duel))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, connection_id: Uuid, duel: DuelHandle) {
    info!(connection_id = %connection_id, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();

    let welcome = ServerMsg::Welcome {
        connection_id,
        server_time: unix_millis(),
    };

    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(connection_id = %connection_id, error = %e, "Failed to send welcome");
        return;
    }

    // Late joiners get the current state before the next broadcast
    let current = ServerMsg::Snapshot(duel.snapshot().as_ref().clone());
    if let Err(e) = send_msg(&mut ws_sink, &current).await {
        debug!(connection_id = %connection_id, error = %e, "Failed to send initial snapshot");
        return;
    }

    let events_rx = duel.subscribe();
    run_session(connection_id, ws_sink, ws_stream, duel, events_rx).await;

    info!(connection_id = %connection_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    connection_id: Uuid,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    duel: DuelHandle,
    mut events_rx: broadcast::Receiver<ServerMsg>,
) {
    let rate_limiter = ConnectionRateLimiter::new();

    // Replies meant only for this connection
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMsg>(16);

    // Spawn writer task: duel broadcasts and replies -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(reply) = reply_rx.recv() => Ok(reply),
                event = events_rx.recv() => event,
            };

            match received {
                Ok(msg) => {
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(connection_id = %connection_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        connection_id = %connection_id,
                        lagged_count = n,
                        "Client lagged, skipping {} messages", n
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(connection_id = %connection_id, "Duel channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> duel loop
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(connection_id = %connection_id, "Rate limited input message");
                    continue;
                }

                let client_msg = match parse_client_msg(&text) {
                    Ok(msg) => msg,
                    Err(reply) => {
                        warn!(connection_id = %connection_id, reply = ?reply, "Rejected client message");
                        if reply_tx.try_send(reply).is_err() {
                            debug!(connection_id = %connection_id, "Reply queue full, dropping error");
                        }
                        continue;
                    }
                };

                if duel.send(connection_id, client_msg).await.is_err() {
                    debug!(connection_id = %connection_id, "Input channel closed");
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(connection_id = %connection_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(connection_id = %connection_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Decode and check an inbound text frame, or build the error reply
fn parse_client_msg(text: &str) -> Result<ClientMsg, ServerMsg> {
    let msg = serde_json::from_str::<ClientMsg>(text).map_err(|e| ServerMsg::Error {
        code: "invalid_message".to_string(),
        message: e.to_string(),
    })?;

    validate_command(&msg).map_err(|e| ServerMsg::Error {
        code: "invalid_command".to_string(),
        message: e.to_string(),
    })?;

    Ok(msg)
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_code(reply: ServerMsg) -> String {
        match reply {
            ServerMsg::Error { code, .. } => code,
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn malformed_json_gets_invalid_message() {
        let reply = parse_client_msg(r#"{"type":"teleport"}"#).unwrap_err();
        assert_eq!(error_code(reply), "invalid_message");
    }

    #[test]
    fn unknown_player_gets_invalid_command() {
        let reply = parse_client_msg(r#"{"type":"sign","player":3,"sign":"ram"}"#).unwrap_err();
        match reply {
            ServerMsg::Error { code, message } => {
                assert_eq!(code, "invalid_command");
                assert!(message.contains('3'));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn valid_command_passes_through() {
        let msg = parse_client_msg(r#"{"type":"cast","player":2,"ability":"wall"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Cast { player: 2, .. }));
    }
}
