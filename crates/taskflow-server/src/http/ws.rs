//! Real-time socket endpoint
//!
//! The handshake is authenticated like any protected route. Clients then
//! send `{"event": "joinUserRoom", "data": "<userId>"}` (or `join`); only
//! the caller's own id is accepted. Frames pushed by the room registry are
//! forwarded as JSON text messages until either side closes.

use crate::auth::Authenticated;
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use taskflow_core::{Actor, ConnectionHandle, ConnectionId, Frame, UserId};

pub(crate) async fn upgrade(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| serve(socket, state, actor))
}

async fn serve(socket: WebSocket, state: AppState, actor: Actor) {
    let ConnectionHandle { id, mut frames } = match state.rooms.connect() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(user = %actor.id, "socket refused: {}", e);
            return;
        }
    };
    tracing::info!(connection = %id, user = %actor.id, "socket connected");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            outbound = frames.recv() => {
                let Some(frame) = outbound else {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                };
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(connection = %id, "failed to encode frame: {}", e);
                        continue;
                    }
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => on_client_frame(&state, id, actor, &text),
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.rooms.leave_all(id);
    tracing::info!(connection = %id, user = %actor.id, "socket disconnected");
}

/// Room id carried by a join frame: a bare string or `{"userId": ...}`
fn requested_room(data: &Value) -> Option<UserId> {
    let raw = match data {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("userId")?.as_str()?,
        _ => return None,
    };
    raw.parse().ok()
}

fn on_client_frame(state: &AppState, connection: ConnectionId, actor: Actor, text: &str) {
    let reply = match serde_json::from_str::<Frame>(text) {
        Ok(frame) if frame.event == "joinUserRoom" || frame.event == "join" => {
            match requested_room(&frame.data) {
                Some(room) if room == actor.id => match state.rooms.join(connection, room) {
                    Ok(()) => Frame::new("joined", json!({ "room": room })),
                    Err(e) => Frame::error(e.to_string()),
                },
                Some(room) => {
                    tracing::warn!(connection = %connection, user = %actor.id, %room, "foreign room join rejected");
                    Frame::error("You can only join your own room")
                }
                None => Frame::error("Please provide a userId"),
            }
        }
        Ok(frame) => Frame::error(format!("Unknown event: {}", frame.event)),
        Err(_) => Frame::error("Malformed frame"),
    };
    if let Err(e) = state.rooms.send_to(connection, reply) {
        tracing::debug!(connection = %connection, "reply dropped: {}", e);
    }
}
