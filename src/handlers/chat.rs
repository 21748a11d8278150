//! Voice chat WebSocket handler.
//!
//! One task per connection. Inbound binary frames are fed to the relay one
//! at a time; every output frame is written back on the same socket as it
//! is produced. Chunk N's pipeline finishes before chunk N+1 is read, so
//! there is no stage overlap inside a connection. Relay teardown runs
//! exactly once per connection on every exit path.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::relay::VoiceRelay;
use crate::state::AppState;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Voice chat WebSocket endpoint.
///
/// Upgrades the HTTP connection and hands the socket to the relay loop.
pub async fn chat_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one connection to completion.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4();
    info!(%connection_id, "voice chat connection established");

    match drive_session(socket, &state.relay).await {
        Ok(chunks) => {
            info!(%connection_id, chunks, "voice chat connection closed by peer");
        }
        Err(e) => {
            // Transport fault: teardown already ran; axum closes the socket
            // when this task ends.
            error!(%connection_id, error = %e, "voice chat connection faulted");
        }
    }
}

/// Run the relay loop and then tear the relay session down.
///
/// Teardown runs on both exit paths before the result is surfaced, so it
/// executes exactly once per connection.
pub(crate) async fn drive_session<S>(socket: S, relay: &VoiceRelay) -> Result<u64, axum::Error>
where
    S: Stream<Item = Result<Message, axum::Error>> + Sink<Message, Error = axum::Error> + Unpin,
{
    let result = run_session(socket, relay).await;
    relay.teardown().await;
    result
}

/// The per-connection read loop.
///
/// Returns the number of audio chunks relayed, or the transport fault
/// that ended the loop. A graceful peer disconnect (close frame or end of
/// stream) is not a fault.
async fn run_session<S>(mut socket: S, relay: &VoiceRelay) -> Result<u64, axum::Error>
where
    S: Stream<Item = Result<Message, axum::Error>> + Sink<Message, Error = axum::Error> + Unpin,
{
    let mut chunks = 0u64;

    while let Some(message) = socket.next().await {
        match message? {
            Message::Binary(chunk) => {
                chunks += 1;
                debug!(bytes = chunk.len(), "received audio chunk");

                // Forward each output frame as soon as it is produced; the
                // next inbound chunk is not read until the stream is drained.
                let mut output = relay.process_boxed(chunk);
                while let Some(frame) = output.next().await {
                    debug!(bytes = frame.len(), "sending audio frame");
                    socket.send(Message::Binary(frame)).await?;
                }
            }
            Message::Close(_) => {
                debug!("received close frame");
                break;
            }
            Message::Text(_) => {
                warn!("ignoring unexpected text frame on audio socket");
            }
            // Pings are answered by the transport layer.
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    Ok(chunks)
}
