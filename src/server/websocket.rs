//! WebSocket handler for the labelling protocol.
//!
//! Each text frame carries `{"event": ..., "data": ...}`. Requests on one
//! connection are answered in order, one at a time.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AppState, http::ApiError};
use crate::session::{GetLabelsRequest, SessionError};

/// Message received from the client.
#[derive(Debug, Deserialize)]
struct ClientMessage {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Message sent to the client.
#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct ServerMessage {
    pub event: &'static str,
    pub data: Value,
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    log::debug!("WebSocket client connected");

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Axum answers pings itself
            _ => continue,
        };

        let reply = dispatch(&state, &text).await;
        let encoded = match serde_json::to_string(&reply) {
            Ok(encoded) => encoded,
            Err(err) => {
                log::error!("Failed to encode {} reply: {}", reply.event, err);
                continue;
            }
        };
        if sender.send(Message::Text(encoded)).await.is_err() {
            break;
        }
    }

    log::debug!("WebSocket client disconnected");
}

/// Answer one client message.
pub(crate) async fn dispatch(state: &AppState, text: &str) -> ServerMessage {
    match handle_event(state, text).await {
        Ok((event, data)) => ServerMessage { event, data },
        Err(err) => {
            log::warn!("WebSocket request failed: {}", err.to_json());
            ServerMessage {
                event: "error",
                data: err.to_json(),
            }
        }
    }
}

async fn handle_event(state: &AppState, text: &str) -> Result<(&'static str, Value), ApiError> {
    let message: ClientMessage = serde_json::from_str(text)
        .map_err(|err| ApiError::BadPayload(format!("invalid message: {err}")))?;

    match message.event.as_str() {
        "get_labels" => {
            let request = GetLabelsRequest::from_json(message.data)?;
            let header = state
                .run_blocking(move |handler| handler.get_labels(&request.image_id))
                .await?;
            Ok(("get_labels_reply", to_value(&header)?))
        }
        "set_labels" => {
            let data = message.data;
            state
                .run_blocking(move |handler| handler.set_labels_json(data))
                .await?;
            Ok(("set_labels_reply", Value::String(String::new())))
        }
        "dextr" => {
            let data = message.data;
            let reply = state
                .run_blocking(move |handler| handler.assist(&data))
                .await?;
            Ok(("dextr_reply", to_value(&reply)?))
        }
        other => Err(ApiError::Session(SessionError::UnknownCommand {
            message: format!("unknown event '{other}'"),
        })),
    }
}

fn to_value(value: &impl Serialize) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|err| ApiError::Internal(err.to_string()))
}
