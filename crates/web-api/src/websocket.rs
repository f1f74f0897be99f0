//! WebSocket 接入
//!
//! 负责握手、生成连接标识，并把 axum 的 `WebSocket` 适配成会话所需的帧流。

use axum::{
    extract::{
        ws::{close_code, rejection::WebSocketUpgradeRejection, CloseFrame, Message, Utf8Bytes, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use domain::ConnectionId;
use futures_util::{future, SinkExt, StreamExt};
use infrastructure::{ConnectionSession, InboundFrame, OutboundFrame};
use tracing::{debug, warn};

use crate::{error::ApiError, state::AppState};

/// 升级响应中携带连接标识的头
pub const CONNECTION_ID_HEADER: HeaderName = HeaderName::from_static("x-connection-id");

pub async fn websocket_upgrade(
    State(state): State<AppState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match upgrade {
        Ok(ws) => ws,
        Err(rejection) => {
            debug!(error = %rejection, "rejected non-websocket request");
            return ApiError::bad_request("expected a websocket upgrade request").into_response();
        }
    };

    let connection_id = ConnectionId::new();
    let mut response = ws
        .on_failed_upgrade(move |err| {
            warn!(connection_id = %connection_id, error = %err, "websocket upgrade failed");
        })
        .on_upgrade(move |socket| run_session(socket, connection_id, state));

    if let Ok(value) = HeaderValue::from_str(&connection_id.to_string()) {
        response.headers_mut().insert(CONNECTION_ID_HEADER, value);
    }
    response
}

async fn run_session(socket: WebSocket, connection_id: ConnectionId, state: AppState) {
    let session = ConnectionSession::accept(
        connection_id,
        state.registry.clone(),
        state.session_settings,
        state.shutdown.clone(),
    )
    .await;

    let (sink, stream) = socket.split();
    let outbound =
        sink.with(|frame: OutboundFrame| future::ready(Ok::<_, axum::Error>(outbound_message(frame))));
    let inbound = stream.map(|item| item.map(inbound_frame));

    let outcome = session.run(inbound, outbound).await;
    debug!(
        connection_id = %outcome.connection_id,
        reason = ?outcome.reason,
        state = %outcome.final_state,
        "websocket connection finished"
    );
}

fn inbound_frame(message: Message) -> InboundFrame {
    match message {
        Message::Text(text) => InboundFrame::Text(text.to_string()),
        Message::Binary(data) => InboundFrame::Binary(data.len()),
        Message::Ping(_) => InboundFrame::Ping,
        Message::Pong(_) => InboundFrame::Pong,
        Message::Close(_) => InboundFrame::Close,
    }
}

fn outbound_message(frame: OutboundFrame) -> Message {
    match frame {
        OutboundFrame::Text(text) => Message::Text(Utf8Bytes::from(&*text)),
        OutboundFrame::Close => Message::Close(Some(CloseFrame {
            code: close_code::NORMAL,
            reason: Utf8Bytes::from_static(""),
        })),
    }
}
