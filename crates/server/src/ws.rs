use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use shared::domain::UserId;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{debug, warn};

use crate::{
    app_state::{AppState, Push},
    routes::UserQuery,
};

pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(q): Query<UserQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket, q.user_id))
}

async fn ws_connection(state: Arc<AppState>, socket: WebSocket, user_id: Option<UserId>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = BroadcastStream::new(state.events.subscribe());

    let send_task = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let push = match event {
                Ok(push) => push,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "push subscriber lagged");
                    continue;
                }
            };
            let Some(text) = frame_for(&push, user_id) else {
                continue;
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    debug!(user_id = ?user_id, "push subscriber disconnected");
    send_task.abort();
}

/// The text frame for `user_id`, or `None` when the push is not meant for them.
pub(crate) fn frame_for(push: &Push, user_id: Option<UserId>) -> Option<String> {
    if !push.audience.includes(user_id) {
        return None;
    }
    serde_json::to_string(&push.event).ok()
}
