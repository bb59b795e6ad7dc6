use anyhow::{anyhow, Context, Result};
use futures::StreamExt;
use shared::{
    domain::{ThreadId, UserId},
    protocol::ServerEvent,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use crate::{send::OptimisticSendCoordinator, ClientEvent};

pub fn ws_url(server_url: &str, user_id: UserId) -> Result<String> {
    let server_url = server_url.trim_end_matches('/');
    let ws_url = if server_url.starts_with("https://") {
        server_url.replacen("https://", "wss://", 1)
    } else if server_url.starts_with("http://") {
        server_url.replacen("http://", "ws://", 1)
    } else {
        return Err(anyhow!("server_url must start with http:// or https://"));
    };
    Ok(format!("{ws_url}/ws?user_id={user_id}"))
}

/// Connects the push channel and forwards every server event to `events`
/// until the socket closes.
pub async fn spawn_push_feed(
    server_url: &str,
    user_id: UserId,
    events: broadcast::Sender<ClientEvent>,
) -> Result<JoinHandle<()>> {
    let ws_url = ws_url(server_url, user_id)?;
    let (ws_stream, _) = connect_async(&ws_url)
        .await
        .with_context(|| format!("failed to connect websocket: {ws_url}"))?;
    let (_, mut ws_reader) = ws_stream.split();

    Ok(tokio::spawn(async move {
        while let Some(msg) = ws_reader.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(event) => {
                        let _ = events.send(ClientEvent::Server(event));
                    }
                    Err(err) => {
                        let _ = events.send(ClientEvent::Error(format!("invalid server event: {err}")));
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    let _ = events.send(ClientEvent::Error(format!(
                        "websocket receive failed: {err}"
                    )));
                    break;
                }
            }
        }
        let _ = events.send(ClientEvent::Disconnected);
    }))
}

/// Feeds pushed messages of one thread into the coordinator's timeline.
pub fn forward_thread_messages(
    coordinator: OptimisticSendCoordinator,
    thread_id: ThreadId,
    mut events: broadcast::Receiver<ClientEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ClientEvent::Server(ServerEvent::MessageCreated {
                    message,
                    imitation_id,
                    ..
                })) if message.thread_id == thread_id => {
                    let message_id = message.id;
                    if coordinator.apply_pushed_message(message, imitation_id) {
                        debug!(%message_id, "pushed message merged");
                    }
                }
                Ok(ClientEvent::Disconnected) => break,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "client event receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_swaps_scheme_and_appends_identity() {
        let user_id = UserId::new();
        assert_eq!(
            ws_url("https://chat.example.com/", user_id).expect("url"),
            format!("wss://chat.example.com/ws?user_id={user_id}")
        );
        assert_eq!(
            ws_url("http://127.0.0.1:8443", user_id).expect("url"),
            format!("ws://127.0.0.1:8443/ws?user_id={user_id}")
        );
        assert!(ws_url("ftp://nope", user_id).is_err());
    }
}
