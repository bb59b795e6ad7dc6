use server_api::{ApiContext, Audience};
use shared::protocol::ServerEvent;
use tokio::sync::broadcast;

/// An event together with the users allowed to receive it.
#[derive(Debug, Clone)]
pub(crate) struct Push {
    pub(crate) event: ServerEvent,
    pub(crate) audience: Audience,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) events: broadcast::Sender<Push>,
}

impl AppState {
    pub(crate) fn new(api: ApiContext, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self { api, events }
    }

    /// Nobody listening is not an error.
    pub(crate) fn publish(&self, event: ServerEvent, audience: Audience) {
        let _ = self.events.send(Push { event, audience });
    }
}
