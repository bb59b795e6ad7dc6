use std::time::Duration;

use shared::protocol::ServerEvent;

pub mod debounce;
pub mod dms;
pub mod error;
pub mod realtime;
pub mod send;
pub mod session;
pub mod timeline;
pub mod transport;

pub use debounce::{Debouncer, DebouncerClosed};
pub use dms::DmNavigation;
pub use error::{NavError, SendError, TransportError};
pub use send::{
    MissingSignInFlow, OptimisticSendCoordinator, SendOutcome, SendParams, SignInContinuation,
    SignInFlow,
};
pub use session::ThreadSession;
pub use timeline::{
    DeliveryState, MessageListUpdater, MessageTimeline, SharedTimeline, TimelineEntry,
};
pub use transport::{ChannelTransport, HttpTransport, MessageTransport};

pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub debounce_window: Duration,
    pub send_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8443".into(),
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

impl ClientSettings {
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    Server(ServerEvent),
    Error(String),
    Disconnected,
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
