use std::sync::Arc;

use anyhow::anyhow;
use shared::{
    domain::UserId,
    protocol::{SsrThreadRequest, ThreadPageProps},
    thread_url::resolve_thread_url,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::info;

use crate::{
    dms::DmNavigation,
    error::{SendError, TransportError},
    realtime::{forward_thread_messages, spawn_push_feed},
    send::{OptimisticSendCoordinator, SendOutcome, SendParams, SignInFlow},
    timeline::{MessageTimeline, SharedTimeline},
    transport::HttpTransport,
    ClientEvent, ClientSettings,
};

/// One open thread page: its props, visible list and send coordinator.
pub struct ThreadSession {
    settings: ClientSettings,
    transport: Arc<HttpTransport>,
    props: ThreadPageProps,
    timeline: Arc<SharedTimeline>,
    coordinator: OptimisticSendCoordinator,
    events: broadcast::Sender<ClientEvent>,
}

impl ThreadSession {
    /// Loads the thread page and seeds the timeline with its messages. The
    /// signed-in user, if any, comes from the page permissions.
    pub async fn open(
        settings: ClientSettings,
        user_id: Option<UserId>,
        community_name: &str,
        thread_id: &str,
        sign_in: Arc<dyn SignInFlow>,
    ) -> Result<Self, TransportError> {
        let transport = Arc::new(HttpTransport::new(&settings.server_url)?);
        let props = transport
            .thread_page_props(
                user_id,
                &SsrThreadRequest {
                    thread_id: thread_id.to_string(),
                    community_name: community_name.to_string(),
                    slug: None,
                },
            )
            .await?;

        let timeline = Arc::new(SharedTimeline::new(MessageTimeline::from_messages(
            props.thread.messages.iter().cloned(),
        )));
        let coordinator = OptimisticSendCoordinator::new(
            &settings,
            transport.clone(),
            sign_in,
            timeline.clone(),
        );
        coordinator.set_current_user(props.permissions.user.clone());
        let (events, _) = broadcast::channel(256);

        info!(
            community = %props.current_community.name,
            thread_id = %props.thread.id,
            signed_in = props.permissions.user.is_some(),
            "thread session opened"
        );
        Ok(Self {
            settings,
            transport,
            props,
            timeline,
            coordinator,
            events,
        })
    }

    pub fn props(&self) -> &ThreadPageProps {
        &self.props
    }

    pub fn thread_url(&self) -> Option<String> {
        resolve_thread_url(&self.props.thread, &self.props.current_community)
    }

    pub fn timeline(&self) -> &Arc<SharedTimeline> {
        &self.timeline
    }

    pub fn coordinator(&self) -> &OptimisticSendCoordinator {
        &self.coordinator
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn send(&self, body: impl Into<String>) -> Result<SendOutcome, SendError> {
        self.coordinator
            .send(SendParams {
                body: body.into(),
                community_id: self.props.current_community.id,
                channel_id: self.props.current_channel.id,
                thread_id: self.props.thread.id,
                mentions: Vec::new(),
            })
            .await
    }

    /// Subscribes to server pushes and merges new replies of this thread.
    pub async fn connect_push(&self) -> anyhow::Result<JoinHandle<()>> {
        let user = self
            .coordinator
            .current_user()
            .ok_or_else(|| anyhow!("push channel needs a signed-in user"))?;
        let forward = forward_thread_messages(
            self.coordinator.clone(),
            self.props.thread.id,
            self.events.subscribe(),
        );
        if let Err(err) =
            spawn_push_feed(&self.settings.server_url, user.id, self.events.clone()).await
        {
            forward.abort();
            return Err(err);
        }
        Ok(forward)
    }

    /// DM navigation for the signed-in user, seeded from the page's DMs.
    pub fn dm_navigation(&self) -> Option<DmNavigation> {
        let user = self.coordinator.current_user()?;
        Some(DmNavigation::new(
            &self.settings,
            user.id,
            self.props.permissions.account_id,
            self.props.dms.clone(),
            self.transport.clone(),
        ))
    }
}
