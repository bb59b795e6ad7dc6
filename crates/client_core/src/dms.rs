use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::{
    domain::{ChannelId, CommunityId, UserId},
    protocol::{ArchiveChannelRequest, ReadStatusRequest, SerializedChannel},
};
use tracing::{info, warn};

use crate::{debounce::Debouncer, error::NavError, transport::ChannelTransport, ClientSettings};

#[derive(Debug, Default)]
struct NavState {
    dms: Vec<SerializedChannel>,
    /// One entry per unread highlight, so ids repeat.
    highlights: Vec<ChannelId>,
    active: Option<ChannelId>,
}

/// Direct-message navigation for one signed-in user in one community.
pub struct DmNavigation {
    user_id: UserId,
    account_id: Option<CommunityId>,
    transport: Arc<dyn ChannelTransport>,
    read_status: Debouncer<ChannelId, Result<(), NavError>>,
    state: Mutex<NavState>,
}

impl DmNavigation {
    /// Must be called inside a Tokio runtime.
    pub fn new(
        settings: &ClientSettings,
        user_id: UserId,
        account_id: Option<CommunityId>,
        dms: Vec<SerializedChannel>,
        transport: Arc<dyn ChannelTransport>,
    ) -> Self {
        Self {
            user_id,
            account_id,
            transport,
            read_status: Debouncer::new(settings.debounce_window),
            state: Mutex::new(NavState {
                dms,
                ..NavState::default()
            }),
        }
    }

    /// DMs shown in the nav, hidden ones left out.
    pub fn visible_dms(&self) -> Vec<SerializedChannel> {
        self.state()
            .dms
            .iter()
            .filter(|dm| !dm.hidden)
            .cloned()
            .collect()
    }

    pub fn active(&self) -> Option<ChannelId> {
        self.state().active
    }

    pub fn push_highlight(&self, channel_id: ChannelId) {
        self.state().highlights.push(channel_id);
    }

    pub fn highlight_count(&self, channel_id: ChannelId) -> usize {
        self.state()
            .highlights
            .iter()
            .filter(|id| **id == channel_id)
            .count()
    }

    pub fn is_highlighted(&self, channel_id: ChannelId) -> bool {
        self.active() != Some(channel_id) && self.highlight_count(channel_id) > 0
    }

    /// Channels with at least one highlight, for badge rendering.
    pub fn highlighted_channels(&self) -> HashSet<ChannelId> {
        let state = self.state();
        state
            .highlights
            .iter()
            .copied()
            .filter(|id| state.active != Some(*id))
            .collect()
    }

    /// Activates a DM, clears its highlights and records it as read. Rapid
    /// repeated selections of one DM send a single read-status update.
    pub async fn select(&self, channel_id: ChannelId) -> Result<(), NavError> {
        {
            let mut state = self.state();
            state.active = Some(channel_id);
            state.highlights.retain(|id| *id != channel_id);
        }

        let transport = Arc::clone(&self.transport);
        let user_id = self.user_id;
        let job = async move {
            transport
                .mark_channel_read(user_id, &ReadStatusRequest { channel_id })
                .await
                .map_err(|error| {
                    warn!(%channel_id, %error, "read status update failed");
                    NavError::ReadStatus
                })
        };
        self.read_status
            .call(channel_id, job)
            .await
            .map_err(|_| NavError::ReadStatus)?
    }

    /// Archives a DM for this user. Without a community this is a no-op and
    /// returns `Ok(false)`.
    pub async fn archive(&self, channel_id: ChannelId) -> Result<bool, NavError> {
        let Some(account_id) = self.account_id else {
            return Ok(false);
        };
        self.transport
            .archive_channel(
                self.user_id,
                &ArchiveChannelRequest {
                    channel_id,
                    account_id,
                },
            )
            .await
            .map_err(|error| {
                warn!(%channel_id, %error, "archive failed");
                NavError::Archive
            })?;

        self.remove_dm(channel_id);
        info!(%channel_id, "dm archived");
        Ok(true)
    }

    /// Drops a DM from the local list, e.g. after an archive pushed from
    /// another session.
    pub fn remove_dm(&self, channel_id: ChannelId) {
        let mut state = self.state();
        state.dms.retain(|dm| dm.id != channel_id);
        state.highlights.retain(|id| *id != channel_id);
        if state.active == Some(channel_id) {
            state.active = None;
        }
    }

    fn state(&self) -> MutexGuard<'_, NavState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
