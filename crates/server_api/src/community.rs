use std::collections::HashMap;

use shared::{
    domain::{ChannelId, UserId},
    error::ApiError,
    protocol::{SerializedAccount, SerializedChannel, SerializedMessage, Settings},
};
use storage::{StoredChannel, StoredCommunity, StoredThread, StoredUser};

use crate::{
    internal,
    permissions::{viewer_for, Viewer},
    serializers::{serialize_account, serialize_channel, serialize_message},
    ApiContext,
};

/// A community as seen by one requester, with the channels they may list.
pub(crate) struct CommunityView {
    pub community: StoredCommunity,
    pub account: SerializedAccount,
    pub viewer: Viewer,
    pub channels: Vec<StoredChannel>,
    pub private_channels: Vec<StoredChannel>,
    pub dms: Vec<StoredChannel>,
}

impl CommunityView {
    /// 404 for an unknown community, 403 when the requester has no access.
    pub async fn load(
        ctx: &ApiContext,
        community_name: &str,
        user_id: Option<UserId>,
    ) -> Result<Self, ApiError> {
        let community = ctx
            .storage
            .find_community_by_name(community_name)
            .await
            .map_err(internal)?
            .ok_or_else(|| ApiError::not_found("community not found"))?;

        let viewer = viewer_for(ctx, &community, user_id).await?;
        if !viewer.permissions.access {
            return Err(ApiError::forbidden("access to community denied"));
        }

        let channels = ctx
            .storage
            .list_public_channels(community.id)
            .await
            .map_err(internal)?;
        let (private_channels, dms) = match &viewer.member {
            Some(member) => (
                ctx.storage
                    .list_private_channels(community.id, member.id)
                    .await
                    .map_err(internal)?,
                ctx.storage
                    .list_dms(community.id, member.id)
                    .await
                    .map_err(internal)?,
            ),
            None => (Vec::new(), Vec::new()),
        };

        Ok(Self {
            account: serialize_account(&community),
            community,
            viewer,
            channels,
            private_channels,
            dms,
        })
    }

    pub fn settings(&self) -> Settings {
        Settings::from(&self.account)
    }

    /// Public and private channels, in that order.
    pub fn serialized_channels(&self) -> Vec<SerializedChannel> {
        self.channels
            .iter()
            .chain(&self.private_channels)
            .map(serialize_channel)
            .collect()
    }

    pub fn serialized_dms(&self) -> Vec<SerializedChannel> {
        self.dms.iter().map(serialize_channel).collect()
    }

    pub fn find_visible_channel(&self, channel_id: ChannelId) -> Option<&StoredChannel> {
        self.channels
            .iter()
            .chain(&self.dms)
            .chain(&self.private_channels)
            .find(|channel| channel.id == channel_id)
    }

    pub fn visible_channels(&self) -> impl Iterator<Item = &StoredChannel> {
        self.channels
            .iter()
            .chain(&self.private_channels)
            .chain(&self.dms)
    }
}

/// Messages of a thread with their authors resolved.
pub(crate) async fn load_thread_messages(
    ctx: &ApiContext,
    thread: &StoredThread,
) -> Result<Vec<SerializedMessage>, ApiError> {
    let messages = ctx
        .storage
        .list_thread_messages(thread.id)
        .await
        .map_err(internal)?;

    let mut author_cache: HashMap<UserId, Option<StoredUser>> = HashMap::new();
    let mut serialized = Vec::with_capacity(messages.len());
    for message in &messages {
        let author = if let Some(cached) = author_cache.get(&message.sender_id) {
            cached.clone()
        } else {
            let resolved = ctx
                .storage
                .find_user(message.sender_id)
                .await
                .map_err(internal)?;
            author_cache.insert(message.sender_id, resolved.clone());
            resolved
        };
        serialized.push(serialize_message(message, author.as_ref()));
    }
    Ok(serialized)
}
