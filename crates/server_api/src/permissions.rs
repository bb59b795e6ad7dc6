use std::collections::HashSet;

use shared::{
    domain::{ChannelId, ChannelType, CommunityType, UserId},
    error::ApiError,
    protocol::Permissions,
};
use storage::{StoredChannel, StoredCommunity, StoredUser};

use crate::{internal, serializers::serialize_user, ApiContext};

/// Resolved requester for one community.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub permissions: Permissions,
    /// Set when the requester belongs to the community.
    pub member: Option<StoredUser>,
    /// Set whenever the requester is a known user, member or not.
    pub user: Option<StoredUser>,
}

/// Public communities are readable by anyone. Private ones only by members.
/// Chatting requires membership and managing requires an owner or admin role.
pub async fn viewer_for(
    ctx: &ApiContext,
    community: &StoredCommunity,
    user_id: Option<UserId>,
) -> Result<Viewer, ApiError> {
    let user = match user_id {
        Some(user_id) => ctx.storage.find_user(user_id).await.map_err(internal)?,
        None => None,
    };
    let member = user
        .as_ref()
        .filter(|user| user.community_id == community.id)
        .cloned();
    let is_public = community.kind == CommunityType::Public;

    let permissions = match &member {
        Some(member) => Permissions {
            access: true,
            chat: true,
            manage: member.role.can_manage(),
            account_id: Some(community.id),
            user: Some(serialize_user(member)),
        },
        None => Permissions::anonymous(is_public),
    };

    Ok(Viewer {
        permissions,
        member,
        user,
    })
}

pub(crate) fn require_member(viewer: &Viewer) -> Result<&StoredUser, ApiError> {
    viewer
        .member
        .as_ref()
        .ok_or_else(|| ApiError::forbidden("user is not a member of this community"))
}

/// Public channels are open to every member. Private channels and DMs only to
/// the users added to them.
pub(crate) async fn can_read_channel(
    ctx: &ApiContext,
    channel: &StoredChannel,
    member: &StoredUser,
) -> Result<bool, ApiError> {
    if channel.kind == ChannelType::Public {
        return Ok(true);
    }
    ctx.storage
        .is_channel_member(channel.id, member.id)
        .await
        .map_err(internal)
}

/// Who may receive pushes about a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Anyone, anonymous readers included.
    Everyone,
    Users(HashSet<UserId>),
}

impl Audience {
    pub fn includes(&self, user_id: Option<UserId>) -> bool {
        match self {
            Self::Everyone => true,
            Self::Users(users) => user_id.is_some_and(|id| users.contains(&id)),
        }
    }
}

/// Public channels of public communities reach everyone. Other public
/// channels reach the community's users, and private channels and DMs reach
/// their members.
pub async fn channel_audience(ctx: &ApiContext, channel_id: ChannelId) -> Result<Audience, ApiError> {
    let channel = ctx
        .storage
        .find_channel(channel_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("channel not found"))?;
    if channel.kind != ChannelType::Public {
        let members = ctx
            .storage
            .channel_member_ids(channel.id)
            .await
            .map_err(internal)?;
        return Ok(Audience::Users(members.into_iter().collect()));
    }

    let community = ctx
        .storage
        .find_community(channel.community_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("community not found"))?;
    if community.kind == CommunityType::Public {
        return Ok(Audience::Everyone);
    }
    let users = ctx
        .storage
        .community_user_ids(community.id)
        .await
        .map_err(internal)?;
    Ok(Audience::Users(users.into_iter().collect()))
}
