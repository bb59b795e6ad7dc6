use chrono::Utc;
use shared::{
    domain::UserId,
    error::ApiError,
    protocol::{ArchiveChannelRequest, ReadStatusRequest},
};
use tracing::info;

use crate::{
    internal,
    permissions::{require_member, viewer_for},
    unauthorized, ApiContext,
};

/// Archives a channel for the requesting member only. Returns the member id
/// so callers can announce the change.
pub async fn archive_channel(
    ctx: &ApiContext,
    user_id: Option<UserId>,
    request: &ArchiveChannelRequest,
) -> Result<UserId, ApiError> {
    let user_id = user_id.ok_or_else(unauthorized)?;
    let community = ctx
        .storage
        .find_community(request.account_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("community not found"))?;
    let viewer = viewer_for(ctx, &community, Some(user_id)).await?;
    let member = require_member(&viewer)?;

    let channel = ctx
        .storage
        .find_channel(request.channel_id)
        .await
        .map_err(internal)?
        .filter(|channel| channel.community_id == community.id)
        .ok_or_else(|| ApiError::not_found("channel not found"))?;

    let archived = ctx
        .storage
        .archive_channel_for_user(channel.id, member.id)
        .await
        .map_err(internal)?;
    if !archived {
        return Err(ApiError::not_found("channel membership not found"));
    }
    info!(channel_id = %channel.id, user_id = %member.id, "channel archived");
    Ok(member.id)
}

pub async fn mark_channel_read(
    ctx: &ApiContext,
    user_id: Option<UserId>,
    request: &ReadStatusRequest,
) -> Result<(), ApiError> {
    let user_id = user_id.ok_or_else(unauthorized)?;
    let channel = ctx
        .storage
        .find_channel(request.channel_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("channel not found"))?;
    let user = ctx
        .storage
        .find_user(user_id)
        .await
        .map_err(internal)?
        .filter(|user| user.community_id == channel.community_id)
        .ok_or_else(|| ApiError::forbidden("user is not a member of this community"))?;

    ctx.storage
        .mark_channel_read(user.id, channel.id, Utc::now())
        .await
        .map_err(internal)
}
