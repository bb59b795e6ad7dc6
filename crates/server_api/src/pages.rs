use shared::{
    domain::UserId,
    error::ApiError,
    protocol::{InboxProps, SerializedThread, StarThreadRequest, StarredProps},
};
use storage::StoredThread;
use tracing::info;

use crate::{
    community::{load_thread_messages, CommunityView},
    internal,
    permissions::{can_read_channel, require_member, viewer_for},
    serializers::serialize_thread,
    unauthorized, ApiContext, DEFAULT_INBOX_LIMIT, MAX_INBOX_LIMIT,
};

pub async fn inbox_props(
    ctx: &ApiContext,
    user_id: Option<UserId>,
    community_name: &str,
    limit: Option<u32>,
) -> Result<InboxProps, ApiError> {
    let view = CommunityView::load(ctx, community_name, user_id).await?;
    let limit = limit
        .unwrap_or(DEFAULT_INBOX_LIMIT)
        .clamp(1, MAX_INBOX_LIMIT);

    let channel_ids: Vec<_> = view.visible_channels().map(|channel| channel.id).collect();
    let recent = ctx
        .storage
        .recent_threads(&channel_ids, limit)
        .await
        .map_err(internal)?;
    let threads = serialize_threads(ctx, &view, recent).await?;

    Ok(InboxProps {
        channels: view.serialized_channels(),
        dms: view.serialized_dms(),
        settings: view.settings(),
        permissions: view.viewer.permissions.clone(),
        current_community: view.account.clone(),
        is_sub_domain_routing: false,
        threads,
    })
}

pub async fn starred_props(
    ctx: &ApiContext,
    user_id: Option<UserId>,
    community_name: &str,
) -> Result<StarredProps, ApiError> {
    let view = CommunityView::load(ctx, community_name, user_id).await?;
    let threads = match &view.viewer.member {
        Some(member) => {
            let starred = ctx
                .storage
                .list_starred_threads(member.id, view.community.id)
                .await
                .map_err(internal)?;
            serialize_threads(ctx, &view, starred).await?
        }
        None => Vec::new(),
    };

    Ok(StarredProps {
        settings: view.settings(),
        permissions: view.viewer.permissions.clone(),
        current_community: view.account.clone(),
        threads,
    })
}

pub async fn star_thread(
    ctx: &ApiContext,
    user_id: Option<UserId>,
    request: &StarThreadRequest,
) -> Result<(), ApiError> {
    let (member_id, thread) = starrable_thread(ctx, user_id, request).await?;
    ctx.storage
        .star_thread(member_id, thread.id, request.community_id)
        .await
        .map_err(internal)?;
    info!(user_id = %member_id, thread_id = %thread.id, "thread starred");
    Ok(())
}

/// Returns whether a star was removed.
pub async fn unstar_thread(
    ctx: &ApiContext,
    user_id: Option<UserId>,
    request: &StarThreadRequest,
) -> Result<bool, ApiError> {
    let (member_id, thread) = starrable_thread(ctx, user_id, request).await?;
    ctx.storage
        .unstar_thread(member_id, thread.id)
        .await
        .map_err(internal)
}

async fn starrable_thread(
    ctx: &ApiContext,
    user_id: Option<UserId>,
    request: &StarThreadRequest,
) -> Result<(UserId, StoredThread), ApiError> {
    let user_id = user_id.ok_or_else(unauthorized)?;
    let community = ctx
        .storage
        .find_community(request.community_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("community not found"))?;
    let viewer = viewer_for(ctx, &community, Some(user_id)).await?;
    let member = require_member(&viewer)?;

    let thread = ctx
        .storage
        .find_thread(request.thread_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("thread not found"))?;
    let channel = ctx
        .storage
        .find_channel(thread.channel_id)
        .await
        .map_err(internal)?
        .filter(|channel| channel.community_id == community.id)
        .ok_or_else(|| ApiError::not_found("thread not found"))?;
    if !can_read_channel(ctx, &channel, member).await? {
        return Err(ApiError::not_found("thread not found"));
    }
    Ok((member.id, thread))
}

/// Threads whose channel the viewer cannot list are left out.
async fn serialize_threads(
    ctx: &ApiContext,
    view: &CommunityView,
    threads: Vec<StoredThread>,
) -> Result<Vec<SerializedThread>, ApiError> {
    let mut serialized = Vec::with_capacity(threads.len());
    for thread in threads {
        let Some(channel) = view.find_visible_channel(thread.channel_id) else {
            continue;
        };
        let messages = load_thread_messages(ctx, &thread).await?;
        serialized.push(serialize_thread(&thread, Some(channel), messages));
    }
    Ok(serialized)
}
