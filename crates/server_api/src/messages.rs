use shared::{
    domain::{MessageFormat, UserId},
    error::{ApiError, ErrorCode},
    protocol::{SendThreadMessageRequest, SendThreadMessageResponse},
};
use tracing::info;

use crate::{
    internal,
    permissions::{can_read_channel, require_member, viewer_for},
    serializers::serialize_message,
    unauthorized, ApiContext,
};

/// Persists a reply to a thread and echoes the client's imitation id so the
/// sender can swap its optimistic placeholder for the stored message. A
/// repeated imitation id answers with the message stored the first time.
pub async fn send_thread_message(
    ctx: &ApiContext,
    user_id: Option<UserId>,
    request: &SendThreadMessageRequest,
) -> Result<SendThreadMessageResponse, ApiError> {
    let user_id = user_id.ok_or_else(unauthorized)?;
    let body = request.body.trim();
    if body.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "message body cannot be empty",
        ));
    }

    let community = ctx
        .storage
        .find_community(request.community_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("community not found"))?;
    let viewer = viewer_for(ctx, &community, Some(user_id)).await?;
    let sender = require_member(&viewer)?;

    let channel = ctx
        .storage
        .find_channel(request.channel_id)
        .await
        .map_err(internal)?
        .filter(|channel| channel.community_id == community.id)
        .ok_or_else(|| ApiError::not_found("channel not found"))?;
    if !can_read_channel(ctx, &channel, sender).await? {
        return Err(ApiError::forbidden("user is not a member of this channel"));
    }

    let thread = ctx
        .storage
        .find_thread(request.thread_id)
        .await
        .map_err(internal)?
        .filter(|thread| thread.channel_id == channel.id)
        .ok_or_else(|| ApiError::not_found("thread not found"))?;

    let stored = ctx
        .storage
        .insert_message(
            thread.id,
            channel.id,
            sender.id,
            body,
            MessageFormat::Linen,
            Some(request.imitation_id),
        )
        .await
        .map_err(internal)?;
    info!(
        message_id = %stored.id,
        thread_id = %thread.id,
        imitation_id = %request.imitation_id,
        "thread message stored"
    );

    Ok(SendThreadMessageResponse {
        message: serialize_message(&stored, Some(sender)),
        imitation_id: request.imitation_id,
    })
}
