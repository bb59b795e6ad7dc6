//! Props for the server-rendered thread page.

use shared::{
    domain::UserId,
    error::ApiError,
    protocol::{SsrThreadRequest, ThreadPageProps},
    thread_url::resolve_thread_url,
};
use tracing::debug;

use crate::{
    community::{load_thread_messages, CommunityView},
    internal,
    serializers::{serialize_account, serialize_channel, serialize_thread},
    ApiContext,
};

/// Loads everything the thread page renders.
///
/// Unknown communities, unparseable or unknown thread ids, threads from
/// another community and threads in channels the requester cannot list all
/// answer 404. A private community the requester does not belong to answers
/// 403.
pub async fn thread_page_props(
    ctx: &ApiContext,
    user_id: Option<UserId>,
    request: &SsrThreadRequest,
) -> Result<ThreadPageProps, ApiError> {
    let view = CommunityView::load(ctx, &request.community_name, user_id).await?;

    let communities = match view.viewer.user.as_ref().and_then(|user| user.auth_id) {
        Some(auth_id) => ctx
            .storage
            .communities_for_auth(auth_id)
            .await
            .map_err(internal)?,
        None => Vec::new(),
    };

    let increment_id = parse_increment_id(&request.thread_id)
        .ok_or_else(|| ApiError::not_found("thread not found"))?;

    let thread = ctx
        .storage
        .find_thread_by_increment_id(increment_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("thread not found"))?;
    let channel = ctx
        .storage
        .find_channel(thread.channel_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("thread channel not found"))?;

    if channel.community_id != view.community.id {
        debug!(
            increment_id,
            community = %view.community.name,
            "thread belongs to another community"
        );
        return Err(ApiError::not_found("thread not found"));
    }

    let messages = load_thread_messages(ctx, &thread).await?;
    let thread = serialize_thread(&thread, Some(&channel), messages);
    let thread_url = resolve_thread_url(&thread, &view.account);

    let current_channel = view
        .find_visible_channel(channel.id)
        .map(serialize_channel)
        .ok_or_else(|| ApiError::not_found("channel not found"))?;

    Ok(ThreadPageProps {
        token: None,
        settings: view.settings(),
        channels: view.serialized_channels(),
        dms: view.serialized_dms(),
        communities: communities.iter().map(serialize_account).collect(),
        permissions: view.viewer.permissions.clone(),
        current_community: view.account.clone(),
        thread,
        current_channel,
        thread_url,
        is_sub_domain_routing: false,
        is_bot: false,
    })
}

/// Reads the leading integer of a thread id path segment, so `"42-some-slug"`
/// is thread 42. Missing digits and zero are not thread ids.
pub fn parse_increment_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end].parse::<i64>().ok()?;
    let value = if negative { -value } else { value };
    (value != 0).then_some(value)
}
