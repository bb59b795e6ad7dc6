use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use server_api::{
    archive_channel, channel_audience, inbox_props, mark_channel_read, send_thread_message,
    star_thread, starred_props, thread_page_props, unstar_thread, Audience,
};
use shared::{
    domain::UserId,
    error::{ApiError, ErrorCode},
    protocol::{
        ArchiveChannelRequest, InboxProps, ReadStatusRequest, SendThreadMessageRequest,
        SendThreadMessageResponse, ServerEvent, SsrThreadRequest, StarThreadRequest,
        StarredProps, ThreadPageProps,
    },
};
use tracing::{error, warn};

use crate::app_state::AppState;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// Requester identity. Absent means anonymous.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserQuery {
    pub(crate) user_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InboxQuery {
    user_id: Option<UserId>,
    #[serde(rename = "communityName")]
    community_name: String,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StarredQuery {
    user_id: Option<UserId>,
    #[serde(rename = "communityName")]
    community_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UnstarResponse {
    pub(crate) removed: bool,
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(message = %err.message, "request failed");
    }
    (status, Json(err))
}

pub(crate) async fn healthz(State(state): State<Arc<AppState>>) -> ApiResult<&'static str> {
    state
        .api
        .storage
        .health_check()
        .await
        .map_err(|e| reject(ApiError::new(ErrorCode::Internal, e.to_string())))?;
    Ok("ok")
}

pub(crate) async fn http_send_thread_message(
    State(state): State<Arc<AppState>>,
    Query(q): Query<UserQuery>,
    Json(req): Json<SendThreadMessageRequest>,
) -> ApiResult<Json<SendThreadMessageResponse>> {
    let response = send_thread_message(&state.api, q.user_id, &req)
        .await
        .map_err(reject)?;
    match channel_audience(&state.api, req.channel_id).await {
        Ok(audience) => state.publish(
            ServerEvent::MessageCreated {
                channel_id: req.channel_id,
                message: response.message.clone(),
                imitation_id: Some(response.imitation_id),
            },
            audience,
        ),
        Err(err) => warn!(
            channel_id = %req.channel_id,
            message = %err.message,
            "message stored but not pushed"
        ),
    }
    Ok(Json(response))
}

/// `GET` with a JSON body, matching how the page renderer calls it.
pub(crate) async fn http_thread_page_props(
    State(state): State<Arc<AppState>>,
    Query(q): Query<UserQuery>,
    Json(req): Json<SsrThreadRequest>,
) -> ApiResult<Json<ThreadPageProps>> {
    thread_page_props(&state.api, q.user_id, &req)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn http_inbox(
    State(state): State<Arc<AppState>>,
    Query(q): Query<InboxQuery>,
) -> ApiResult<Json<InboxProps>> {
    inbox_props(&state.api, q.user_id, &q.community_name, q.limit)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn http_starred(
    State(state): State<Arc<AppState>>,
    Query(q): Query<StarredQuery>,
) -> ApiResult<Json<StarredProps>> {
    starred_props(&state.api, q.user_id, &q.community_name)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn http_star_thread(
    State(state): State<Arc<AppState>>,
    Query(q): Query<UserQuery>,
    Json(req): Json<StarThreadRequest>,
) -> ApiResult<StatusCode> {
    star_thread(&state.api, q.user_id, &req)
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn http_unstar_thread(
    State(state): State<Arc<AppState>>,
    Query(q): Query<UserQuery>,
    Json(req): Json<StarThreadRequest>,
) -> ApiResult<Json<UnstarResponse>> {
    let removed = unstar_thread(&state.api, q.user_id, &req)
        .await
        .map_err(reject)?;
    Ok(Json(UnstarResponse { removed }))
}

pub(crate) async fn http_archive_channel(
    State(state): State<Arc<AppState>>,
    Query(q): Query<UserQuery>,
    Json(req): Json<ArchiveChannelRequest>,
) -> ApiResult<StatusCode> {
    let user_id = archive_channel(&state.api, q.user_id, &req)
        .await
        .map_err(reject)?;
    state.publish(
        ServerEvent::ChannelArchived {
            channel_id: req.channel_id,
            user_id,
        },
        Audience::Users([user_id].into()),
    );
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn http_mark_channel_read(
    State(state): State<Arc<AppState>>,
    Query(q): Query<UserQuery>,
    Json(req): Json<ReadStatusRequest>,
) -> ApiResult<StatusCode> {
    mark_channel_read(&state.api, q.user_id, &req)
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}
