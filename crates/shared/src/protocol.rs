use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        AuthId, ChannelId, ChannelType, CommunityId, CommunityType, ImitationId, MessageFormat,
        MessageId, Role, ThreadId, UserId,
    },
    error::ApiError,
};

pub const SEND_THREAD_MESSAGE_ROUTE: &str = "/api/messages/thread";
pub const SSR_THREADS_ROUTE: &str = "/api/ssr/threads";
pub const INBOX_ROUTE: &str = "/api/inbox";
pub const STARRED_ROUTE: &str = "/api/starred";
pub const ARCHIVE_CHANNEL_ROUTE: &str = "/api/channels/archive";
pub const READ_STATUS_ROUTE: &str = "/api/channels/read";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedUser {
    pub id: UserId,
    pub accounts_id: CommunityId,
    #[serde(default)]
    pub auths_id: Option<AuthId>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub external_user_id: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub anonymous_alias: Option<String>,
    pub is_bot: bool,
    pub is_admin: bool,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedAttachment {
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedReaction {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u32,
    #[serde(default)]
    pub users: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedMessage {
    pub id: MessageId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub users_id: UserId,
    pub thread_id: ThreadId,
    #[serde(default)]
    pub mentions: Vec<SerializedUser>,
    #[serde(default)]
    pub attachments: Vec<SerializedAttachment>,
    #[serde(default)]
    pub reactions: Vec<SerializedReaction>,
    #[serde(default)]
    pub message_format: MessageFormat,
    #[serde(default)]
    pub author: Option<SerializedUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedChannel {
    pub id: ChannelId,
    pub account_id: CommunityId,
    pub channel_name: String,
    #[serde(default)]
    pub external_channel_id: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(rename = "type")]
    pub kind: ChannelType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedThread {
    pub id: ThreadId,
    pub increment_id: i64,
    #[serde(default)]
    pub external_thread_id: Option<String>,
    pub channel_id: ChannelId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub last_reply_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<SerializedMessage>,
    #[serde(default)]
    pub channel: Option<SerializedChannel>,
}

/// A community as exposed to pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedAccount {
    pub id: CommunityId,
    pub name: String,
    #[serde(default)]
    pub community_invite_url: Option<String>,
    #[serde(default)]
    pub community_url: String,
    #[serde(default)]
    pub discord_server_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: CommunityType,
    #[serde(default)]
    pub brand_color: Option<String>,
    #[serde(default)]
    pub home_url: Option<String>,
    #[serde(default)]
    pub docs_url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub community_id: CommunityId,
    pub community_name: String,
    pub name: String,
    pub community_type: CommunityType,
    pub brand_color: Option<String>,
    pub home_url: Option<String>,
    pub docs_url: Option<String>,
    pub logo_url: Option<String>,
    pub community_invite_url: Option<String>,
    pub community_url: String,
}

impl From<&SerializedAccount> for Settings {
    fn from(account: &SerializedAccount) -> Self {
        Self {
            community_id: account.id,
            community_name: account.name.clone(),
            name: account.name.clone(),
            community_type: account.kind,
            brand_color: account.brand_color.clone(),
            home_url: account.home_url.clone(),
            docs_url: account.docs_url.clone(),
            logo_url: account.logo_url.clone(),
            community_invite_url: account.community_invite_url.clone(),
            community_url: account.community_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub access: bool,
    pub chat: bool,
    pub manage: bool,
    /// Community id when the requester is a member of it.
    pub account_id: Option<CommunityId>,
    pub user: Option<SerializedUser>,
}

impl Permissions {
    pub fn anonymous(access: bool) -> Self {
        Self {
            access,
            chat: false,
            manage: false,
            account_id: None,
            user: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendThreadMessageRequest {
    pub body: String,
    pub community_id: CommunityId,
    pub channel_id: ChannelId,
    pub thread_id: ThreadId,
    pub imitation_id: ImitationId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendThreadMessageResponse {
    pub message: SerializedMessage,
    pub imitation_id: ImitationId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsrThreadRequest {
    pub thread_id: String,
    pub community_name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPageProps {
    pub token: Option<String>,
    pub current_community: SerializedAccount,
    pub channels: Vec<SerializedChannel>,
    pub communities: Vec<SerializedAccount>,
    pub permissions: Permissions,
    pub settings: Settings,
    pub dms: Vec<SerializedChannel>,
    pub thread: SerializedThread,
    pub current_channel: SerializedChannel,
    pub thread_url: Option<String>,
    pub is_sub_domain_routing: bool,
    pub is_bot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxProps {
    pub channels: Vec<SerializedChannel>,
    pub current_community: SerializedAccount,
    pub dms: Vec<SerializedChannel>,
    pub is_sub_domain_routing: bool,
    pub permissions: Permissions,
    pub settings: Settings,
    pub threads: Vec<SerializedThread>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarredProps {
    pub current_community: SerializedAccount,
    pub permissions: Permissions,
    pub settings: Settings,
    pub threads: Vec<SerializedThread>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarThreadRequest {
    pub community_id: CommunityId,
    pub thread_id: ThreadId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveChannelRequest {
    pub channel_id: ChannelId,
    pub account_id: CommunityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadStatusRequest {
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    MessageCreated {
        channel_id: ChannelId,
        message: SerializedMessage,
        #[serde(default)]
        imitation_id: Option<ImitationId>,
    },
    ChannelArchived {
        channel_id: ChannelId,
        user_id: UserId,
    },
    Error(ApiError),
}
