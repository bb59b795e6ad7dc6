//! Storage rows to wire shapes.

use shared::protocol::{
    SerializedAccount, SerializedChannel, SerializedMessage, SerializedThread, SerializedUser,
};
use storage::{StoredChannel, StoredCommunity, StoredMessage, StoredThread, StoredUser};

pub fn serialize_account(community: &StoredCommunity) -> SerializedAccount {
    SerializedAccount {
        id: community.id,
        name: community.name.clone(),
        community_invite_url: community.community_invite_url.clone(),
        community_url: community.community_url.clone(),
        discord_server_id: community.discord_server_id.clone(),
        kind: community.kind,
        brand_color: community.brand_color.clone(),
        home_url: community.home_url.clone(),
        docs_url: community.docs_url.clone(),
        logo_url: community.logo_url.clone(),
    }
}

pub fn serialize_channel(channel: &StoredChannel) -> SerializedChannel {
    SerializedChannel {
        id: channel.id,
        account_id: channel.community_id,
        channel_name: channel.channel_name.clone(),
        external_channel_id: channel.external_channel_id.clone(),
        hidden: channel.hidden,
        kind: channel.kind,
    }
}

pub fn serialize_user(user: &StoredUser) -> SerializedUser {
    SerializedUser {
        id: user.id,
        accounts_id: user.community_id,
        auths_id: user.auth_id,
        display_name: user.display_name.clone(),
        external_user_id: user.external_user_id.clone(),
        profile_image_url: user.profile_image_url.clone(),
        anonymous_alias: user.anonymous_alias.clone(),
        is_bot: user.is_bot,
        is_admin: user.role.can_manage(),
        role: user.role,
    }
}

pub fn serialize_message(message: &StoredMessage, author: Option<&StoredUser>) -> SerializedMessage {
    SerializedMessage {
        id: message.id,
        body: message.body.clone(),
        sent_at: message.sent_at,
        users_id: message.sender_id,
        thread_id: message.thread_id,
        mentions: Vec::new(),
        attachments: Vec::new(),
        reactions: Vec::new(),
        message_format: message.message_format,
        author: author.map(serialize_user),
    }
}

pub fn serialize_thread(
    thread: &StoredThread,
    channel: Option<&StoredChannel>,
    messages: Vec<SerializedMessage>,
) -> SerializedThread {
    SerializedThread {
        id: thread.id,
        increment_id: thread.increment_id,
        external_thread_id: thread.external_thread_id.clone(),
        channel_id: thread.channel_id,
        title: thread.title.clone(),
        slug: thread.slug.clone(),
        sent_at: thread.sent_at,
        last_reply_at: thread.last_reply_at,
        messages,
        channel: channel.map(serialize_channel),
    }
}
