use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, QueryBuilder, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::domain::{
    AuthId, ChannelId, ChannelType, CommunityId, CommunityType, ImitationId, MessageFormat,
    MessageId, Role, ThreadId, UserId,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredCommunity {
    pub id: CommunityId,
    pub name: String,
    pub kind: CommunityType,
    pub community_url: String,
    pub community_invite_url: Option<String>,
    pub discord_server_id: Option<String>,
    pub brand_color: Option<String>,
    pub home_url: Option<String>,
    pub docs_url: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCommunity {
    pub name: String,
    pub private: bool,
    pub community_url: String,
    pub community_invite_url: Option<String>,
    pub discord_server_id: Option<String>,
    pub brand_color: Option<String>,
    pub home_url: Option<String>,
    pub docs_url: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredUser {
    pub id: UserId,
    pub community_id: CommunityId,
    pub auth_id: Option<AuthId>,
    pub display_name: Option<String>,
    pub external_user_id: Option<String>,
    pub profile_image_url: Option<String>,
    pub anonymous_alias: Option<String>,
    pub is_bot: bool,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub community_id: CommunityId,
    pub auth_id: Option<AuthId>,
    pub display_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredChannel {
    pub id: ChannelId,
    pub community_id: CommunityId,
    pub channel_name: String,
    pub external_channel_id: Option<String>,
    pub hidden: bool,
    pub kind: ChannelType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredThread {
    pub id: ThreadId,
    pub increment_id: i64,
    pub channel_id: ChannelId,
    pub external_thread_id: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub last_reply_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewThread {
    pub external_thread_id: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub channel_id: ChannelId,
    pub sender_id: UserId,
    pub body: String,
    pub message_format: MessageFormat,
    pub sent_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_community(&self, community: NewCommunity) -> Result<CommunityId> {
        let id = CommunityId::new();
        let kind = if community.private {
            CommunityType::Private
        } else {
            CommunityType::Public
        };
        sqlx::query(
            "INSERT INTO accounts
                (id, name, type, community_url, community_invite_url, discord_server_id,
                 brand_color, home_url, docs_url, logo_url)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&community.name)
        .bind(kind.as_str())
        .bind(&community.community_url)
        .bind(&community.community_invite_url)
        .bind(&community.discord_server_id)
        .bind(&community.brand_color)
        .bind(&community.home_url)
        .bind(&community.docs_url)
        .bind(&community.logo_url)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to create community '{}'", community.name))?;
        Ok(id)
    }

    pub async fn find_community_by_name(&self, name: &str) -> Result<Option<StoredCommunity>> {
        let row = sqlx::query(&format!("{COMMUNITY_COLUMNS} WHERE name = ?"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(community_from_row).transpose()
    }

    pub async fn find_community(&self, id: CommunityId) -> Result<Option<StoredCommunity>> {
        let row = sqlx::query(&format!("{COMMUNITY_COLUMNS} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(community_from_row).transpose()
    }

    /// Communities where the given auth identity has a user.
    pub async fn communities_for_auth(&self, auth_id: AuthId) -> Result<Vec<StoredCommunity>> {
        let rows = sqlx::query(
            "SELECT a.id, a.name, a.type, a.community_url, a.community_invite_url,
                    a.discord_server_id, a.brand_color, a.home_url, a.docs_url, a.logo_url
             FROM accounts a
             INNER JOIN users u ON u.account_id = a.id
             WHERE u.auth_id = ?
             ORDER BY a.name",
        )
        .bind(auth_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(community_from_row).collect()
    }

    pub async fn create_user(&self, user: NewUser) -> Result<UserId> {
        let id = UserId::new();
        sqlx::query(
            "INSERT INTO users (id, account_id, auth_id, display_name, role)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(user.community_id.to_string())
        .bind(user.auth_id.map(|auth| auth.to_string()))
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to create user '{}'", user.display_name))?;
        Ok(id)
    }

    pub async fn find_user(&self, id: UserId) -> Result<Option<StoredUser>> {
        let row = sqlx::query(
            "SELECT id, account_id, auth_id, display_name, external_user_id, profile_image_url,
                    anonymous_alias, is_bot, role
             FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn create_channel(
        &self,
        community_id: CommunityId,
        channel_name: &str,
        external_channel_id: Option<&str>,
        kind: ChannelType,
    ) -> Result<ChannelId> {
        let id = ChannelId::new();
        sqlx::query(
            "INSERT INTO channels (id, account_id, channel_name, external_channel_id, type)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(community_id.to_string())
        .bind(channel_name)
        .bind(external_channel_id)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to create channel '{channel_name}'"))?;
        Ok(id)
    }

    pub async fn set_channel_hidden(&self, channel_id: ChannelId, hidden: bool) -> Result<()> {
        sqlx::query("UPDATE channels SET hidden = ? WHERE id = ?")
            .bind(hidden)
            .bind(channel_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn find_channel(&self, channel_id: ChannelId) -> Result<Option<StoredChannel>> {
        let row = sqlx::query(&format!("{CHANNEL_COLUMNS} WHERE c.id = ?"))
            .bind(channel_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(channel_from_row).transpose()
    }

    pub async fn add_channel_member(&self, channel_id: ChannelId, user_id: UserId) -> Result<()> {
        sqlx::query(
            "INSERT INTO channel_members (channel_id, user_id, archived) VALUES (?, ?, 0)
             ON CONFLICT(channel_id, user_id) DO UPDATE SET archived = 0",
        )
        .bind(channel_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Public channels of a community, DMs and private channels excluded.
    pub async fn list_public_channels(
        &self,
        community_id: CommunityId,
    ) -> Result<Vec<StoredChannel>> {
        let rows = sqlx::query(&format!(
            "{CHANNEL_COLUMNS} WHERE c.account_id = ? AND c.type = 'PUBLIC' ORDER BY c.channel_name"
        ))
        .bind(community_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(channel_from_row).collect()
    }

    pub async fn list_private_channels(
        &self,
        community_id: CommunityId,
        user_id: UserId,
    ) -> Result<Vec<StoredChannel>> {
        self.list_member_channels(community_id, user_id, ChannelType::Private)
            .await
    }

    /// DMs the user has not archived.
    pub async fn list_dms(
        &self,
        community_id: CommunityId,
        user_id: UserId,
    ) -> Result<Vec<StoredChannel>> {
        self.list_member_channels(community_id, user_id, ChannelType::Dm)
            .await
    }

    async fn list_member_channels(
        &self,
        community_id: CommunityId,
        user_id: UserId,
        kind: ChannelType,
    ) -> Result<Vec<StoredChannel>> {
        let rows = sqlx::query(&format!(
            "{CHANNEL_COLUMNS}
             INNER JOIN channel_members m ON m.channel_id = c.id
             WHERE c.account_id = ? AND c.type = ? AND m.user_id = ? AND m.archived = 0
             ORDER BY c.channel_name"
        ))
        .bind(community_id.to_string())
        .bind(kind.as_str())
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(channel_from_row).collect()
    }

    pub async fn is_channel_member(&self, channel_id: ChannelId, user_id: UserId) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM channel_members WHERE channel_id = ? AND user_id = ? AND archived = 0",
        )
        .bind(channel_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    /// Every user added to the channel, archived or not.
    pub async fn channel_member_ids(&self, channel_id: ChannelId) -> Result<Vec<UserId>> {
        let rows = sqlx::query("SELECT user_id FROM channel_members WHERE channel_id = ?")
            .bind(channel_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| uuid_column(row, "user_id").map(UserId))
            .collect()
    }

    pub async fn community_user_ids(&self, community_id: CommunityId) -> Result<Vec<UserId>> {
        let rows = sqlx::query("SELECT id FROM users WHERE account_id = ?")
            .bind(community_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| uuid_column(row, "id").map(UserId))
            .collect()
    }

    /// Hides a channel from one member's lists. Returns false when the user
    /// is not a member of the channel.
    pub async fn archive_channel_for_user(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE channel_members SET archived = 1 WHERE channel_id = ? AND user_id = ?",
        )
        .bind(channel_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn create_thread(
        &self,
        channel_id: ChannelId,
        thread: NewThread,
        sent_at: DateTime<Utc>,
    ) -> Result<StoredThread> {
        let id = ThreadId::new();
        let row = sqlx::query(
            "INSERT INTO threads (id, channel_id, external_thread_id, title, slug, sent_at, last_reply_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING increment_id",
        )
        .bind(id.to_string())
        .bind(channel_id.to_string())
        .bind(&thread.external_thread_id)
        .bind(&thread.title)
        .bind(&thread.slug)
        .bind(sent_at)
        .bind(sent_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to create thread")?;

        Ok(StoredThread {
            id,
            increment_id: row.try_get(0)?,
            channel_id,
            external_thread_id: thread.external_thread_id,
            title: thread.title,
            slug: thread.slug,
            sent_at,
            last_reply_at: sent_at,
        })
    }

    pub async fn find_thread(&self, thread_id: ThreadId) -> Result<Option<StoredThread>> {
        let row = sqlx::query(&format!("{THREAD_COLUMNS} WHERE t.id = ?"))
            .bind(thread_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(thread_from_row).transpose()
    }

    pub async fn find_thread_by_increment_id(
        &self,
        increment_id: i64,
    ) -> Result<Option<StoredThread>> {
        let row = sqlx::query(&format!("{THREAD_COLUMNS} WHERE t.increment_id = ?"))
            .bind(increment_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(thread_from_row).transpose()
    }

    /// Most recently active threads across `channel_ids`.
    pub async fn recent_threads(
        &self,
        channel_ids: &[ChannelId],
        limit: u32,
    ) -> Result<Vec<StoredThread>> {
        if channel_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = QueryBuilder::<Sqlite>::new(THREAD_COLUMNS);
        query.push(" WHERE t.channel_id IN (");
        let mut separated = query.separated(", ");
        for channel_id in channel_ids {
            separated.push_bind(channel_id.to_string());
        }
        query.push(") ORDER BY t.last_reply_at DESC, t.increment_id DESC LIMIT ");
        query.push_bind(i64::from(limit));

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(thread_from_row).collect()
    }

    /// Persists a message and bumps the thread's last reply time.
    ///
    /// A message carrying an `imitation_id` is stored at most once. Repeating
    /// the insert returns the row stored the first time and leaves the thread
    /// untouched.
    pub async fn insert_message(
        &self,
        thread_id: ThreadId,
        channel_id: ChannelId,
        sender_id: UserId,
        body: &str,
        message_format: MessageFormat,
        imitation_id: Option<ImitationId>,
    ) -> Result<StoredMessage> {
        let mut tx = self.pool.begin().await?;
        if let Some(imitation_id) = imitation_id {
            let existing = sqlx::query(&format!("{MESSAGE_COLUMNS} WHERE imitation_id = ?"))
                .bind(imitation_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
            if let Some(row) = existing {
                return message_from_row(&row);
            }
        }

        let id = MessageId::new();
        let sent_at = Utc::now();
        sqlx::query(
            "INSERT INTO messages
                (id, thread_id, channel_id, users_id, body, message_format, imitation_id, sent_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(thread_id.to_string())
        .bind(channel_id.to_string())
        .bind(sender_id.to_string())
        .bind(body)
        .bind(message_format.as_str())
        .bind(imitation_id.map(|id| id.to_string()))
        .bind(sent_at)
        .execute(&mut *tx)
        .await
        .context("failed to insert message")?;
        sqlx::query("UPDATE threads SET last_reply_at = ? WHERE id = ?")
            .bind(sent_at)
            .bind(thread_id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(StoredMessage {
            id,
            thread_id,
            channel_id,
            sender_id,
            body: body.to_string(),
            message_format,
            sent_at,
        })
    }

    pub async fn list_thread_messages(&self, thread_id: ThreadId) -> Result<Vec<StoredMessage>> {
        let rows = sqlx::query(&format!(
            "{MESSAGE_COLUMNS} WHERE thread_id = ? ORDER BY sent_at ASC"
        ))
        .bind(thread_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(message_from_row).collect()
    }

    pub async fn star_thread(
        &self,
        user_id: UserId,
        thread_id: ThreadId,
        community_id: CommunityId,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO starred_threads (user_id, thread_id, account_id, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id, thread_id) DO NOTHING",
        )
        .bind(user_id.to_string())
        .bind(thread_id.to_string())
        .bind(community_id.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn unstar_thread(&self, user_id: UserId, thread_id: ThreadId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM starred_threads WHERE user_id = ? AND thread_id = ?")
            .bind(user_id.to_string())
            .bind(thread_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Starred threads of a user in one community, newest star first.
    pub async fn list_starred_threads(
        &self,
        user_id: UserId,
        community_id: CommunityId,
    ) -> Result<Vec<StoredThread>> {
        let rows = sqlx::query(&format!(
            "{THREAD_COLUMNS}
             INNER JOIN starred_threads s ON s.thread_id = t.id
             WHERE s.user_id = ? AND s.account_id = ?
             ORDER BY s.created_at DESC"
        ))
        .bind(user_id.to_string())
        .bind(community_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(thread_from_row).collect()
    }

    pub async fn mark_channel_read(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
        read_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO read_status (user_id, channel_id, last_read_at) VALUES (?, ?, ?)
             ON CONFLICT(user_id, channel_id) DO UPDATE SET last_read_at = excluded.last_read_at",
        )
        .bind(user_id.to_string())
        .bind(channel_id.to_string())
        .bind(read_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn last_read_at(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query(
            "SELECT last_read_at FROM read_status WHERE user_id = ? AND channel_id = ?",
        )
        .bind(user_id.to_string())
        .bind(channel_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row
            .map(|r| r.try_get::<DateTime<Utc>, _>(0))
            .transpose()?)
    }
}

const COMMUNITY_COLUMNS: &str = "SELECT id, name, type, community_url, community_invite_url,
        discord_server_id, brand_color, home_url, docs_url, logo_url
     FROM accounts";

const CHANNEL_COLUMNS: &str =
    "SELECT c.id, c.account_id, c.channel_name, c.external_channel_id, c.hidden, c.type
     FROM channels c";

const MESSAGE_COLUMNS: &str =
    "SELECT id, thread_id, channel_id, users_id, body, message_format, sent_at FROM messages";

const THREAD_COLUMNS: &str =
    "SELECT t.id, t.increment_id, t.channel_id, t.external_thread_id, t.title, t.slug,
            t.sent_at, t.last_reply_at
     FROM threads t";

fn uuid_column(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).with_context(|| format!("column '{column}' holds invalid uuid '{raw}'"))
}

fn optional_uuid_column(row: &SqliteRow, column: &str) -> Result<Option<Uuid>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| {
        Uuid::parse_str(&raw)
            .with_context(|| format!("column '{column}' holds invalid uuid '{raw}'"))
    })
    .transpose()
}

fn community_from_row(row: &SqliteRow) -> Result<StoredCommunity> {
    let kind: String = row.try_get("type")?;
    Ok(StoredCommunity {
        id: CommunityId(uuid_column(row, "id")?),
        name: row.try_get("name")?,
        kind: CommunityType::parse(&kind)
            .ok_or_else(|| anyhow!("unknown community type '{kind}'"))?,
        community_url: row.try_get("community_url")?,
        community_invite_url: row.try_get("community_invite_url")?,
        discord_server_id: row.try_get("discord_server_id")?,
        brand_color: row.try_get("brand_color")?,
        home_url: row.try_get("home_url")?,
        docs_url: row.try_get("docs_url")?,
        logo_url: row.try_get("logo_url")?,
    })
}

fn user_from_row(row: &SqliteRow) -> Result<StoredUser> {
    let role: String = row.try_get("role")?;
    Ok(StoredUser {
        id: UserId(uuid_column(row, "id")?),
        community_id: CommunityId(uuid_column(row, "account_id")?),
        auth_id: optional_uuid_column(row, "auth_id")?.map(AuthId),
        display_name: row.try_get("display_name")?,
        external_user_id: row.try_get("external_user_id")?,
        profile_image_url: row.try_get("profile_image_url")?,
        anonymous_alias: row.try_get("anonymous_alias")?,
        is_bot: row.try_get("is_bot")?,
        role: Role::parse(&role).ok_or_else(|| anyhow!("unknown role '{role}'"))?,
    })
}

fn channel_from_row(row: &SqliteRow) -> Result<StoredChannel> {
    let kind: String = row.try_get("type")?;
    Ok(StoredChannel {
        id: ChannelId(uuid_column(row, "id")?),
        community_id: CommunityId(uuid_column(row, "account_id")?),
        channel_name: row.try_get("channel_name")?,
        external_channel_id: row.try_get("external_channel_id")?,
        hidden: row.try_get("hidden")?,
        kind: ChannelType::parse(&kind).ok_or_else(|| anyhow!("unknown channel type '{kind}'"))?,
    })
}

fn thread_from_row(row: &SqliteRow) -> Result<StoredThread> {
    Ok(StoredThread {
        id: ThreadId(uuid_column(row, "id")?),
        increment_id: row.try_get("increment_id")?,
        channel_id: ChannelId(uuid_column(row, "channel_id")?),
        external_thread_id: row.try_get("external_thread_id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        sent_at: row.try_get("sent_at")?,
        last_reply_at: row.try_get("last_reply_at")?,
    })
}

fn message_from_row(row: &SqliteRow) -> Result<StoredMessage> {
    let format: String = row.try_get("message_format")?;
    Ok(StoredMessage {
        id: MessageId(uuid_column(row, "id")?),
        thread_id: ThreadId(uuid_column(row, "thread_id")?),
        channel_id: ChannelId(uuid_column(row, "channel_id")?),
        sender_id: UserId(uuid_column(row, "users_id")?),
        body: row.try_get("body")?,
        message_format: MessageFormat::parse(&format)
            .ok_or_else(|| anyhow!("unknown message format '{format}'"))?,
        sent_at: row.try_get("sent_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
