use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(CommunityId);
id_newtype!(UserId);
id_newtype!(AuthId);
id_newtype!(ChannelId);
id_newtype!(ThreadId);
id_newtype!(MessageId);

id_newtype!(
    /// Client-generated id correlating an optimistic message with its confirmation.
    ImitationId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelType {
    Public,
    Private,
    Dm,
}

impl ChannelType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
            Self::Dm => "DM",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PUBLIC" => Some(Self::Public),
            "PRIVATE" => Some(Self::Private),
            "DM" => Some(Self::Dm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommunityType {
    Public,
    Private,
}

impl CommunityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PUBLIC" => Some(Self::Public),
            "PRIVATE" => Some(Self::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Admin,
    Member,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "OWNER" => Some(Self::Owner),
            "ADMIN" => Some(Self::Admin),
            "MEMBER" => Some(Self::Member),
            _ => None,
        }
    }

    pub fn can_manage(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageFormat {
    #[default]
    Linen,
    Slack,
    Discord,
}

impl MessageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linen => "LINEN",
            Self::Slack => "SLACK",
            Self::Discord => "DISCORD",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "LINEN" => Some(Self::Linen),
            "SLACK" => Some(Self::Slack),
            "DISCORD" => Some(Self::Discord),
            _ => None,
        }
    }
}
