use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use shared::domain::{AuthId, ChannelId, ChannelType, CommunityId, Role};
use storage::{NewCommunity, NewThread, NewUser, Storage};
use uuid::Uuid;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/server.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateCommunity {
        name: String,
        #[arg(long, default_value = "")]
        community_url: String,
        #[arg(long)]
        invite_url: Option<String>,
        #[arg(long)]
        discord_server_id: Option<String>,
        #[arg(long)]
        private: bool,
    },
    CreateUser {
        community_id: Uuid,
        display_name: String,
        /// OWNER, ADMIN or MEMBER.
        #[arg(long, default_value = "MEMBER")]
        role: String,
        /// Links users of several communities to one sign-in identity.
        #[arg(long)]
        auth_id: Option<Uuid>,
    },
    CreateChannel {
        community_id: Uuid,
        name: String,
        /// PUBLIC, PRIVATE or DM.
        #[arg(long, default_value = "PUBLIC")]
        kind: String,
        #[arg(long)]
        external_channel_id: Option<String>,
    },
    CreateThread {
        channel_id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        external_thread_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::CreateCommunity {
            name,
            community_url,
            invite_url,
            discord_server_id,
            private,
        } => {
            let community_id = storage
                .create_community(NewCommunity {
                    name,
                    private,
                    community_url,
                    community_invite_url: invite_url,
                    discord_server_id,
                    ..NewCommunity::default()
                })
                .await?;
            println!("created community_id={community_id}");
        }
        Command::CreateUser {
            community_id,
            display_name,
            role,
            auth_id,
        } => {
            let role = Role::parse(&role.to_ascii_uppercase())
                .ok_or_else(|| anyhow!("unknown role '{role}'"))?;
            let user_id = storage
                .create_user(NewUser {
                    community_id: CommunityId(community_id),
                    auth_id: auth_id.map(AuthId),
                    display_name,
                    role,
                })
                .await?;
            println!("created user_id={user_id}");
        }
        Command::CreateChannel {
            community_id,
            name,
            kind,
            external_channel_id,
        } => {
            let kind = ChannelType::parse(&kind.to_ascii_uppercase())
                .ok_or_else(|| anyhow!("unknown channel type '{kind}'"))?;
            let channel_id = storage
                .create_channel(
                    CommunityId(community_id),
                    &name,
                    external_channel_id.as_deref(),
                    kind,
                )
                .await?;
            println!("created channel_id={channel_id}");
        }
        Command::CreateThread {
            channel_id,
            title,
            external_thread_id,
        } => {
            let slug = title
                .as_deref()
                .map(|title| title.to_lowercase().replace(' ', "-"));
            let thread = storage
                .create_thread(
                    ChannelId(channel_id),
                    NewThread {
                        external_thread_id,
                        title,
                        slug,
                    },
                    Utc::now(),
                )
                .await?;
            println!(
                "created thread_id={} increment_id={}",
                thread.id, thread.increment_id
            );
        }
    }

    Ok(())
}
