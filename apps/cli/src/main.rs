use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    ClientEvent, ClientSettings, MissingSignInFlow, SendOutcome, ThreadSession,
};
use shared::{domain::UserId, protocol::ServerEvent};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8443")]
    server_url: String,
    /// Act as this user. Without it the thread is read anonymously.
    #[arg(long)]
    user_id: Option<Uuid>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reply to a thread and print the stored message.
    Send {
        community: String,
        thread: String,
        body: String,
    },
    /// Print the link back to the platform the thread was synced from.
    ThreadUrl { community: String, thread: String },
    /// Print new replies to a thread as they are pushed.
    Watch { community: String, thread: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
    let args = Args::parse();
    let settings = ClientSettings::default().with_server_url(args.server_url);
    let user_id = args.user_id.map(UserId);

    match args.command {
        Command::Send {
            community,
            thread,
            body,
        } => {
            let session = open(settings, user_id, &community, &thread).await?;
            match session.send(body).await? {
                SendOutcome::Confirmed(message) => {
                    println!("{}", serde_json::to_string_pretty(&message)?);
                }
                SendOutcome::AwaitingSignIn => bail!("sending needs --user-id"),
            }
        }
        Command::ThreadUrl { community, thread } => {
            let session = open(settings, user_id, &community, &thread).await?;
            match session.thread_url() {
                Some(url) => println!("{url}"),
                None => println!("thread was not synced from an external platform"),
            }
        }
        Command::Watch { community, thread } => {
            let session = open(settings, user_id, &community, &thread).await?;
            let mut events = session.subscribe_events();
            let forward = session.connect_push().await?;
            let thread_id = session.props().thread.id;
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    event = events.recv() => match event {
                        Ok(ClientEvent::Server(ServerEvent::MessageCreated { message, .. }))
                            if message.thread_id == thread_id =>
                        {
                            println!("[{}] {}", message.sent_at, message.body);
                        }
                        Ok(ClientEvent::Error(err)) => eprintln!("push error: {err}"),
                        Ok(ClientEvent::Disconnected) => break,
                        Ok(_) => {}
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            forward.abort();
        }
    }

    Ok(())
}

async fn open(
    settings: ClientSettings,
    user_id: Option<UserId>,
    community: &str,
    thread: &str,
) -> Result<ThreadSession> {
    Ok(ThreadSession::open(settings, user_id, community, thread, Arc::new(MissingSignInFlow)).await?)
}
