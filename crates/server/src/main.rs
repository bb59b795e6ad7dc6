use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{get, post},
    Router,
};
use server_api::ApiContext;
use shared::protocol::{
    ARCHIVE_CHANNEL_ROUTE, INBOX_ROUTE, READ_STATUS_ROUTE, SEND_THREAD_MESSAGE_ROUTE,
    SSR_THREADS_ROUTE, STARRED_ROUTE,
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod routes;
mod ws;

use app_state::AppState;
use config::{load_settings, prepare_database_url};
use routes::{
    healthz, http_archive_channel, http_inbox, http_mark_channel_read, http_send_thread_message,
    http_star_thread, http_starred, http_thread_page_props, http_unstar_thread,
};
use ws::ws_handler;

const MAX_REQUEST_BYTES: usize = 256 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState::new(ApiContext::new(storage), settings.event_capacity);
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(SEND_THREAD_MESSAGE_ROUTE, post(http_send_thread_message))
        .route(SSR_THREADS_ROUTE, get(http_thread_page_props))
        .route(INBOX_ROUTE, get(http_inbox))
        .route(
            STARRED_ROUTE,
            get(http_starred)
                .post(http_star_thread)
                .delete(http_unstar_thread),
        )
        .route(ARCHIVE_CHANNEL_ROUTE, post(http_archive_channel))
        .route(READ_STATUS_ROUTE, post(http_mark_channel_read))
        .route("/ws", get(ws_handler))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .with_state(state)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
