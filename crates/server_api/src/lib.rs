use shared::error::{ApiError, ErrorCode};
use storage::Storage;

pub mod channels;
mod community;
pub mod messages;
pub mod pages;
pub mod permissions;
pub mod serializers;
pub mod ssr;

pub use channels::{archive_channel, mark_channel_read};
pub use messages::send_thread_message;
pub use pages::{inbox_props, star_thread, starred_props, unstar_thread};
pub use permissions::{channel_audience, Audience};
pub use ssr::{parse_increment_id, thread_page_props};

pub const DEFAULT_INBOX_LIMIT: u32 = 10;
pub const MAX_INBOX_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

impl ApiContext {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

fn unauthorized() -> ApiError {
    ApiError::new(ErrorCode::Unauthorized, "sign in required")
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
