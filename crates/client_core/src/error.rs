use reqwest::StatusCode;
use shared::{domain::ImitationId, error::ApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("server answered {status}")]
    Status {
        status: StatusCode,
        error: Option<ApiError>,
    },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl TransportError {
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Status { error, .. } => error.as_ref(),
            _ => None,
        }
    }
}

/// Failure of one optimistic send. Cloned to every waiter of a debounced call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("could not send a message")]
    Rejected,
    #[error("sending the message timed out")]
    TimedOut,
    #[error("no failed message with imitation id {0}")]
    UnknownImitation(ImitationId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("could not update read status")]
    ReadStatus,
    #[error("could not archive channel")]
    Archive,
}
