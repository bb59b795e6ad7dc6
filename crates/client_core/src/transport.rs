use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::UserId,
    error::ApiError,
    protocol::{
        ArchiveChannelRequest, ReadStatusRequest, SendThreadMessageRequest,
        SendThreadMessageResponse, SsrThreadRequest, ThreadPageProps, ARCHIVE_CHANNEL_ROUTE,
        READ_STATUS_ROUTE, SEND_THREAD_MESSAGE_ROUTE, SSR_THREADS_ROUTE,
    },
};
use url::Url;

use crate::error::TransportError;

#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_thread_message(
        &self,
        user_id: UserId,
        request: &SendThreadMessageRequest,
    ) -> Result<SendThreadMessageResponse, TransportError>;
}

#[async_trait]
pub trait ChannelTransport: Send + Sync {
    async fn archive_channel(
        &self,
        user_id: UserId,
        request: &ArchiveChannelRequest,
    ) -> Result<(), TransportError>;

    async fn mark_channel_read(
        &self,
        user_id: UserId,
        request: &ReadStatusRequest,
    ) -> Result<(), TransportError>;
}

/// JSON over HTTP against the chat server. Identity travels as the
/// `user_id` query parameter.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(server_url: &str) -> Result<Self, TransportError> {
        Ok(Self::with_client(Client::new(), Url::parse(server_url)?))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn thread_page_props(
        &self,
        user_id: Option<UserId>,
        request: &SsrThreadRequest,
    ) -> Result<ThreadPageProps, TransportError> {
        let response = self
            .request(Method::GET, SSR_THREADS_ROUTE, user_id)?
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    fn request(
        &self,
        method: Method,
        route: &str,
        user_id: Option<UserId>,
    ) -> Result<RequestBuilder, TransportError> {
        let mut url = self.base_url.join(route)?;
        if let Some(user_id) = user_id {
            url.query_pairs_mut()
                .append_pair("user_id", &user_id.to_string());
        }
        Ok(self.http.request(method, url))
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        route: &str,
        user_id: UserId,
        body: &B,
    ) -> Result<Response, TransportError> {
        let response = self
            .request(Method::POST, route, Some(user_id))?
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }
}

#[async_trait]
impl MessageTransport for HttpTransport {
    async fn send_thread_message(
        &self,
        user_id: UserId,
        request: &SendThreadMessageRequest,
    ) -> Result<SendThreadMessageResponse, TransportError> {
        let response = self
            .post(SEND_THREAD_MESSAGE_ROUTE, user_id, request)
            .await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ChannelTransport for HttpTransport {
    async fn archive_channel(
        &self,
        user_id: UserId,
        request: &ArchiveChannelRequest,
    ) -> Result<(), TransportError> {
        self.post(ARCHIVE_CHANNEL_ROUTE, user_id, request).await?;
        Ok(())
    }

    async fn mark_channel_read(
        &self,
        user_id: UserId,
        request: &ReadStatusRequest,
    ) -> Result<(), TransportError> {
        self.post(READ_STATUS_ROUTE, user_id, request).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error = response.json::<ApiError>().await.ok();
    Err(TransportError::Status { status, error })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    Ok(check_status(response).await?.json().await?)
}
