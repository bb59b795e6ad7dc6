//! Optimistic sending of thread replies.
//!
//! A send shows a placeholder right away, posts the request through the
//! debouncer and swaps the placeholder for the stored message once the server
//! confirms it. Every placeholder is tracked by its own imitation id, so
//! concurrent sends reconcile independently whatever order responses arrive
//! in.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
    time::Duration,
};

use chrono::Utc;
use shared::{
    domain::{ChannelId, CommunityId, ImitationId, MessageFormat, MessageId, ThreadId, UserId},
    protocol::{
        SendThreadMessageRequest, SendThreadMessageResponse, SerializedMessage, SerializedUser,
    },
};
use tracing::{debug, info, warn};

use crate::{
    debounce::Debouncer,
    error::SendError,
    timeline::{update_with, DeliveryState, MessageListUpdater, Reconciled},
    transport::MessageTransport,
    ClientSettings,
};

type SendResult = Result<SendThreadMessageResponse, SendError>;

#[derive(Debug, Clone, PartialEq)]
pub struct SendParams {
    pub body: String,
    pub community_id: CommunityId,
    pub channel_id: ChannelId,
    pub thread_id: ThreadId,
    pub mentions: Vec<SerializedUser>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// No user was signed in. The send was handed to the sign-in flow and the
    /// list was left untouched.
    AwaitingSignIn,
    Confirmed(SerializedMessage),
}

/// Receives sends that need a signed-in user first.
pub trait SignInFlow: Send + Sync {
    fn request_sign_in(&self, continuation: SignInContinuation);
}

/// Used when no sign-in UI is wired up. The pending send is dropped.
pub struct MissingSignInFlow;

impl SignInFlow for MissingSignInFlow {
    fn request_sign_in(&self, continuation: SignInContinuation) {
        warn!(
            thread_id = %continuation.params().thread_id,
            "send needs a signed-in user but no sign-in flow is configured"
        );
    }
}

/// A send parked until sign-in completes. Resuming records the user on the
/// coordinator and replays the send from the start.
pub struct SignInContinuation {
    coordinator: OptimisticSendCoordinator,
    params: SendParams,
}

impl SignInContinuation {
    pub fn params(&self) -> &SendParams {
        &self.params
    }

    pub async fn resume(self, user: SerializedUser) -> Result<SendOutcome, SendError> {
        self.coordinator.set_current_user(Some(user));
        self.coordinator.send(self.params).await
    }
}

struct InFlight {
    user_id: UserId,
    request: SendThreadMessageRequest,
}

struct CoordinatorInner {
    transport: Arc<dyn MessageTransport>,
    sign_in: Arc<dyn SignInFlow>,
    timeline: Arc<dyn MessageListUpdater>,
    debouncer: Debouncer<ImitationId, SendResult>,
    send_timeout: Duration,
    current_user: RwLock<Option<SerializedUser>>,
    in_flight: Mutex<HashMap<ImitationId, InFlight>>,
}

/// Cheap to clone. Clones share the same timeline and debouncer.
#[derive(Clone)]
pub struct OptimisticSendCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl OptimisticSendCoordinator {
    /// Must be called inside a Tokio runtime.
    pub fn new(
        settings: &ClientSettings,
        transport: Arc<dyn MessageTransport>,
        sign_in: Arc<dyn SignInFlow>,
        timeline: Arc<dyn MessageListUpdater>,
    ) -> Self {
        Self::with_debouncer(
            Debouncer::new(settings.debounce_window),
            settings.send_timeout,
            transport,
            sign_in,
            timeline,
        )
    }

    pub fn with_debouncer(
        debouncer: Debouncer<ImitationId, SendResult>,
        send_timeout: Duration,
        transport: Arc<dyn MessageTransport>,
        sign_in: Arc<dyn SignInFlow>,
        timeline: Arc<dyn MessageListUpdater>,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                transport,
                sign_in,
                timeline,
                debouncer,
                send_timeout,
                current_user: RwLock::new(None),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn current_user(&self) -> Option<SerializedUser> {
        self.inner
            .current_user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_current_user(&self, user: Option<SerializedUser>) {
        *self
            .inner
            .current_user
            .write()
            .unwrap_or_else(PoisonError::into_inner) = user;
    }

    pub fn timeline(&self) -> &Arc<dyn MessageListUpdater> {
        &self.inner.timeline
    }

    pub async fn send(&self, params: SendParams) -> Result<SendOutcome, SendError> {
        let Some(user) = self.current_user() else {
            debug!(thread_id = %params.thread_id, "send parked until sign-in");
            self.inner.sign_in.request_sign_in(SignInContinuation {
                coordinator: self.clone(),
                params,
            });
            return Ok(SendOutcome::AwaitingSignIn);
        };

        let imitation_id = ImitationId::new();
        let placeholder = placeholder_message(imitation_id, &params, &user);
        update_with(self.inner.timeline.as_ref(), |timeline| {
            timeline.push_placeholder(imitation_id, placeholder)
        });

        let request = SendThreadMessageRequest {
            body: params.body,
            community_id: params.community_id,
            channel_id: params.channel_id,
            thread_id: params.thread_id,
            imitation_id,
        };
        self.in_flight().insert(
            imitation_id,
            InFlight {
                user_id: user.id,
                request: request.clone(),
            },
        );
        self.dispatch(user.id, request).await
    }

    /// Re-posts a failed send under its original imitation id.
    pub async fn retry(&self, imitation_id: ImitationId) -> Result<SendOutcome, SendError> {
        let (user_id, request) = {
            let in_flight = self.in_flight();
            let entry = in_flight
                .get(&imitation_id)
                .ok_or(SendError::UnknownImitation(imitation_id))?;
            (entry.user_id, entry.request.clone())
        };
        let reset = update_with(self.inner.timeline.as_ref(), |timeline| {
            let failed = matches!(
                timeline.placeholder(imitation_id).map(|entry| &entry.state),
                Some(DeliveryState::Failed(_))
            );
            failed && timeline.set_placeholder_state(imitation_id, DeliveryState::Pending)
        })
        .unwrap_or(false);
        if !reset {
            return Err(SendError::UnknownImitation(imitation_id));
        }
        info!(%imitation_id, "retrying send");
        self.dispatch(user_id, request).await
    }

    /// Drops a failed placeholder without sending it again.
    pub fn dismiss(&self, imitation_id: ImitationId) -> Result<(), SendError> {
        let removed = update_with(self.inner.timeline.as_ref(), |timeline| {
            let failed = matches!(
                timeline.placeholder(imitation_id).map(|entry| &entry.state),
                Some(DeliveryState::Failed(_))
            );
            failed && timeline.remove_placeholder(imitation_id).is_some()
        })
        .unwrap_or(false);
        if !removed {
            return Err(SendError::UnknownImitation(imitation_id));
        }
        self.in_flight().remove(&imitation_id);
        Ok(())
    }

    /// Merges a message delivered by the push channel. Returns whether the
    /// list changed.
    pub fn apply_pushed_message(
        &self,
        message: SerializedMessage,
        imitation_id: Option<ImitationId>,
    ) -> bool {
        let outcome = update_with(self.inner.timeline.as_ref(), |timeline| {
            timeline.merge_pushed(message, imitation_id)
        })
        .flatten();
        if outcome == Some(Reconciled::Replaced) {
            if let Some(imitation_id) = imitation_id {
                self.in_flight().remove(&imitation_id);
            }
        }
        outcome.is_some()
    }

    async fn dispatch(
        &self,
        user_id: UserId,
        request: SendThreadMessageRequest,
    ) -> Result<SendOutcome, SendError> {
        let imitation_id = request.imitation_id;
        let transport = Arc::clone(&self.inner.transport);
        let job = async move {
            transport
                .send_thread_message(user_id, &request)
                .await
                .map_err(|error| {
                    warn!(%imitation_id, %error, "thread message send failed");
                    SendError::Rejected
                })
        };

        let debounced = self.inner.debouncer.call(imitation_id, job);
        let result = match tokio::time::timeout(self.inner.send_timeout, debounced).await {
            Err(_) => Err(SendError::TimedOut),
            Ok(Err(_closed)) => Err(SendError::Rejected),
            Ok(Ok(result)) => result,
        };

        match result {
            Ok(response) => {
                let message = response.message;
                let outcome = update_with(self.inner.timeline.as_ref(), |timeline| {
                    timeline.confirm(imitation_id, message.clone())
                });
                self.in_flight().remove(&imitation_id);
                debug!(%imitation_id, message_id = %message.id, ?outcome, "send confirmed");
                Ok(SendOutcome::Confirmed(message))
            }
            Err(error) => {
                update_with(self.inner.timeline.as_ref(), |timeline| {
                    timeline.set_placeholder_state(
                        imitation_id,
                        DeliveryState::Failed(error.to_string()),
                    )
                });
                Err(error)
            }
        }
    }

    fn in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<ImitationId, InFlight>> {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn placeholder_message(
    imitation_id: ImitationId,
    params: &SendParams,
    user: &SerializedUser,
) -> SerializedMessage {
    SerializedMessage {
        id: MessageId(imitation_id.0),
        body: params.body.clone(),
        sent_at: Utc::now(),
        users_id: user.id,
        thread_id: params.thread_id,
        mentions: params.mentions.clone(),
        attachments: Vec::new(),
        reactions: Vec::new(),
        message_format: MessageFormat::Linen,
        author: Some(user.clone()),
    }
}
