//! Keyed trailing-edge debouncer.
//!
//! Calls are buffered until no new call has arrived for one window. Calls
//! that share a key collapse to the last one submitted, and all of their
//! waiters receive its output. Every distinct key buffered in a window is
//! dispatched, concurrently, when the window closes.

use std::{collections::HashMap, future::Future, hash::Hash, time::Duration};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    time::timeout,
};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("debouncer worker stopped")]
pub struct DebouncerClosed;

struct Call<K, T> {
    key: K,
    job: BoxFuture<'static, T>,
    reply: oneshot::Sender<T>,
}

struct Pending<T> {
    job: BoxFuture<'static, T>,
    waiters: Vec<oneshot::Sender<T>>,
}

pub struct Debouncer<K, T> {
    calls: mpsc::UnboundedSender<Call<K, T>>,
    window: Duration,
}

impl<K, T> Debouncer<K, T>
where
    K: Eq + Hash + Send + 'static,
    T: Clone + Send + 'static,
{
    /// Spawns the worker, so this must run inside a Tokio runtime.
    pub fn new(window: Duration) -> Self {
        let (calls, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(rx, window));
        Self { calls, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Submits `job` under `key` and waits for the output of whichever job
    /// ends up dispatched for that key.
    pub async fn call<F>(&self, key: K, job: F) -> Result<T, DebouncerClosed>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.calls
            .send(Call {
                key,
                job: Box::pin(job),
                reply,
            })
            .map_err(|_| DebouncerClosed)?;
        rx.await.map_err(|_| DebouncerClosed)
    }
}

async fn run_worker<K, T>(mut rx: mpsc::UnboundedReceiver<Call<K, T>>, window: Duration)
where
    K: Eq + Hash + Send + 'static,
    T: Clone + Send + 'static,
{
    while let Some(first) = rx.recv().await {
        let mut pending: HashMap<K, Pending<T>> = HashMap::new();
        buffer(&mut pending, first);

        let closed = loop {
            match timeout(window, rx.recv()).await {
                Ok(Some(call)) => buffer(&mut pending, call),
                Ok(None) => break true,
                Err(_) => break false,
            }
        };

        trace!(keys = pending.len(), "debounce window closed");
        for (_, Pending { job, waiters }) in pending {
            tokio::spawn(async move {
                let output = job.await;
                for waiter in waiters {
                    let _ = waiter.send(output.clone());
                }
            });
        }
        if closed {
            break;
        }
    }
}

fn buffer<K: Eq + Hash, T>(pending: &mut HashMap<K, Pending<T>>, call: Call<K, T>) {
    match pending.get_mut(&call.key) {
        Some(slot) => {
            slot.job = call.job;
            slot.waiters.push(call.reply);
        }
        None => {
            pending.insert(
                call.key,
                Pending {
                    job: call.job,
                    waiters: vec![call.reply],
                },
            );
        }
    }
}
