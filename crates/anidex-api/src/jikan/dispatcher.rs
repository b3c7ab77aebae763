//! Single-flight request dispatcher for the rate-limited catalog API.
//!
//! Every catalog call goes through one [`Dispatcher`]. Requests are queued
//! in submission order and handed to a background worker that runs at most
//! one at a time, waiting a fixed spacing after each call settles before
//! starting the next. Callers that must not overlap their own waits with
//! that spacing can await [`Dispatcher::spacing_elapsed`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use super::params::CatalogRequest;
use super::transport::Transport;
use crate::error::{ApiError, Result};

/// Default spacing between consecutive calls (Jikan allows ~3 req/s).
pub const DEFAULT_SPACING: Duration = Duration::from_millis(350);

/// Dispatcher settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Delay after a call settles before the next one may start.
    pub spacing: Duration,
    /// Maximum number of waiting requests (`None` = unbounded).
    pub max_queue_depth: Option<usize>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_SPACING,
            max_queue_depth: None,
        }
    }
}

/// Point-in-time view of the dispatcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherSnapshot {
    /// Requests waiting in the queue (excluding the one in flight).
    pub queued: usize,
    /// Whether a call is executing or in its post-call spacing.
    pub in_flight: bool,
}

/// Counters shared between the handles and the worker.
#[derive(Debug)]
struct DispatcherState {
    queued: AtomicUsize,
    in_flight: AtomicBool,
    /// End of the spacing that follows the most recently settled call.
    ready_at: watch::Sender<Instant>,
}

impl DispatcherState {
    fn new() -> Self {
        let (ready_at, _) = watch::channel(Instant::now());
        Self {
            queued: AtomicUsize::new(0),
            in_flight: AtomicBool::new(false),
            ready_at,
        }
    }
}

/// A queued request and the channel its result settles on.
#[derive(Debug)]
struct QueueItem {
    request: CatalogRequest,
    reply: oneshot::Sender<Result<Value>>,
}

/// Handle to a single-flight request queue.
///
/// Cloning the handle shares the same queue. The worker stops once every
/// handle has been dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sender: mpsc::UnboundedSender<QueueItem>,
    state: Arc<DispatcherState>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Starts a dispatcher whose worker executes requests through `transport`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn spawn<T>(transport: T, config: DispatcherConfig) -> Self
    where
        T: Transport + Send + Sync + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let state = Arc::new(DispatcherState::new());

        tokio::spawn(run_worker(
            receiver,
            transport,
            config.spacing,
            Arc::clone(&state),
        ));

        Self {
            sender,
            state,
            config,
        }
    }

    /// Appends `request` to the queue and returns its pending result.
    ///
    /// Never blocks. The request starts as soon as every earlier request
    /// has settled and the spacing has elapsed; dropping the returned
    /// handle does not withdraw it.
    pub fn submit(&self, request: CatalogRequest) -> PendingResponse {
        let (reply, receiver) = oneshot::channel();
        let pending = PendingResponse { receiver };

        let reserved = match self.config.max_queue_depth {
            Some(max) => self
                .state
                .queued
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |queued| {
                    (queued < max).then_some(queued.saturating_add(1))
                }),
            None => Ok(self.state.queued.fetch_add(1, Ordering::AcqRel)),
        };
        let ahead = match reserved {
            Ok(ahead) => ahead,
            Err(queued) => {
                tracing::warn!(%request, queued, "Dispatcher queue full, shedding request");
                let _ = reply.send(Err(ApiError::QueueFull { depth: queued }));
                return pending;
            }
        };
        tracing::trace!(%request, ahead, "Request queued");

        if let Err(mpsc::error::SendError(item)) = self.sender.send(QueueItem { request, reply }) {
            self.state.queued.fetch_sub(1, Ordering::AcqRel);
            let _ = item.reply.send(Err(ApiError::DispatcherClosed));
        }

        pending
    }

    /// Returns the current queue length and in-flight flag.
    #[must_use]
    pub fn snapshot(&self) -> DispatcherSnapshot {
        DispatcherSnapshot {
            queued: self.state.queued.load(Ordering::Acquire),
            in_flight: self.state.in_flight.load(Ordering::Acquire),
        }
    }

    /// Waits until the spacing after the most recently settled call is over.
    ///
    /// Returns immediately when the dispatcher has been idle for at least
    /// one spacing. A call still executing is not waited for.
    pub async fn spacing_elapsed(&self) {
        let ready_at = *self.state.ready_at.borrow();
        tokio::time::sleep_until(ready_at).await;
    }

    /// Configured spacing between calls.
    #[must_use]
    pub const fn spacing(&self) -> Duration {
        self.config.spacing
    }
}

/// Drains the queue one request at a time.
async fn run_worker<T>(
    mut receiver: mpsc::UnboundedReceiver<QueueItem>,
    transport: T,
    spacing: Duration,
    state: Arc<DispatcherState>,
) where
    T: Transport + Send + Sync,
{
    while let Some(QueueItem { request, reply }) = receiver.recv().await {
        state.queued.fetch_sub(1, Ordering::AcqRel);
        state.in_flight.store(true, Ordering::Release);

        tracing::debug!(
            %request,
            queued = state.queued.load(Ordering::Acquire),
            "Dispatching catalog request"
        );

        let result = transport.execute(&request).await;

        if let Err(ref e) = result {
            tracing::error!(%request, status = ?e.status(), error = %e, "Catalog request failed");
        }

        let settled_at = Instant::now();
        let ready_at = settled_at.checked_add(spacing).unwrap_or(settled_at);
        state.ready_at.send_replace(ready_at);

        if reply.send(result).is_err() {
            tracing::debug!(%request, "Caller dropped the pending response");
        }

        tokio::time::sleep_until(ready_at).await;
        state.in_flight.store(false, Ordering::Release);
    }

    tracing::debug!("Dispatcher worker stopped");
}

/// Result of a submitted request, settled by the dispatcher worker.
#[derive(Debug)]
#[must_use = "the request runs regardless, but its result is lost unless awaited"]
pub struct PendingResponse {
    receiver: oneshot::Receiver<Result<Value>>,
}

impl Future for PendingResponse {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|settled| settled.unwrap_or(Err(ApiError::DispatcherClosed)))
    }
}
