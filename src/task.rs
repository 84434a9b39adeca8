//! Task utilities for running the router off the caller's task.
//!
//! Provides [`CancelSource`]/[`CancelToken`] for cancelling a transition,
//! [`TaskHandle`] for aborting the driver task, and [`RouterHandle`], which
//! owns a spawned driver that applies route requests strictly one at a time.

use crate::config::OverlapPolicy;
use crate::error::{RouterStoppedSnafu, TransitionInFlightSnafu};
use crate::route::RouteTree;
use crate::router::{RouteRequest, Router, TransitionReport};
use crate::{Error, Result};
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::AbortHandle;

/// The cancelling side of a [`CancelToken`].
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// A token that observes this source.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Cancel every token of this source. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Observes a [`CancelSource`]. Dropping the source without cancelling
/// leaves the token uncancelled forever.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once the source is cancelled.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// A handle to a spawned task that can be aborted.
#[derive(Debug)]
pub struct TaskHandle {
    abort_handle: AbortHandle,
}

impl TaskHandle {
    /// Create a new TaskHandle from an AbortHandle.
    pub fn new(abort_handle: AbortHandle) -> Self {
        Self { abort_handle }
    }

    /// Abort the task. The task will be cancelled at the next await point.
    pub fn abort(&self) {
        self.abort_handle.abort();
    }

    /// Check if the task has finished (either completed or aborted).
    pub fn is_finished(&self) -> bool {
        self.abort_handle.is_finished()
    }
}

enum Command {
    Navigate {
        request: RouteRequest,
        cancel: CancelToken,
        reply: oneshot::Sender<Result<TransitionReport>>,
    },
    Current {
        reply: oneshot::Sender<RouteTree>,
    },
}

/// A route request that has been handed to the driver.
#[derive(Debug)]
pub struct PendingTransition {
    reply: oneshot::Receiver<Result<TransitionReport>>,
    cancel: CancelSource,
}

impl PendingTransition {
    /// Ask the driver to stop this transition at its next step, or to skip it
    /// if it has not started yet.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait until the driver has finished with this request.
    pub async fn wait(self) -> Result<TransitionReport> {
        let Self { reply, cancel } = self;
        let res = reply.await.map_err(|_| Error::RouterStopped)?;
        drop(cancel);
        res
    }
}

/// Owns a spawned task that serializes every route request.
///
/// Each request is diffed against the tree the router actually shows when
/// the request starts, so a burst of requests (a back gesture immediately
/// followed by another navigation, say) can never leave the route tree and
/// the adapter chain disagreeing.
///
/// # Example
/// ```ignore
/// let handle = RouterHandle::spawn(router);
/// let pending = handle.navigate(RouteRequest::new([RouteSegment::MAIN]))?;
/// let report = pending.wait().await?;
/// ```
#[derive(Debug)]
pub struct RouterHandle {
    tx: mpsc::UnboundedSender<Command>,
    pending: Arc<AtomicUsize>,
    overlap: OverlapPolicy,
    task: TaskHandle,
}

impl RouterHandle {
    /// Move `router` onto a new tokio task.
    pub fn spawn(router: Router) -> Self {
        let overlap = router.config().overlap;
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let join = tokio::spawn(drive(router, rx, pending.clone()));
        Self {
            tx,
            pending,
            overlap,
            task: TaskHandle::new(join.abort_handle()),
        }
    }

    /// Hand a request to the driver.
    ///
    /// Under [`OverlapPolicy::Reject`] this fails with `TransitionInFlight`
    /// while an earlier request is still pending.
    pub fn navigate(&self, request: RouteRequest) -> Result<PendingTransition> {
        match self.overlap {
            OverlapPolicy::Reject => {
                if self
                    .pending
                    .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    debug!("rejecting {} while a transition is in flight", request.tree);
                    return TransitionInFlightSnafu.fail();
                }
            }
            OverlapPolicy::Queue => {
                self.pending.fetch_add(1, Ordering::SeqCst);
            }
        }

        let cancel = CancelSource::new();
        let (reply, rx) = oneshot::channel();
        let command = Command::Navigate {
            request,
            cancel: cancel.token(),
            reply,
        };
        if self.tx.send(command).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return RouterStoppedSnafu.fail();
        }
        Ok(PendingTransition { reply: rx, cancel })
    }

    /// Number of requests handed over and not yet finished.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_busy(&self) -> bool {
        self.pending() > 0
    }

    /// The route tree the router shows once every earlier request is done.
    pub async fn current(&self) -> Result<RouteTree> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Current { reply })
            .map_err(|_| Error::RouterStopped)?;
        rx.await.map_err(|_| Error::RouterStopped)
    }

    /// Abort the driver. Pending requests resolve with `RouterStopped`.
    pub fn shutdown(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn drive(mut router: Router, mut rx: mpsc::UnboundedReceiver<Command>, pending: Arc<AtomicUsize>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Navigate {
                request,
                cancel,
                reply,
            } => {
                let res = router.set_route_cancellable(request, cancel).await;
                pending.fetch_sub(1, Ordering::SeqCst);
                let _ = reply.send(res);
            }
            Command::Current { reply } => {
                let _ = reply.send(router.current().clone());
            }
        }
    }
    debug!("router driver stopped at {}", router.current());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterConfig;
    use crate::platform::{MemoryToolkit, Screen};
    use crate::router::AdapterKind;
    use std::time::Duration;

    fn route(path: &str) -> RouteRequest {
        RouteRequest::new(path.parse::<RouteTree>().unwrap())
    }

    fn spawn(animation_ms: u64, overlap: OverlapPolicy) -> (Arc<MemoryToolkit>, RouterHandle) {
        let memory = Arc::new(MemoryToolkit::new(Duration::from_millis(animation_ms)));
        let config = RouterConfig {
            overlap,
            ..RouterConfig::default()
        };
        let router = Router::for_toolkit(memory.clone().into(), config);
        (memory, RouterHandle::spawn(router))
    }

    #[tokio::test]
    async fn test_cancel_token() {
        assert!(!CancelToken::never().is_cancelled());

        let source = CancelSource::new();
        let token = source.token();
        assert!(!token.is_cancelled());
        source.cancel();
        source.cancel();
        assert!(token.is_cancelled());
        token.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_outlives_dropped_source() {
        let token = CancelSource::new().token();
        let res = tokio::time::timeout(Duration::from_secs(1), token.cancelled()).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn test_task_handle_abort() {
        let handle = tokio::spawn(async {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        });
        let task_handle = TaskHandle::new(handle.abort_handle());
        assert!(!task_handle.is_finished());
        task_handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert!(task_handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_then_bookmark_burst_stays_consistent() {
        let (memory, handle) = spawn(200, OverlapPolicy::Queue);
        handle.navigate(route("Main/RepositoryDetail")).unwrap().wait().await.unwrap();

        // Back gesture removes the detail screen, then the bookmark button
        // fires before the router has caught up.
        let container = memory.window_root().unwrap().unwrap();
        memory.native_back(container).unwrap();
        let back = handle.navigate(route("Main")).unwrap();
        let bookmark = handle.navigate(route("Main/Bookmark")).unwrap();
        assert_eq!(handle.pending(), 2);

        let back = back.wait().await.unwrap();
        assert_eq!(back.to.to_string(), "/Main");
        let bookmark = bookmark.wait().await.unwrap();
        assert_eq!(bookmark.from.to_string(), "/Main");
        assert_eq!(bookmark.to.to_string(), "/Main/Bookmark");

        assert_eq!(handle.current().await.unwrap().to_string(), "/Main/Bookmark");
        assert_eq!(memory.snapshot().unwrap().stack, vec![Screen::Bookmark]);
        assert!(!handle.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bookmark_before_back_update_is_reported_then_recovers() {
        let (memory, handle) = spawn(200, OverlapPolicy::Queue);
        handle.navigate(route("Main/RepositoryDetail")).unwrap().wait().await.unwrap();

        // The bookmark request overtakes the route update of the back gesture.
        let container = memory.window_root().unwrap().unwrap();
        memory.native_back(container).unwrap();
        let bookmark = handle.navigate(route("Main/Bookmark")).unwrap();
        let back = handle.navigate(route("Main")).unwrap();

        let err = bookmark.wait().await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedTransition { adapter: AdapterKind::Main, .. }));
        assert!(memory.snapshot().unwrap().stack.is_empty());

        let back = back.wait().await.unwrap();
        assert_eq!(back.from.to_string(), "/Main/RepositoryDetail");
        assert_eq!(back.to.to_string(), "/Main");
        assert!(memory.snapshot().unwrap().stack.is_empty());

        let retry = handle.navigate(route("Main/Bookmark")).unwrap().wait().await.unwrap();
        assert_eq!(retry.to.to_string(), "/Main/Bookmark");
        assert_eq!(memory.snapshot().unwrap().stack, vec![Screen::Bookmark]);
        assert!(!handle.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_policy_refuses_overlap() {
        let (_memory, handle) = spawn(200, OverlapPolicy::Reject);
        handle.navigate(route("Main")).unwrap().wait().await.unwrap();

        let first = handle.navigate(route("Main/Bookmark")).unwrap();
        let err = handle.navigate(route("Main/RepositoryDetail")).unwrap_err();
        assert!(matches!(err, Error::TransitionInFlight));

        first.wait().await.unwrap();
        let again = handle.navigate(route("Main")).unwrap();
        assert_eq!(again.wait().await.unwrap().to.to_string(), "/Main");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_queued_request() {
        let (_memory, handle) = spawn(200, OverlapPolicy::Queue);
        let main = handle.navigate(route("Main/Bookmark")).unwrap();
        let detail = handle.navigate(route("Main/RepositoryDetail")).unwrap();
        detail.cancel();

        main.wait().await.unwrap();
        let err = detail.wait().await.unwrap_err();
        assert!(matches!(err, Error::TransitionCancelled { .. }));
        assert_eq!(handle.current().await.unwrap().to_string(), "/Main/Bookmark");
    }

    #[tokio::test]
    async fn test_shutdown_stops_driver() {
        let (_memory, handle) = spawn(0, OverlapPolicy::Queue);
        handle.navigate(route("Main")).unwrap().wait().await.unwrap();
        handle.shutdown();
        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }
        assert!(matches!(handle.navigate(route("Login")), Err(Error::RouterStopped)));
        assert!(matches!(handle.current().await, Err(Error::RouterStopped)));
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test]
    async fn test_driver_reports_invariant_violation() {
        let (_memory, handle) = spawn(0, OverlapPolicy::Queue);
        let err = handle.navigate(route("Signup")).unwrap().wait().await.unwrap_err();
        assert!(err.is_invariant_violation());

        let report = handle.navigate(route("Main")).unwrap().wait().await.unwrap();
        assert_eq!(report.from, RouteTree::new());
    }
}
