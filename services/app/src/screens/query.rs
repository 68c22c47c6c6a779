//! services/app/src/screens/query.rs
//!
//! The focus-triggered data query shared by every screen that shows server data.
//!
//! Each `focus` cancels whatever the previous focus started, drops any data it
//! showed, enters `Loading` and spawns the fetch. A result is only written if
//! its own cancellation token is still live at the moment of writing, so a slow
//! response from an earlier focus (or from a screen that has since lost focus)
//! can never overwrite the current state.

use crate::error::{GatewayError, GatewayResult};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::lock;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    /// Not focused, or focus was lost before the load finished.
    Idle,
    Loading,
    Ready(T),
    Failed(GatewayError),
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&GatewayError> {
        match self {
            QueryState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

type Fetch<T> = Arc<dyn Fn() -> BoxFuture<'static, GatewayResult<T>> + Send + Sync>;

pub struct FocusQuery<T> {
    name: &'static str,
    fetch: Fetch<T>,
    state: Arc<watch::Sender<QueryState<T>>>,
    active: Mutex<Option<CancellationToken>>,
}

impl<T> FocusQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// `fetch` is invoked once per focus; it must not capture screen state.
    pub fn new<F, Fut>(name: &'static str, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = GatewayResult<T>> + Send + 'static,
    {
        let (state, _) = watch::channel(QueryState::Idle);
        Self {
            name,
            fetch: Arc::new(move || fetch().boxed()),
            state: Arc::new(state),
            active: Mutex::new(None),
        }
    }

    /// Starts a fresh load, superseding any load still in flight.
    pub fn focus(&self) -> JoinHandle<()> {
        let mut active = lock(&self.active);
        self.start(&mut active)
    }

    /// Reloads only while focused. After `blur` this does nothing, so a
    /// mutation that finishes after the user left cannot revive the query.
    pub fn refetch(&self) -> Option<JoinHandle<()>> {
        let mut active = lock(&self.active);
        if active.is_none() {
            debug!(query = self.name, "Skipping refetch for an inactive screen");
            return None;
        }
        Some(self.start(&mut active))
    }

    fn start(&self, active: &mut Option<CancellationToken>) -> JoinHandle<()> {
        let token = CancellationToken::new();
        if let Some(previous) = active.replace(token.clone()) {
            previous.cancel();
        }
        self.state.send_replace(QueryState::Loading);

        let fetch = (self.fetch)();
        let state = Arc::clone(&self.state);
        let name = self.name;
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(query = name, "Fetch abandoned after focus was lost");
                    return;
                }
                result = fetch => result,
            };

            state.send_if_modified(|current| {
                // Checked under the channel's write lock, so a concurrent
                // `focus` either sees this write or supersedes it.
                if token.is_cancelled() {
                    debug!(query = name, "Discarding result for an inactive screen");
                    return false;
                }
                *current = match result {
                    Ok(data) => QueryState::Ready(data),
                    Err(e) => {
                        warn!(query = name, "Failed to load: {}", e);
                        QueryState::Failed(e)
                    }
                };
                true
            });
        })
    }

    /// The screen lost focus or unmounted: any in-flight result is discarded
    /// and a pending load falls back to `Idle`. Loaded data is left as is.
    pub fn blur(&self) {
        let mut active = lock(&self.active);
        if let Some(token) = active.take() {
            token.cancel();
        }
        self.state.send_if_modified(|current| {
            if current.is_loading() {
                *current = QueryState::Idle;
                return true;
            }
            false
        });
    }

    pub fn is_active(&self) -> bool {
        lock(&self.active).is_some()
    }

    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    /// Change notifications for rendering.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.subscribe()
    }

    pub fn with_data<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.state.borrow().data().map(f)
    }

    /// Edits loaded data in place, e.g. to reflect a confirmed mutation before
    /// the next fetch. No-op unless data is loaded.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        self.state.send_if_modified(|current| match current {
            QueryState::Ready(data) => {
                f(data);
                true
            }
            _ => false,
        })
    }
}

impl<T> Drop for FocusQuery<T> {
    fn drop(&mut self) {
        if let Some(token) = lock(&self.active).take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    /// A query whose n-th fetch resolves when the n-th sender fires.
    fn gated(count: usize) -> (FocusQuery<u32>, Vec<oneshot::Sender<GatewayResult<u32>>>) {
        let mut senders = Vec::new();
        let mut receivers = Vec::new();
        for _ in 0..count {
            let (tx, rx) = oneshot::channel();
            senders.push(tx);
            receivers.push(rx);
        }
        let receivers = Arc::new(Mutex::new(receivers.into_iter()));
        let query = FocusQuery::new("gated", move || {
            let rx = receivers.lock().unwrap().next();
            async move {
                match rx {
                    Some(rx) => rx.await.unwrap_or(Err(GatewayError::Network("closed".into()))),
                    None => Err(GatewayError::Network("no more fetches".into())),
                }
            }
        });
        (query, senders)
    }

    #[tokio::test]
    async fn loading_then_ready() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let query = FocusQuery::new("count", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) as u32;
            async move { Ok(n) }
        });
        assert_eq!(query.state(), QueryState::Idle);

        query.focus().await.unwrap();
        assert_eq!(query.state(), QueryState::Ready(0));

        // Every re-focus fetches again.
        query.focus().await.unwrap();
        assert_eq!(query.state(), QueryState::Ready(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refocus_clears_previous_data_while_loading() {
        let (query, mut senders) = gated(2);
        let first = query.focus();
        senders.remove(0).send(Ok(1)).unwrap();
        first.await.unwrap();
        assert_eq!(query.state(), QueryState::Ready(1));

        let second = query.focus();
        assert!(query.state().is_loading());
        senders.remove(0).send(Ok(2)).unwrap();
        second.await.unwrap();
        assert_eq!(query.state(), QueryState::Ready(2));
    }

    #[tokio::test]
    async fn blurred_result_is_discarded() {
        let (query, mut senders) = gated(1);
        let handle = query.focus();
        query.blur();
        // The fetch was abandoned, so the sender's receiver may be gone.
        let _ = senders.remove(0).send(Ok(7));
        handle.await.unwrap();
        assert_eq!(query.state(), QueryState::Idle);
        assert!(!query.is_active());
    }

    #[tokio::test]
    async fn blur_keeps_loaded_data() {
        let query = FocusQuery::new("value", || async { Ok(3u32) });
        query.focus().await.unwrap();
        query.blur();
        assert_eq!(query.state(), QueryState::Ready(3));
    }

    #[tokio::test]
    async fn refetch_is_ignored_once_blurred() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let query = FocusQuery::new("count", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) as u32;
            async move { Ok(n) }
        });

        assert!(query.refetch().is_none());
        query.focus().await.unwrap();
        query.refetch().unwrap().await.unwrap();
        assert_eq!(query.state(), QueryState::Ready(1));

        query.blur();
        assert!(query.refetch().is_none());
        assert!(!query.is_active());
        assert_eq!(query.state(), QueryState::Ready(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn slow_earlier_focus_cannot_overwrite_later_one() {
        let (query, mut senders) = gated(2);
        let stale_tx = senders.remove(0);
        let fresh_tx = senders.remove(0);

        let stale = query.focus();
        let fresh = query.focus();
        fresh_tx.send(Ok(2)).unwrap();
        fresh.await.unwrap();
        let _ = stale_tx.send(Ok(1));
        stale.await.unwrap();

        assert_eq!(query.state(), QueryState::Ready(2));
    }

    #[tokio::test]
    async fn failure_is_a_state_not_a_panic() {
        let query: FocusQuery<u32> =
            FocusQuery::new("failing", || async { Err(GatewayError::Network("offline".into())) });
        query.focus().await.unwrap();
        let state = query.state();
        assert!(!state.is_loading());
        assert!(matches!(state.error(), Some(GatewayError::Network(_))));
    }

    #[tokio::test]
    async fn update_only_touches_loaded_data() {
        let query = FocusQuery::new("value", || async { Ok(10u32) });
        assert!(!query.update(|v| *v += 1));
        query.focus().await.unwrap();
        assert!(query.update(|v| *v += 1));
        assert_eq!(query.with_data(|v| *v), Some(11));
    }

    #[tokio::test]
    async fn subscribers_see_the_transitions() {
        let query = FocusQuery::new("value", || async { Ok(5u32) });
        let mut rx = query.subscribe();
        query.focus().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), QueryState::Ready(5));
    }
}
