use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Default quiescence window for the search bar.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

type Callback<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

/// Coalesces bursts of calls into one delayed callback carrying the last
/// argument.
///
/// At most one timer is pending per debouncer: each [`Debouncer::call`]
/// aborts the pending timer and schedules a new one. Once a timer fires, the
/// callback runs detached, so a later call never cancels a callback that has
/// already started.
pub struct Debouncer<T> {
    window: Duration,
    callback: Callback<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(window: Duration, callback: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback: Callback<T> =
            Arc::new(move |arg: T| -> BoxFuture<'static, ()> { Box::pin(callback(arg)) });
        Self {
            window,
            callback,
            pending: None,
        }
    }

    /// Schedule the callback for `arg`, replacing any pending invocation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn call(&mut self, arg: T) {
        self.cancel();

        // Deadline is fixed now, not when the timer task is first polled
        let deadline = Instant::now() + self.window;
        let callback = Arc::clone(&self.callback);
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            tokio::spawn(callback(arg));
        }));
    }

    /// Drop the pending invocation, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                tracing::trace!("Superseding pending debounced call");
            }
            handle.abort();
        }
    }

    /// True while a timer is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
