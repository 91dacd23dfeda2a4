//! Cooperative cancellation for fetches
//!
//! A [`CancellationToken`] is shared between the screen that started a fetch
//! and the fetch itself. Cancelling drops the in-flight future at its next
//! await point and the call returns [`BackendError::Cancelled`].

use crate::error::{BackendError, BackendResult};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cancellation token wrapping an `AtomicBool` plus a wake-up signal
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    /// Create a new cancellation token (not cancelled)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation and wake every waiter
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            tracing::debug!("fetch cancelled");
            self.inner.notify.notify_waiters();
        }
    }

    /// Resolve once [`cancel`](Self::cancel) has been called
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel is not missed
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Run `fut` unless cancelled first
    ///
    /// # Errors
    /// `BackendError::Cancelled` when the token fires before `fut` completes,
    /// otherwise whatever `fut` returns.
    pub async fn run<T, F>(&self, fut: F) -> BackendResult<T>
    where
        F: Future<Output = BackendResult<T>>,
    {
        if self.is_cancelled() {
            return Err(BackendError::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.cancelled() => Err(BackendError::Cancelled),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let token = CancellationToken::new();
        let value = token.run(async { Ok::<_, BackendError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn cancel_aborts_pending_future() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let result = token
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, BackendError>(())
            })
            .await;
        assert!(matches!(result, Err(BackendError::Cancelled)));
    }

    #[tokio::test]
    async fn already_cancelled_never_polls() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancel();
        let result: BackendResult<()> = token.run(async { unreachable!("should not run") }).await;
        assert!(matches!(result, Err(BackendError::Cancelled)));
        assert!(token.is_cancelled());
    }
}
