//! Lifetime of a view and the requests it issues.
//!
//! A controller races each request against its scope closing. Once the scope
//! is closed the in-flight future is dropped and the caller sees
//! `AdminError::Cancelled`, so nothing is written into a view that is gone.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::{AdminError, AdminResult};

/// Shared open/closed flag. Clones observe and control the same scope.
#[derive(Debug, Clone)]
pub struct ViewScope {
    closed: Arc<watch::Sender<bool>>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { closed: Arc::new(tx) }
    }

    /// Close the scope. In-flight and future requests resolve to `Cancelled`.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Await `work` unless the scope closes first; `None` means it was dropped.
    pub async fn race<F: Future>(&self, work: F) -> Option<F::Output> {
        let mut rx = self.closed.subscribe();
        if *rx.borrow_and_update() {
            return None;
        }

        tokio::select! {
            biased;
            _ = rx.wait_for(|closed| *closed) => None,
            output = work => Some(output),
        }
    }

    /// Run `request` unless the scope closes first.
    pub async fn run<T, F>(&self, request: F) -> AdminResult<T>
    where
        F: Future<Output = AdminResult<T>>,
    {
        self.race(request).await.unwrap_or(Err(AdminError::Cancelled))
    }
}
