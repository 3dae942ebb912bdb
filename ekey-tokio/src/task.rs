//! A minimal version of Lexe's "named, logged task" pattern: background
//! work (the usage-store eviction loop) gets a name and has its panics
//! logged instead of silently vanishing.

use std::{borrow::Cow, future::Future};

use tokio::task::JoinHandle;
use tracing::{Instrument, error, info};

/// A spawned task, tagged with a name for logging.
pub struct EkeyTask<T> {
    handle: JoinHandle<T>,
    name: Cow<'static, str>,
}

impl<T> EkeyTask<T> {
    /// Spawn `future` under `name`, inheriting the current tracing span.
    #[allow(clippy::disallowed_methods)]
    pub fn spawn<F>(name: impl Into<Cow<'static, str>>, future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let name = name.into();
        let span = tracing::Span::current();
        let handle = tokio::spawn(future.instrument(span));
        Self { handle, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Await the task, logging (rather than panicking the caller) if it
    /// panicked or was cancelled.
    pub async fn join_logged(self) {
        match self.handle.await {
            Ok(_) => info!(task = %self.name, "task finished"),
            Err(e) if e.is_cancelled() => {
                info!(task = %self.name, "task cancelled")
            }
            Err(e) => error!(task = %self.name, error = %e, "task panicked"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn join_logged_completes_on_success() {
        let task = EkeyTask::spawn("test-task", async { 42 });
        task.join_logged().await;
    }

    #[tokio::test]
    async fn join_logged_does_not_panic_on_inner_panic() {
        let task = EkeyTask::spawn("panicking-task", async {
            panic!("boom");
        });
        task.join_logged().await;
    }
}
