use std::collections::HashSet;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use log::{debug, info, warn};
use uuid::Uuid;

use crate::error::Error;

/// Runs an operation under a fresh correlation id, logging start, outcome
/// and elapsed time. The result passes through unchanged.
pub async fn track<F, T>(name: &str, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    let op_id = Uuid::new_v4();
    let start = Instant::now();
    debug!("[{}] {} started", op_id, name);
    let out = fut.await;
    match &out {
        Ok(_) => info!("[{}] {} finished in {:?}", op_id, name, start.elapsed()),
        Err(e) => warn!("[{}] {} failed after {:?}: {}", op_id, name, start.elapsed(), e),
    }
    out
}

/// In-memory, per-process duplicate-submission guard. While an action runs
/// under some key, a second action under the same key is rejected
/// immediately; the key is released when the first action resolves, whether
/// it succeeded or failed. Does not coordinate across instances.
#[derive(Debug, Default)]
pub struct OperationGuard {
    pending: Mutex<HashSet<String>>,
}

impl OperationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F, T>(&self, key: &str, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if !pending.insert(key.to_owned()) {
                return Err(Error::DuplicateOperation(key.to_owned()));
            }
        }
        let _release = Release { guard: self, key };
        fut.await
    }

    /// Forgets every pending key. Meant for tests and shutdown paths; an
    /// in-flight action will still remove its own key harmlessly.
    pub fn clear(&self) {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

struct Release<'a> {
    guard: &'a OperationGuard,
    key: &'a str,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.guard
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.key);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use futures::{pin_mut, poll};

    #[actix_web::test]
    async fn concurrent_duplicate_is_rejected() {
        let guard = OperationGuard::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let first = guard.run("submit", async move {
            rx.await.ok();
            Ok(1)
        });
        pin_mut!(first);
        // Drive the first action far enough to register its key.
        assert!(poll!(&mut first).is_pending());

        let second = guard.run("submit", async { Ok(2) }).await;
        assert!(matches!(second, Err(Error::DuplicateOperation(_))));

        tx.send(()).ok();
        assert_eq!(first.await.unwrap(), 1);

        // Key released, a third run goes through.
        let third = guard.run("submit", async { Ok(3) }).await.unwrap();
        assert_eq!(third, 3);
    }

    #[actix_web::test]
    async fn key_is_released_on_failure() {
        let guard = OperationGuard::new();
        let failed: Result<(), Error> = guard
            .run("submit", async { Err(Error::BusinessError("boom".into())) })
            .await;
        assert!(failed.is_err());

        let retry = guard.run("submit", async { Ok(()) }).await;
        assert!(retry.is_ok());
    }

    #[actix_web::test]
    async fn distinct_keys_do_not_interfere() {
        let guard = OperationGuard::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let first = guard.run("a", async move {
            rx.await.ok();
            Ok(())
        });
        pin_mut!(first);
        assert!(poll!(&mut first).is_pending());

        let other = guard.run("b", async { Ok(()) }).await;
        assert!(other.is_ok());

        tx.send(()).ok();
        first.await.unwrap();
    }
}
