//! Coalesces concurrent requests that share a [`RequestKey`] into one operation.

use crate::error::FetchError;
use crate::types::params::RequestKey;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

type PendingOperation<T> = Shared<BoxFuture<'static, Result<T, FetchError>>>;
type PendingMap<T> = Arc<Mutex<HashMap<RequestKey, PendingOperation<T>>>>;

/// Table of operations currently running, at most one per key.
///
/// Each operation runs on its own task. Callers only await a shared handle to
/// it, so a caller that goes away does not cancel the work for the others.
pub struct InFlightRegistry<T> {
    pending: PendingMap<T>,
}

impl<T> Default for InFlightRegistry<T> {
    fn default() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Removes the key once the operation's task finishes or is torn down.
struct ReleaseOnDrop<T> {
    pending: PendingMap<T>,
    key: RequestKey,
}

impl<T> Drop for ReleaseOnDrop<T> {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.key);
    }
}

impl<T> InFlightRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Awaits the operation registered for `key`, starting `operation` if there
    /// is none.
    ///
    /// When an operation is already pending, `operation` is dropped unpolled and
    /// the caller receives a clone of the pending result. If the task driving an
    /// operation panics or is aborted, every waiter gets
    /// [`FetchError::Cancelled`].
    pub async fn register<F>(&self, key: RequestKey, operation: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let handle = {
            let mut pending = self.pending.lock();
            match pending.entry(key) {
                Entry::Occupied(entry) => {
                    debug!("Joining in-flight request for {}", entry.key());
                    entry.get().clone()
                }
                Entry::Vacant(entry) => {
                    // The task's release takes the lock, so it cannot run before
                    // the insert below.
                    let release = ReleaseOnDrop {
                        pending: Arc::clone(&self.pending),
                        key: entry.key().clone(),
                    };
                    let task = tokio::spawn(async move {
                        let _release = release;
                        operation.await
                    });
                    let handle = async move {
                        task.await.unwrap_or_else(|e| {
                            warn!("In-flight request task failed: {}", e);
                            Err(FetchError::Cancelled)
                        })
                    }
                    .boxed()
                    .shared();
                    entry.insert(handle.clone());
                    handle
                }
            }
        };
        handle.await
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_pending(&self, key: &RequestKey) -> bool {
        self.pending.lock().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::params::FetchParams;
    use crate::validation::error::SchemaError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn key(day: u32) -> RequestKey {
        FetchParams::new("1", "2", format!("2023-01-{day:02}"), "2023-01-31").key()
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_run() {
        let registry = Arc::new(InFlightRegistry::<u32>::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            let runs = Arc::clone(&runs);
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                registry
                    .register(key(1), async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        gate.notified().await;
                        Ok(42)
                    })
                    .await
            }));
        }

        while !registry.is_pending(&key(1)) {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.notify_one();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 42);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(registry.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_error_reaches_every_waiter_and_releases_key() {
        let registry = Arc::new(InFlightRegistry::<u32>::new());
        let gate = Arc::new(Notify::new());

        let first = {
            let registry = Arc::clone(&registry);
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                registry
                    .register(key(2), async move {
                        gate.notified().await;
                        Err(FetchError::Schema(SchemaError::MissingDaily))
                    })
                    .await
            })
        };
        while !registry.is_pending(&key(2)) {
            tokio::task::yield_now().await;
        }
        let second = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.register(key(2), async { Ok(7) }).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.notify_one();

        let first = first.await.unwrap().unwrap_err();
        let second = second.await.unwrap().unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
        assert!(matches!(second, FetchError::Schema(SchemaError::MissingDaily)));
        assert!(!registry.is_pending(&key(2)));

        let retry = registry.register(key(2), async { Ok(7) }).await;
        assert_eq!(retry.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let registry = InFlightRegistry::<u32>::new();
        let (a, b) = tokio::join!(
            registry.register(key(3), async { Ok(3) }),
            registry.register(key(4), async { Ok(4) }),
        );
        assert_eq!((a.unwrap(), b.unwrap()), (3, 4));
    }

    #[tokio::test]
    async fn test_dropped_waiter_does_not_cancel_operation() {
        let registry = Arc::new(InFlightRegistry::<u32>::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let abandoned = {
            let registry = Arc::clone(&registry);
            let runs = Arc::clone(&runs);
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                registry
                    .register(key(5), async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        gate.notified().await;
                        Ok(5)
                    })
                    .await
            })
        };
        while !registry.is_pending(&key(5)) {
            tokio::task::yield_now().await;
        }
        abandoned.abort();

        let joined = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.register(key(5), async { Ok(0) }).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.notify_one();

        assert_eq!(joined.await.unwrap().unwrap(), 5);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_operation_is_reported_as_cancelled() {
        let registry = InFlightRegistry::<u32>::new();
        let result = registry
            .register(key(6), async {
                let value: Option<u32> = None;
                value.map(Ok).unwrap_or_else(|| panic!("operation blew up"))
            })
            .await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
        assert!(!registry.is_pending(&key(6)));
    }
}
