//! Admission gate for the simulated database.
//!
//! [`ResourcePool`] caps the number of in-flight simulated backend operations
//! using a tokio semaphore, modeling an exhaustible connection pool. Admission
//! is represented by an RAII [`PoolPermit`] which returns its slot on drop, so
//! a slot is released exactly once per successful acquire no matter which path
//! the caller takes afterwards.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{Error, Result};

/// Fixed-capacity admission gate for simulated backend operations.
///
/// The pool is created once at startup and shared by handle; cloning is cheap
/// and all clones refer to the same slots.
#[derive(Clone, Debug)]
pub struct ResourcePool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    acquire_timeout: Duration,
}

impl ResourcePool {
    /// Creates a pool with the given capacity and acquire timeout.
    pub fn new(capacity: usize, acquire_timeout: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            acquire_timeout,
        }
    }

    /// Waits for a free slot, giving up after the configured timeout.
    ///
    /// Returns [`Error::PoolExhausted`] when no slot became available in
    /// time. Admission order under contention is first-ready-wins.
    pub async fn acquire(&self) -> Result<PoolPermit> {
        let acquire = self.semaphore.clone().acquire_owned();
        match tokio::time::timeout(self.acquire_timeout, acquire).await {
            Ok(Ok(permit)) => Ok(PoolPermit { _permit: permit }),
            // The semaphore is never closed, but treat it as exhaustion
            // rather than panicking.
            Ok(Err(_)) | Err(_) => Err(Error::PoolExhausted),
        }
    }

    /// Returns the number of slots currently held.
    pub fn in_use(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Returns the total number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// RAII guard for an admitted pool slot.
///
/// Dropping the permit returns the slot to the [`ResourcePool`].
#[derive(Debug)]
pub struct PoolPermit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn acquire_and_release() {
        let pool = ResourcePool::new(2, TIMEOUT);
        assert_eq!(pool.capacity(), 2);
        assert_eq!(pool.in_use(), 0);

        let p1 = pool.acquire().await.unwrap();
        assert_eq!(pool.in_use(), 1);

        let p2 = pool.acquire().await.unwrap();
        assert_eq!(pool.in_use(), 2);

        drop(p1);
        assert_eq!(pool.in_use(), 1);

        drop(p2);
        assert_eq!(pool.in_use(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_pool_rejects_after_timeout() {
        let pool = ResourcePool::new(1, TIMEOUT);
        let _held = pool.acquire().await.unwrap();

        let start = Instant::now();
        let result = pool.acquire().await;

        assert!(matches!(result, Err(Error::PoolExhausted)));
        assert!(start.elapsed() >= TIMEOUT);
        assert_eq!(pool.in_use(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn one_of_two_concurrent_acquires_wins() {
        let pool = ResourcePool::new(1, TIMEOUT);

        let (first, second) = tokio::join!(pool.acquire(), pool.acquire());

        assert!(first.is_ok());
        assert!(matches!(second, Err(Error::PoolExhausted)));
    }

    #[tokio::test]
    async fn waiting_acquire_succeeds_once_a_slot_frees_up() {
        let pool = ResourcePool::new(1, Duration::from_secs(1));
        let held = pool.acquire().await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(held);

        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn held_count_never_exceeds_capacity() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let pool = ResourcePool::new(4, Duration::from_secs(1));
        let held = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let pool = pool.clone();
                let held = Arc::clone(&held);
                tokio::spawn(async move {
                    let _permit = pool.acquire().await.unwrap();
                    let current = held.fetch_add(1, Ordering::SeqCst) + 1;
                    assert!(current <= 4, "{current} permits held concurrently");
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    held.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(pool.in_use(), 0);
    }
}
