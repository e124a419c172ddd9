//! Concurrency limiter with politeness pacing
//!
//! A counting semaphore bounds in-flight requests; every acquisition is
//! followed by a fixed pacing delay before the caller may proceed. The permit
//! is an owned guard, so it is released on every exit path of the caller,
//! including early returns and timeouts.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Counting permit plus a pacing delay
#[derive(Debug, Clone)]
pub struct Limiter {
    permits: Arc<Semaphore>,
    capacity: usize,
    delay: Duration,
}

impl Limiter {
    /// Creates a limiter; a capacity of zero is raised to one
    pub fn new(capacity: usize, delay: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            delay,
        }
    }

    /// Waits for a permit, then sleeps the pacing delay
    ///
    /// The returned permit must be held for the duration of the request.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        let permit = self.permits.clone().acquire_owned().await?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(permit)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_zero_capacity_is_raised() {
        let limiter = Limiter::new(0, Duration::ZERO);
        assert_eq!(limiter.capacity(), 1);
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn test_capacity_blocks_further_acquisition() {
        let limiter = Limiter::new(2, Duration::ZERO);
        let first = limiter.acquire().await.unwrap();
        let _second = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available(), 0);

        let blocked = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(blocked.is_err());

        drop(first);
        let third = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_permit_released_when_task_fails() {
        let limiter = Limiter::new(1, Duration::ZERO);

        let result: Result<(), &str> = async {
            let _permit = limiter.acquire().await.map_err(|_| "closed")?;
            Err("request failed")
        }
        .await;

        assert!(result.is_err());
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn test_pacing_delay_applies() {
        let limiter = Limiter::new(1, Duration::from_millis(30));
        let start = std::time::Instant::now();
        let _permit = limiter.acquire().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_never_exceeds_capacity() {
        let limiter = Arc::new(Limiter::new(3, Duration::ZERO));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..12)
            .map(|_| {
                let limiter = limiter.clone();
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let _permit = limiter.acquire().await.unwrap();
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .collect();

        futures::future::join_all(tasks).await;
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(limiter.available(), 3);
    }
}
