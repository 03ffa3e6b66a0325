//! Startup gate waiting for the storage engine.

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

/// Something able to tell whether a dependency accepts connections.
#[async_trait]
pub trait Probe: Send + Sync {
    type Error: Display + Send;

    /// Try to obtain a live connection once.
    async fn probe(&self) -> Result<(), Self::Error>;
}

/// Block until `probe` succeeds, sleeping `poll_interval` between attempts.
///
/// There is no retry limit. Returns the number of attempts made.
pub async fn wait_for_storage<P>(probe: &P, poll_interval: Duration) -> u32
where
    P: Probe + ?Sized,
{
    tracing::info!("waiting for database");

    let mut attempts = 0;
    loop {
        attempts += 1;
        match probe.probe().await {
            Ok(()) => {
                tracing::info!(attempts, "database available");
                return attempts;
            },
            Err(err) => {
                tracing::warn!(
                    attempts,
                    error = %err,
                    "database unavailable, waiting {}s",
                    poll_interval.as_secs_f32()
                );
                sleep(poll_interval).await;
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    /// Fails a fixed number of times before accepting.
    struct FlakyStorage {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyStorage {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Probe for FlakyStorage {
        type Error = &'static str;

        async fn probe(&self) -> Result<(), Self::Error> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err("unavailable")
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_at_once() {
        let storage = FlakyStorage::new(0);
        let start = Instant::now();

        let attempts = wait_for_storage(&storage, Duration::from_secs(1)).await;

        assert_eq!(attempts, 1);
        assert_eq!(storage.calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_available() {
        let storage = FlakyStorage::new(5);
        let start = Instant::now();

        let attempts = wait_for_storage(&storage, Duration::from_secs(1)).await;

        assert_eq!(attempts, 6);
        assert_eq!(storage.calls.load(Ordering::SeqCst), 6);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_works_through_trait_object() {
        let storage: Box<dyn Probe<Error = &'static str>> =
            Box::new(FlakyStorage::new(2));

        let attempts =
            wait_for_storage(storage.as_ref(), Duration::from_millis(250)).await;
        assert_eq!(attempts, 3);
    }
}
