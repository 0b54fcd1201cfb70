// Injected sleep primitive for retry pacing, so tests can observe the
// delays the RELEASE retry loop asks for without actually waiting.

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production clock: a thin wrapper over `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use tokio::sync::Mutex;

    /// Records every `sleep` call's argument and returns immediately,
    /// so retry-loop tests run instantly while still asserting on pacing.
    #[derive(Default)]
    pub struct MockClock {
        calls: Mutex<Vec<Duration>>,
    }

    impl MockClock {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn calls(&self) -> Vec<Duration> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl Clock for MockClock {
        async fn sleep(&self, duration: Duration) {
            self.calls.lock().await.push(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockClock;
    use super::*;

    #[tokio::test]
    async fn mock_clock_records_sleep_durations_without_waiting() {
        let clock = MockClock::new();
        clock.sleep(Duration::from_millis(250)).await;
        clock.sleep(Duration::from_millis(250)).await;
        assert_eq!(
            clock.calls().await,
            vec![Duration::from_millis(250), Duration::from_millis(250)]
        );
    }
}
