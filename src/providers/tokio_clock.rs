//! Tokio-based clock implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::traits::Clock;

/// Production clock implementation using Tokio's sleep and the system
/// wall clock.
///
/// For testing, use [`crate::testing::FakeClock`], which fast-forwards on
/// every sleep.
///
/// # Examples
///
/// ```rust
/// use rozo_bridge::providers::TokioClock;
/// use rozo_bridge::Clock;
///
/// let clock = TokioClock::new();
/// assert!(clock.now().timestamp() > 0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TokioClock;

impl TokioClock {
    /// Creates a new Tokio clock instance.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
