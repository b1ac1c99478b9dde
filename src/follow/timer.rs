//! Delay source for the poll loop.

use std::time::Duration;

use async_trait::async_trait;

/// Fire-once delay.
#[async_trait]
pub trait Timer: Send + Sync {
    /// Complete after `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Timer backed by `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
