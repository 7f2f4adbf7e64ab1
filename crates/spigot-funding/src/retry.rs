//! Retry schedules.
//!
//! The devnet faucet's rate-limit window is small and constant, so the
//! schedule is a fixed delay rather than exponential backoff. The knobs
//! are explicit here instead of constants buried in the loops.

use std::time::Duration;

/// A fixed-schedule retry budget: `attempts` tries, `delay` between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Default schedule for airdrop requests: 3 tries, 2 s apart.
    pub const fn airdrop() -> Self {
        Self::new(3, Duration::from_secs(2))
    }

    /// Default schedule for confirmation polling: 30 polls, 2 s apart.
    pub const fn confirmation() -> Self {
        Self::new(30, Duration::from_secs(2))
    }

    /// Sleep out the inter-attempt delay.
    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
