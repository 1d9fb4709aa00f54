use std::time::Duration;

/// Capped exponential backoff between reconnect attempts.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl ReconnectPolicy {
    pub fn new(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
        }
    }

    /// Delay before reconnect attempt `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.min(20);
        let calculated = self.base_delay_ms.saturating_mul(1_u64 << shift);
        Duration::from_millis(calculated.min(self.max_delay_ms))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(500, 30_000)
    }
}
