//! Inbound typing indicator with self-expiry.
//!
//! Two states, idle and typing. Each inbound signal (re)arms a single
//! deadline, so bursts extend the indicator instead of stacking timers.
//! The indicator belongs to the active conversation and is dropped with it
//! on a switch.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct TypingIndicator {
    decay: Duration,
    deadline: Option<Instant>,
}

impl TypingIndicator {
    pub fn new(decay: Duration) -> Self {
        Self {
            decay,
            deadline: None,
        }
    }

    /// Record a counterparty typing signal received at `now`.
    /// Returns `true` on the idle -> typing transition.
    pub fn arm(&mut self, now: Instant) -> bool {
        let was_typing = self.is_typing(now);
        self.deadline = Some(now + self.decay);
        !was_typing
    }

    /// Clear an elapsed deadline. Returns `true` on the typing -> idle
    /// transition.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_typing(&self, now: Instant) -> bool {
        self.deadline.map_or(false, |deadline| now < deadline)
    }

    /// When the one outstanding timer fires, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
