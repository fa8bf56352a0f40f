//! Typing indicator state
//!
//! Local timer state for the "participant is typing" affordance. Starting
//! re-arms a deadline; the indicator reports active until the deadline
//! passes or it is stopped. No background task is spawned.

use std::time::Duration;

use tokio::time::Instant;

/// Default time a typing indicator stays active after the last keystroke
pub const DEFAULT_TYPING_DURATION: Duration = Duration::from_secs(3);

/// Deadline-based typing indicator
#[derive(Debug, Clone)]
pub struct TypingIndicator {
    duration: Duration,
    deadline: Option<Instant>,
}

impl TypingIndicator {
    /// Create an indicator with the given active duration
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: None,
        }
    }

    /// Record a keystroke, re-arming the deadline
    pub fn start(&mut self) {
        self.deadline = Some(Instant::now() + self.duration);
    }

    /// Deactivate immediately
    pub fn stop(&mut self) {
        self.deadline = None;
    }

    /// Whether the indicator is currently active
    pub fn is_typing(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() < deadline)
    }
}

impl Default for TypingIndicator {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_DURATION)
    }
}
