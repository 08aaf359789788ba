use tokio::time::{Duration, Instant};

use crate::core::display_label;

/// User-visible confirmation surface
pub trait Notifier: Send + Sync {
    fn notify(&self, quality: &str);
}

/// Writes the confirmation to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, quality: &str) {
        tracing::info!("Quality set to {}", display_label(quality));
    }
}

/// At most one firing per window
#[derive(Debug, Clone)]
pub struct Cooldown {
    window: Duration,
    last: Option<Instant>,
}

impl Cooldown {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Claim the slot at `now`; false while the previous firing is too recent
    pub fn try_fire(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last
            && now.duration_since(last) < self.window
        {
            return false;
        }
        self.last = Some(now);
        true
    }
}
