//! Notification and clock adapters.

use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tombstone_ports::{ClockPort, NotifierPort};

/// Collects notices so the caller can render them with its output.
#[derive(Debug, Default)]
pub struct BufferedNotifier {
    messages: Mutex<Vec<String>>,
}

impl BufferedNotifier {
    /// Build an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain collected notices in emission order.
    pub fn take(&self) -> Vec<String> {
        let mut guard = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }
}

impl NotifierPort for BufferedNotifier {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_owned());
    }
}

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|duration| i64::try_from(duration.as_millis()).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_notifier_drains_in_order() {
        let notifier = BufferedNotifier::new();
        notifier.notify("File a.md deleted.");
        notifier.notify("File b/ deleted.");

        assert_eq!(notifier.take(), ["File a.md deleted.", "File b/ deleted."]);
        assert!(notifier.take().is_empty());
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
