//! User notification and clock boundary contracts.

/// Fire-and-forget user-facing messages.
pub trait NotifierPort: Send + Sync {
    /// Show a message.
    fn notify(&self, message: &str);
}

/// Wall-clock source for `actionWhen`.
pub trait ClockPort: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}
