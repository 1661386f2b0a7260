//! Telemetry boundary contract (counters + timers).

use std::collections::BTreeMap;

/// Telemetry tags. Keep tags low-cardinality.
pub type TelemetryTags = BTreeMap<Box<str>, Box<str>>;

/// Metric names emitted by the deletion use cases.
pub mod metric_names {
    /// Tombstones durably written to the history store.
    pub const TOMBSTONE_WRITTEN: &str = "tombstone.written";
    /// Items physically removed.
    pub const ITEM_REMOVED: &str = "delete.item.removed";
    /// Items already gone when their turn came.
    pub const ITEM_ABSENT: &str = "delete.item.absent";
    /// Items that failed.
    pub const ITEM_FAILED: &str = "delete.item.failed";
    /// Sync trigger requests.
    pub const SYNC_TRIGGERED: &str = "sync.triggered";
    /// Whole-selection timer.
    pub const SELECTION_TIMER: &str = "delete.selection";
}

/// Timer handle.
pub trait TelemetryTimer: Send + Sync {
    /// Stop the timer and record its duration.
    fn stop(&self);
}

/// Boundary contract for telemetry (metrics + timings).
pub trait TelemetryPort: Send + Sync {
    /// Increment a counter by `value`.
    fn increment_counter(&self, name: &str, value: u64, tags: Option<&TelemetryTags>);

    /// Record a duration in milliseconds.
    fn record_timer_ms(&self, name: &str, duration_ms: u64, tags: Option<&TelemetryTags>);

    /// Start a timer and return a handle that records on `stop()`.
    fn start_timer(&self, name: &str, tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer>;
}
