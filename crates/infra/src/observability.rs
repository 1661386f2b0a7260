//! Env-driven logger and telemetry wiring.

use serde_json::Value;
use std::sync::Arc;
use tombstone_adapters::log_sink::{LogSink, StderrLogSink};
use tombstone_adapters::logger::JsonLogger;
use tombstone_adapters::telemetry::{JsonTelemetry, TaggedTelemetry};
use tombstone_ports::{LogFields, LogLevel, LoggerPort, TelemetryPort, TelemetryTags};
use tombstone_shared::RequestContext;

/// Env var: `json` enables structured logs on stderr.
pub const LOG_FORMAT_ENV: &str = "TOMB_LOG_FORMAT";
/// Env var: minimum log level.
pub const LOG_LEVEL_ENV: &str = "TOMB_LOG_LEVEL";
/// Env var: `json` enables telemetry lines; defaults to the log format.
pub const TELEMETRY_FORMAT_ENV: &str = "TOMB_TELEMETRY_FORMAT";

/// Process-wide observability adapters.
#[derive(Clone, Default)]
pub struct Observability {
    /// Root logger, when enabled.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Root telemetry sink, when enabled.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// Build observability from the process environment.
#[must_use]
pub fn observability_from_env() -> Observability {
    observability_from_lookup(&|key| std::env::var(key).ok(), Arc::new(StderrLogSink))
}

/// Build observability from an arbitrary variable lookup and sink.
#[must_use]
pub fn observability_from_lookup(
    lookup: &dyn Fn(&str) -> Option<String>,
    sink: Arc<dyn LogSink>,
) -> Observability {
    let is_json =
        |key: &str| lookup(key).is_some_and(|value| value.trim().eq_ignore_ascii_case("json"));
    let log_enabled = is_json(LOG_FORMAT_ENV);
    let telemetry_enabled = lookup(TELEMETRY_FORMAT_ENV)
        .map_or(log_enabled, |value| value.trim().eq_ignore_ascii_case("json"));

    if !log_enabled && !telemetry_enabled {
        return Observability::default();
    }

    let logger: Option<Arc<dyn LoggerPort>> = if log_enabled {
        let level = lookup(LOG_LEVEL_ENV)
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or(LogLevel::Info);
        Some(Arc::new(JsonLogger::new(Arc::clone(&sink)).with_min_level(level)))
    } else {
        None
    };
    let telemetry: Option<Arc<dyn TelemetryPort>> = if telemetry_enabled {
        Some(Arc::new(JsonTelemetry::new(Arc::clone(&sink))))
    } else {
        None
    };

    Observability { logger, telemetry }
}

/// Child logger carrying the request correlation id.
pub fn scope_logger(
    logger: Option<&Arc<dyn LoggerPort>>,
    ctx: &RequestContext,
) -> Option<Arc<dyn LoggerPort>> {
    let logger = logger?;
    let mut fields = LogFields::new();
    fields.insert(
        "correlationId".to_owned().into_boxed_str(),
        Value::String(ctx.correlation_id().as_str().to_string()),
    );
    Some(Arc::from(logger.child(fields)))
}

/// Telemetry wrapper tagging every metric with the request correlation id.
pub fn scope_telemetry(
    telemetry: Option<&Arc<dyn TelemetryPort>>,
    ctx: &RequestContext,
) -> Option<Arc<dyn TelemetryPort>> {
    let telemetry = telemetry?;
    let mut tags = TelemetryTags::new();
    tags.insert(
        "correlationId".to_owned().into_boxed_str(),
        ctx.correlation_id().as_str().to_string().into_boxed_str(),
    );
    Some(Arc::new(TaggedTelemetry::new(Arc::clone(telemetry), tags)))
}
