//! Log-correlation context.
//!
//! Route processing runs on engine worker threads that share nothing with
//! the thread that built the device. Instead of an implicit per-thread map,
//! the correlation fields travel as a `CorrelationContext` value:
//!
//! 1. The device owns a base context (`device=...`)
//! 2. The fault hook calls `capture_current` at the point of catch, adding the
//!    route, exchange, worker thread and active trace ids
//! 3. The captured value is moved into the fault record and entered as a span
//!    wherever the fault is logged
//!
//! ## Example
//!
//! ```rust,ignore
//! let base = CorrelationContext::new().with(DEVICE_KEY, "test/route/1");
//! let captured = base
//!     .capture_current()
//!     .with(ROUTE_KEY, "orders")
//!     .with(EXCHANGE_KEY, exchange_id.to_string());
//!
//! let _entered = captured.span("report_fault").entered();
//! tracing::error!("route fault captured");
//! ```

use opentelemetry::trace::{SpanContext, TraceContextExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Device name key.
pub const DEVICE_KEY: &str = "device";
/// Route id key.
pub const ROUTE_KEY: &str = "route_id";
/// Exchange id key.
pub const EXCHANGE_KEY: &str = "exchange_id";
/// Worker thread key.
pub const THREAD_KEY: &str = "thread";
/// OpenTelemetry trace id key.
pub const TRACE_ID_KEY: &str = "trace_id";
/// OpenTelemetry span id key.
pub const SPAN_ID_KEY: &str = "span_id";

/// Ordered key/value map describing where something happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationContext {
    entries: BTreeMap<String, String>,
}

impl CorrelationContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Copy every entry of `other` into this context, replacing existing keys.
    pub fn merge(&mut self, other: &CorrelationContext) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy this context and add what is only known on the current thread:
    /// the thread itself and the active trace, if any.
    pub fn capture_current(&self) -> Self {
        let mut captured = self.clone();

        let thread = std::thread::current();
        let thread_label = match thread.name() {
            Some(name) => name.to_string(),
            None => format!("{:?}", thread.id()),
        };
        captured.insert(THREAD_KEY, thread_label);

        let trace = TraceContext::extract_current().to_propagated();
        if trace.is_valid() {
            captured.insert(TRACE_ID_KEY, trace.trace_id);
            captured.insert(SPAN_ID_KEY, trace.span_id);
        }

        captured
    }

    /// Create a span carrying this context.
    ///
    /// `tracing` needs field names at compile time, so the well-known keys get
    /// their own fields and the full map is rendered into `correlation`.
    pub fn span(&self, operation: &str) -> tracing::Span {
        tracing::info_span!(
            "correlated",
            operation = %operation,
            device = self.get(DEVICE_KEY).unwrap_or(""),
            route_id = self.get(ROUTE_KEY).unwrap_or(""),
            exchange_id = self.get(EXCHANGE_KEY).unwrap_or(""),
            correlation = %self,
        )
    }
}

impl fmt::Display for CorrelationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.entries {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for CorrelationContext
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Self::new();
        for (key, value) in iter {
            context.insert(key, value);
        }
        context
    }
}

/// Trace context that can be serialized and sent across threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagatedContext {
    /// Trace ID (32 hex characters)
    pub trace_id: String,
    /// Parent span ID (16 hex characters)
    pub span_id: String,
    /// Trace flags (sampled, etc.)
    pub trace_flags: u8,
}

impl PropagatedContext {
    /// Create an empty context (no parent trace)
    pub fn empty() -> Self {
        Self {
            trace_id: "00000000000000000000000000000000".to_string(),
            span_id: "0000000000000000".to_string(),
            trace_flags: 0,
        }
    }

    /// Check if this context is valid (has a real trace)
    pub fn is_valid(&self) -> bool {
        !self.trace_id.chars().all(|c| c == '0')
    }
}

/// Wrapper for the OpenTelemetry span context of the active `tracing` span.
pub struct TraceContext {
    span_context: Option<SpanContext>,
}

impl TraceContext {
    /// Create a new empty trace context.
    pub fn new() -> Self {
        Self { span_context: None }
    }

    /// Extract the trace context from the current `tracing` span.
    ///
    /// Only yields a valid context when the OpenTelemetry layer is installed.
    pub fn extract_current() -> Self {
        let context = tracing::Span::current().context();
        let span_context = context.span().span_context().clone();

        Self {
            span_context: if span_context.is_valid() {
                Some(span_context)
            } else {
                None
            },
        }
    }

    /// Convert to a propagatable format.
    pub fn to_propagated(&self) -> PropagatedContext {
        match &self.span_context {
            Some(ctx) if ctx.is_valid() => PropagatedContext {
                trace_id: ctx.trace_id().to_string(),
                span_id: ctx.span_id().to_string(),
                trace_flags: ctx.trace_flags().to_u8(),
            },
            _ => PropagatedContext::empty(),
        }
    }

    /// Check if this context has a valid trace.
    pub fn is_valid(&self) -> bool {
        self.span_context
            .as_ref()
            .map(|c| c.is_valid())
            .unwrap_or(false)
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context() {
        let ctx = PropagatedContext::empty();
        assert!(!ctx.is_valid());
    }

    #[test]
    fn test_extract_current_empty() {
        // No subscriber with an OpenTelemetry layer, so nothing to extract
        let ctx = TraceContext::extract_current();
        assert!(!ctx.is_valid());
        assert_eq!(ctx.to_propagated(), PropagatedContext::empty());
    }

    #[test]
    fn test_display_is_key_ordered() {
        let ctx = CorrelationContext::new()
            .with(ROUTE_KEY, "orders")
            .with(DEVICE_KEY, "test/route/1");
        assert_eq!(ctx.to_string(), "device=test/route/1 route_id=orders");
    }

    #[test]
    fn test_merge_replaces_existing_keys() {
        let mut base = CorrelationContext::new()
            .with(DEVICE_KEY, "a")
            .with(ROUTE_KEY, "r1");
        let other: CorrelationContext = [(ROUTE_KEY, "r2"), (EXCHANGE_KEY, "x")]
            .into_iter()
            .collect();

        base.merge(&other);

        assert_eq!(base.get(DEVICE_KEY), Some("a"));
        assert_eq!(base.get(ROUTE_KEY), Some("r2"));
        assert_eq!(base.get(EXCHANGE_KEY), Some("x"));
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn test_capture_current_records_worker_thread() {
        let base = CorrelationContext::new().with(DEVICE_KEY, "test/route/1");

        let captured = std::thread::Builder::new()
            .name("route-worker-7".to_string())
            .spawn(move || base.capture_current())
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(captured.get(THREAD_KEY), Some("route-worker-7"));
        assert_eq!(captured.get(DEVICE_KEY), Some("test/route/1"));
        assert!(captured.get(TRACE_ID_KEY).is_none());
    }

    #[test]
    fn test_serde_roundtrip_keeps_entries() {
        let ctx = CorrelationContext::new().with(DEVICE_KEY, "d");
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("\"device\":\"d\""));
    }
}
