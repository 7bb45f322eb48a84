//! Distributed-trace correlation attached to trace-channel lines

use std::collections::HashMap;

/// Text written in place of the correlation prefix when no usable context is given
pub const MISSING_CONTEXT: &str = "span or tracer context is missing, please check it.";

/// Correlation data for one finished span
#[derive(Debug, Clone, PartialEq)]
pub struct TraceContext {
    pub trace_id: String,
    pub span_id: String,
    /// Empty for root spans
    pub parent_span_id: String,
    /// Span start, seconds since the Unix epoch
    pub start_time: f64,
    /// Span duration in seconds
    pub duration: f64,
}

impl TraceContext {
    /// Create a context for a root span
    pub fn new(trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            parent_span_id: String::new(),
            start_time: 0.0,
            duration: 0.0,
        }
    }

    /// Set the parent span id
    pub fn with_parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = parent_span_id.into();
        self
    }

    /// Set the span timing
    pub fn with_timing(mut self, start_time: f64, duration: f64) -> Self {
        self.start_time = start_time;
        self.duration = duration;
        self
    }

    /// Build a context from a text-map carrier
    ///
    /// Expects `ot-tracer-traceid` and `ot-tracer-spanid`; `ot-parent-spanid`
    /// is optional; `ot-starttime` and `ot-duration` must parse as numbers when
    /// present. Returns `None` when the carrier does not describe a span.
    pub fn from_carrier(carrier: &HashMap<String, String>) -> Option<Self> {
        let trace_id = carrier.get("ot-tracer-traceid")?;
        let span_id = carrier.get("ot-tracer-spanid")?;
        let parse_secs = |key: &str| match carrier.get(key) {
            Some(value) => value.trim().parse::<f64>().ok(),
            None => Some(0.0),
        };

        let context = Self {
            trace_id: trace_id.clone(),
            span_id: span_id.clone(),
            parent_span_id: carrier.get("ot-parent-spanid").cloned().unwrap_or_default(),
            start_time: parse_secs("ot-starttime")?,
            duration: parse_secs("ot-duration")?,
        };
        context.is_complete().then_some(context)
    }

    /// Whether the ids needed to correlate the line are present
    pub fn is_complete(&self) -> bool {
        !self.trace_id.is_empty() && !self.span_id.is_empty()
    }

    /// Render the `ot-*` prefix, including the trailing space
    pub fn prefix(&self) -> String {
        format!(
            "ot-traceid:{} ot-parent-spanid:{} ot-spanid:{} ot-starttime:{} ot-duration:{} ",
            self.trace_id, self.parent_span_id, self.span_id, self.start_time, self.duration
        )
    }
}

/// Build the trace-channel message body
///
/// A missing or incomplete context is replaced by [`MISSING_CONTEXT`] rather
/// than silently dropped.
pub fn trace_message(context: Option<&TraceContext>, message: &str) -> String {
    match context.filter(|c| c.is_complete()) {
        Some(context) => format!("{}{}", context.prefix(), message),
        None => format!("{MISSING_CONTEXT} {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_prefix_layout() {
        let ctx = TraceContext::new("12345678", "11111111")
            .with_parent("22222222")
            .with_timing(1234.5, 0.25);
        assert_eq!(
            trace_message(Some(&ctx), "handled"),
            "ot-traceid:12345678 ot-parent-spanid:22222222 ot-spanid:11111111 \
             ot-starttime:1234.5 ot-duration:0.25 handled"
        );
    }

    #[test]
    fn test_missing_context_placeholder() {
        assert_eq!(
            trace_message(None, "handled"),
            format!("{MISSING_CONTEXT} handled")
        );
    }

    #[test]
    fn test_incomplete_context_is_treated_as_missing() {
        let ctx = TraceContext::new("", "11111111");
        assert_eq!(
            trace_message(Some(&ctx), "handled"),
            format!("{MISSING_CONTEXT} handled")
        );
    }

    #[test]
    fn test_from_carrier() {
        let ctx = TraceContext::from_carrier(&carrier(&[
            ("ot-tracer-traceid", "abc"),
            ("ot-tracer-spanid", "def"),
            ("ot-starttime", "10.5"),
            ("ot-duration", "2"),
        ]))
        .unwrap();
        assert_eq!(ctx.trace_id, "abc");
        assert_eq!(ctx.span_id, "def");
        assert_eq!(ctx.parent_span_id, "");
        assert_eq!(ctx.start_time, 10.5);
        assert_eq!(ctx.duration, 2.0);
    }

    #[test]
    fn test_from_carrier_malformed() {
        assert!(TraceContext::from_carrier(&carrier(&[("ot-tracer-traceid", "abc")])).is_none());
        assert!(TraceContext::from_carrier(&carrier(&[
            ("ot-tracer-traceid", "abc"),
            ("ot-tracer-spanid", "def"),
            ("ot-duration", "soon"),
        ]))
        .is_none());
    }
}
