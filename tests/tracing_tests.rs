#![forbid(unsafe_code)]

//! Tracing integration tests.
//!
//! These tests verify that span and event instrumentation in the boundary
//! render path works correctly.
//!
//! Boundary spans enabled:
//!   cargo test --features tracing --test tracing_tests
//!
//! Zero-overhead verification (no feature):
//!   cargo test --test tracing_tests -- zero_overhead

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use tui_bulwark::ErrorBoundary;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// A captured span with its metadata.
#[derive(Debug, Clone)]
#[allow(dead_code)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

/// A captured event with its level and fields (the human message lands in
/// the `message` field).
#[derive(Debug, Clone)]
#[allow(dead_code)]
struct CapturedEvent {
    level: tracing::Level,
    fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn message(&self) -> Option<&str> {
        self.fields.get("message").map(String::as_str)
    }
}

/// A tracing Layer that captures spans and events.
struct TraceCapture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TraceCapture {
    fn new() -> (Self, CaptureHandle) {
        let spans = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(Mutex::new(Vec::new()));

        let handle = CaptureHandle {
            spans: spans.clone(),
            events: events.clone(),
        };

        let layer = Self { spans, events };

        (layer, handle)
    }
}

/// Handle to read captured spans and events after rendering.
struct CaptureHandle {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureHandle {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    fn events_with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.message() == Some(message))
            .collect()
    }
}

/// Visitor that extracts span and event fields.
struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0
            .push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for TraceCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);

        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);

        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

/// Set up a tracing subscriber with trace capture and run a closure.
fn with_captured_trace<F>(f: F) -> CaptureHandle
where
    F: FnOnce(),
{
    let (layer, handle) = TraceCapture::new();
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    handle
}

// ============================================================================
// Unit Tests
// ============================================================================

/// Verify that a boundary render emits a widget span with area fields.
///
/// Tests: boundary_render_emits_widget_span
#[test]
#[cfg(feature = "tracing")]
fn boundary_render_emits_widget_span() {
    let handle = with_captured_trace(|| {
        let area = Rect::new(5, 10, 30, 15);
        let mut buf = Buffer::empty(Rect::new(0, 0, 40, 30));
        let mut boundary = ErrorBoundary::new("traced-panel");

        boundary.render(area, &mut buf, |_, _| {});
    });

    let spans = handle.spans();
    let span = spans
        .iter()
        .find(|s| s.name == "widget_render")
        .expect("should have a widget_render span");

    assert_eq!(
        span.fields.get("widget").map(String::as_str),
        Some("ErrorBoundary")
    );
    assert_eq!(
        span.fields.get("source").map(String::as_str),
        Some("traced-panel")
    );
    assert_eq!(span.fields.get("x").map(String::as_str), Some("5"));
    assert_eq!(span.fields.get("y").map(String::as_str), Some("10"));
    assert_eq!(span.fields.get("w").map(String::as_str), Some("30"));
    assert_eq!(span.fields.get("h").map(String::as_str), Some("15"));
}

/// Verify that capturing a panic emits an error-level event.
///
/// Tests: capture_emits_error_event
#[test]
#[cfg(feature = "tracing")]
fn capture_emits_error_event() {
    let handle = with_captured_trace(|| {
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        let mut boundary = ErrorBoundary::new("traced-panel");

        boundary.render(area, &mut buf, |_, _| panic!("instrumented failure"));
    });

    let captures = handle.events_with_message("captured child failure");
    assert_eq!(captures.len(), 1, "capture should be logged exactly once");

    let event = &captures[0];
    assert_eq!(event.level, tracing::Level::ERROR);
    assert_eq!(
        event.fields.get("source").map(String::as_str),
        Some("traced-panel")
    );
    assert_eq!(
        event.fields.get("mode").map(String::as_str),
        Some("full-page")
    );
    assert_eq!(
        event.fields.get("fault").map(String::as_str),
        Some("instrumented failure")
    );
    assert_eq!(event.fields.get("phase").map(String::as_str), Some("Render"));
}

/// Verify that a sticky fault does not log again on later frames.
///
/// Tests: latched_frames_do_not_relog
#[test]
#[cfg(feature = "tracing")]
fn latched_frames_do_not_relog() {
    let handle = with_captured_trace(|| {
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        let mut boundary = ErrorBoundary::new("traced-panel");

        boundary.render(area, &mut buf, |_, _| panic!("once"));
        boundary.render(area, &mut buf, |_, _| panic!("never runs"));
        boundary.render(area, &mut buf, |_, _| panic!("never runs"));
    });

    let captures = handle.events_with_message("captured child failure");
    assert_eq!(captures.len(), 1);

    // Every frame still opens a render span.
    let spans = handle.spans();
    let render_spans = spans.iter().filter(|s| s.name == "widget_render").count();
    assert_eq!(render_spans, 3);
}

/// Verify that resets log their reason.
///
/// Tests: reset_emits_debug_event_with_reason
#[test]
#[cfg(feature = "tracing")]
fn reset_emits_debug_event_with_reason() {
    let handle = with_captured_trace(|| {
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        let mut boundary = ErrorBoundary::new("traced-panel").reset_keys([1]);

        boundary.render(area, &mut buf, |_, _| panic!("down"));
        boundary.reset();

        boundary.render(area, &mut buf, |_, _| panic!("down again"));
        boundary.set_reset_keys([2]);
    });

    let resets = handle.events_with_message("boundary reset");
    assert_eq!(resets.len(), 2);
    assert_eq!(resets[0].level, tracing::Level::DEBUG);
    assert_eq!(
        resets[0].fields.get("reason").map(String::as_str),
        Some("imperative-api")
    );
    assert_eq!(
        resets[1].fields.get("reason").map(String::as_str),
        Some("keys")
    );
}

/// Verify that reporter parking and routing are logged.
///
/// Tests: reporter_paths_are_logged
#[test]
#[cfg(feature = "tracing")]
fn reporter_paths_are_logged() {
    let handle = with_captured_trace(|| {
        let boundary = ErrorBoundary::new("traced-panel");
        let reporter = boundary.reporter();

        // No render yet, so the report parks.
        reporter.report("background failure");
    });

    let parked = handle.events_with_message("parking reported fault for next render");
    assert_eq!(parked.len(), 1);
    assert_eq!(
        parked[0].fields.get("fault").map(String::as_str),
        Some("background failure")
    );
}

/// Verify zero overhead when the tracing feature is disabled.
///
/// Tests: zero_overhead_when_disabled
///
/// When compiled WITHOUT `--features tracing`, the `#[cfg(feature = "tracing")]`
/// blocks are entirely removed by the compiler. This test verifies that no
/// spans or events appear in that case.
#[test]
fn zero_overhead_when_disabled() {
    let handle = with_captured_trace(|| {
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        let mut boundary = ErrorBoundary::new("traced-panel");

        boundary.render(area, &mut buf, |_, _| {});
        boundary.render(area, &mut buf, |_, _| panic!("captured quietly"));
        boundary.reset();
    });

    let spans = handle.spans();
    let widget_spans: Vec<_> = spans.iter().filter(|s| s.name == "widget_render").collect();

    #[cfg(feature = "tracing")]
    {
        assert!(
            !widget_spans.is_empty(),
            "With tracing feature, widget_render spans should be present"
        );
        assert!(!handle.events().is_empty());
    }

    #[cfg(not(feature = "tracing"))]
    {
        assert!(
            widget_spans.is_empty(),
            "Without tracing feature, no widget_render spans should exist (got {})",
            widget_spans.len()
        );
        assert!(
            handle.events().is_empty(),
            "Without tracing feature, no events should be emitted"
        );
    }
}
