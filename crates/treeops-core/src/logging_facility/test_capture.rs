//! In-memory event capture
//!
//! Installs a layer that records every event with its fields rendered as
//! text. The capture is process-wide and tests run in parallel, so
//! assertions should narrow to one call through its `request_id` (see
//! [`TestCapture::call`]) or to an operation name no other test uses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_COMPONENT, FIELD_EVENT, FIELD_OP,
    FIELD_REQUEST_ID, FIELD_SOURCE,
};

type Buffer = Arc<Mutex<Vec<CapturedEvent>>>;

/// One recorded event
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub component: Option<String>,
    pub op: Option<String>,
    pub event: Option<String>,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn from_fields(level: Level, fields: HashMap<String, String>) -> Self {
        Self {
            level,
            component: fields.get(FIELD_COMPONENT).cloned(),
            op: fields.get(FIELD_OP).cloned(),
            event: fields.get(FIELD_EVENT).cloned(),
            fields,
        }
    }

    /// Field value rendered as text
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.field(FIELD_REQUEST_ID)
    }

    pub fn is(&self, op: &str, event: &str) -> bool {
        self.op.as_deref() == Some(op) && self.event.as_deref() == Some(event)
    }

    fn is_event(&self, event: &str) -> bool {
        self.event.as_deref() == Some(event)
    }
}

/// Boundary events of one call
#[derive(Clone, Debug, Default)]
pub struct CallEvents {
    pub events: Vec<CapturedEvent>,
}

impl CallEvents {
    pub fn starts(&self) -> usize {
        self.count(EVENT_START)
    }

    pub fn ends(&self) -> usize {
        self.count(EVENT_END)
    }

    pub fn errors(&self) -> Vec<&CapturedEvent> {
        self.events
            .iter()
            .filter(|e| e.is_event(EVENT_END_ERROR))
            .collect()
    }

    /// True when every event was logged under `op`
    pub fn all_for(&self, op: &str) -> bool {
        self.events.iter().all(|e| e.op.as_deref() == Some(op))
    }

    fn count(&self, event: &str) -> usize {
        self.events.iter().filter(|e| e.is_event(event)).count()
    }
}

#[derive(Default)]
struct TextFields(HashMap<String, String>);

impl Visit for TextFields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

struct CaptureLayer {
    buffer: Buffer,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = TextFields::default();
        event.record(&mut fields);
        let captured = CapturedEvent::from_fields(*event.metadata().level(), fields.0);

        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.push(captured);
        }
    }
}

/// Shared handle on the captured events
#[derive(Clone)]
pub struct TestCapture {
    buffer: Buffer,
}

impl TestCapture {
    /// Snapshot of everything captured so far
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.buffer
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Events named `event` for `op`, in emission order
    pub fn find(&self, op: &str, event: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.is(op, event))
            .collect()
    }

    /// Every event of the call whose `start` matched `op` and `source`
    ///
    /// Returns `None` until that start event has been captured.
    pub fn call(&self, op: &str, source: &str) -> Option<CallEvents> {
        let events = self.events();
        let request_id = events
            .iter()
            .find(|e| e.is(op, EVENT_START) && e.field(FIELD_SOURCE) == Some(source))
            .and_then(|e| e.request_id())?
            .to_string();

        let events = events
            .into_iter()
            .filter(|e| e.request_id() == Some(request_id.as_str()))
            .collect();
        Some(CallEvents { events })
    }

    /// # Panics
    ///
    /// Panics when no `event` has been captured for `op`.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let captured = self.events();
        assert!(
            captured.iter().any(|e| e.is(op, event)),
            "no {}/{} event among {} captured",
            op,
            event,
            captured.len()
        );
    }
}

static CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer on first use and return the shared handle
///
/// ```
/// use treeops_core::logging_facility::test_capture::init_test_capture;
/// use treeops_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_capture_example");
/// capture.assert_event_exists("doc_capture_example", "start");
/// ```
pub fn init_test_capture() -> TestCapture {
    CAPTURE
        .get_or_init(|| {
            let buffer = Buffer::default();
            let layer = CaptureLayer {
                buffer: buffer.clone(),
            };
            let _ = tracing_subscriber::registry().with(layer).try_init();
            TestCapture { buffer }
        })
        .clone()
}
