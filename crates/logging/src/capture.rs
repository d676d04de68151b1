//! Record rendered tracing events in memory.
//!
//! Install [`CaptureLayer`] in a subscriber (usually with
//! `tracing::subscriber::set_default` inside a test) and inspect what was
//! logged through the paired [`Captured`] handle:
//!
//! ```
//! use tracing_subscriber::{layer::SubscriberExt, registry};
//!
//! let (layer, captured) = logging::capture::layer();
//! let _guard = tracing::subscriber::set_default(registry().with(layer));
//! tracing::warn!(target: "domkey", "target not found");
//! assert!(captured.contains("target not found"));
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::fmt::{self, RenderedLog};

/// Shared view of the events recorded by a [`CaptureLayer`].
#[derive(Clone, Default)]
pub struct Captured {
    /// Events in the order they were recorded.
    events: Arc<Mutex<Vec<RenderedLog>>>,
}

impl Captured {
    /// Snapshot of every recorded event.
    pub fn events(&self) -> Vec<RenderedLog> {
        self.events.lock().clone()
    }

    /// Messages of events logged under `target`.
    pub fn messages_for(&self, target: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.target == target)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Whether any event message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.events.lock().iter().any(|e| e.message.contains(needle))
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// Tracing layer that renders every event into a [`Captured`] buffer.
pub struct CaptureLayer {
    /// Destination buffer.
    sink: Captured,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let rendered = fmt::render_event(event);
        self.sink.events.lock().push(rendered);
    }
}

/// Create a capture layer and the handle used to read what it records.
pub fn layer() -> (CaptureLayer, Captured) {
    let captured = Captured::default();
    (
        CaptureLayer {
            sink: captured.clone(),
        },
        captured,
    )
}
