//! Tracing layer routing events to the handlers of the current test.
use std::sync::Arc;
use std::time::Instant;

use super::formatter::Record;
use super::handler::Handler;
use crate::level::Level;

/// Target prefix of this crate's own diagnostics; never routed to handlers.
const OWN_TARGET: &str = "testlogger";

/// Extracts the `message` field and the remaining fields from a
/// [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .push((field.name().to_string(), format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }
}

/// A [`tracing_subscriber::Layer`] delivering each event to every handler
/// whose logger matches the event target and whose threshold it passes.
#[derive(Debug)]
pub(crate) struct HandlerLayer {
    handlers: Arc<[Handler]>,
    base_level: Level,
}

impl HandlerLayer {
    /// Layer over `handlers`; `base_level` applies to every logger.
    pub(crate) const fn new(handlers: Arc<[Handler]>, base_level: Level) -> Self {
        Self {
            handlers,
            base_level,
        }
    }

    /// Build a dispatcher running only this layer.
    pub(crate) fn into_dispatch(self) -> tracing::Dispatch {
        use tracing_subscriber::layer::SubscriberExt as _;
        tracing::Dispatch::new(tracing_subscriber::registry().with(self))
    }
}

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for HandlerLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let target = metadata.target();
        if is_own_target(target) {
            return;
        }
        let level = Level::from(*metadata.level());
        let mut interested = self
            .handlers
            .iter()
            .filter(|h| h.matches(target) && level >= h.threshold(self.base_level))
            .peekable();
        if interested.peek().is_none() {
            return;
        }

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let record = Record {
            level,
            target,
            message: &extractor.message,
            fields: &extractor.fields,
            created: Instant::now(),
        };
        for handler in interested {
            // Events raised here would be swallowed by the dispatcher, so the
            // error is kept until the handler is closed.
            if let Err(e) = handler.emit(&record) {
                handler.record_failure(e);
            }
        }
    }
}
