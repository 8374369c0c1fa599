//! Provides a [`tracing_subscriber::Layer`] ([`LoggerLayer`]) forwarding `tracing` events
//! through a [`Logger`].

use std::{ops::Deref, sync::Arc};

use tracing::{Event, Subscriber};
use tracing_subscriber::{layer::Context, Layer};

use super::{storage::EventStorage, Logger, Severity};

/// A [`tracing_subscriber::Layer`] writing `tracing` events through a [`Logger`].
///
/// The event's `message` field becomes the record's message (the event target is used when the
/// event has no message), and every other field becomes a record field. `TRACE` events are
/// emitted at [`Severity::Debug`]. Events never carry the fatal or panic severities, so the layer
/// never exits or panics.
///
/// ```
/// use std::sync::Arc;
///
/// use log_facade::{Logger, LoggerLayer};
/// use tracing_subscriber::layer::SubscriberExt;
///
/// let logger = Arc::new(Logger::new_default()?);
/// let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(Arc::clone(&logger)));
///
/// tracing::subscriber::with_default(subscriber, || {
///     tracing::info!(port = 8080, "listening");
/// });
/// # Ok::<(), log_facade::LoggerError>(())
/// ```
///
/// The process-wide logger can be used as well, with `LoggerLayer::new(log_facade::global())`.
#[derive(Clone, Debug)]
pub struct LoggerLayer<L = Arc<Logger>> {
    logger: L,
}

impl<L> LoggerLayer<L>
where
    L: Deref<Target = Logger>,
{
    /// Creates a layer writing through `logger`.
    pub fn new(logger: L) -> Self {
        Self { logger }
    }
}

impl<S, L> Layer<S> for LoggerLayer<L>
where
    S: Subscriber,
    L: Deref<Target = Logger> + Send + Sync + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let severity = Severity::from(event.metadata().level());
        if !self.logger.is_enabled(severity) {
            return;
        }

        let mut storage = EventStorage::default();
        event.record(&mut storage);

        let (message, fields) = storage.into_parts();
        let message = message.unwrap_or_else(|| event.metadata().target().to_owned());

        if fields.is_empty() {
            self.logger.log(severity, message);
        } else {
            self.logger.log_with_fields(severity, &fields, message);
        }
    }
}
