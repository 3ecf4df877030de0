//! In-process domain event publishing.
//!
//! Events are raised by a use case strictly after its transaction commits.
//! Handlers run one after another in registration order; a failing handler
//! is logged and counted and never reaches the caller.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::mail::MailError;

/// Marker for facts raised after a committed state change.
pub trait DomainEvent: std::fmt::Debug + Send + Sync + 'static {
    /// Returns the event type name, used in logs.
    fn event_type(&self) -> &'static str;
}

/// Errors a handler can report.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("mail delivery failed: {0}")]
    Mail(#[from] MailError),

    #[error("{0}")]
    Other(String),
}

/// Reacts to one event type.
#[async_trait]
pub trait DomainEventHandler<E: DomainEvent>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &E) -> Result<(), HandlerError>;
}

/// Outcome of one [`DomainEventHub::raise`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaiseOutcome {
    pub handled: usize,
    pub failed: usize,
}

/// Handlers registered for one event type.
pub struct DomainEventHub<E: DomainEvent> {
    handlers: Vec<Arc<dyn DomainEventHandler<E>>>,
}

impl<E: DomainEvent> Default for DomainEventHub<E> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<E: DomainEvent> DomainEventHub<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler, builder style.
    pub fn with(mut self, handler: impl DomainEventHandler<E> + 'static) -> Self {
        self.register(Arc::new(handler));
        self
    }

    /// Appends a handler.
    pub fn register(&mut self, handler: Arc<dyn DomainEventHandler<E>>) {
        self.handlers.push(handler);
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Delivers `event` to every handler in registration order.
    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type()))]
    pub async fn raise(&self, event: E) -> RaiseOutcome {
        let mut outcome = RaiseOutcome::default();

        for handler in &self.handlers {
            match handler.handle(&event).await {
                Ok(()) => outcome.handled += 1,
                Err(e) => {
                    tracing::error!(handler = handler.name(), error = %e, "event handler failed");
                    metrics::counter!("domain_event_handler_failures_total").increment(1);
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }
}
