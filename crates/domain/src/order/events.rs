use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sales_store::OrderId;

use crate::events::{DomainEvent, DomainEventHandler, HandlerError};
use crate::mail::{MailMessage, Mailer};

/// Raised after an order satisfying the special-order policy commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialOrderCreatedEvent {
    pub order_id: OrderId,
    pub line_count: usize,
}

impl SpecialOrderCreatedEvent {
    pub fn new(order_id: OrderId, line_count: usize) -> Self {
        Self {
            order_id,
            line_count,
        }
    }
}

impl DomainEvent for SpecialOrderCreatedEvent {
    fn event_type(&self) -> &'static str {
        "SpecialOrderCreated"
    }
}

/// Notifies the sales desk about special orders.
pub struct SendEmailWhenSpecialOrderCreated {
    mailer: Arc<dyn Mailer>,
    recipient: String,
}

impl SendEmailWhenSpecialOrderCreated {
    pub fn new(mailer: Arc<dyn Mailer>, recipient: impl Into<String>) -> Self {
        Self {
            mailer,
            recipient: recipient.into(),
        }
    }
}

#[async_trait]
impl DomainEventHandler<SpecialOrderCreatedEvent> for SendEmailWhenSpecialOrderCreated {
    fn name(&self) -> &'static str {
        "SendEmailWhenSpecialOrderCreated"
    }

    async fn handle(&self, event: &SpecialOrderCreatedEvent) -> Result<(), HandlerError> {
        let message = MailMessage {
            to: self.recipient.clone(),
            subject: "Special order created".to_string(),
            body: format!(
                "Order {} was placed with {} lines.",
                event.order_id, event.line_count
            ),
        };
        self.mailer.send(message).await?;
        Ok(())
    }
}
