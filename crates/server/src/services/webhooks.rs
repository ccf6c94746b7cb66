//! Payment webhook reconciliation.
//!
//! Flow for one delivery:
//!
//! 1. Verify the signature over the raw body. Failure is the only error the
//!    gateway ever sees.
//! 2. Skip events whose id is already recorded.
//! 3. Apply `payment_intent.succeeded` / `payment_intent.payment_failed` to
//!    the order holding that intent, through a status compare-and-set.
//! 4. Record the event id, then acknowledge.
//!
//! Two concurrent deliveries of one event can both pass step 2. Both then
//! race on the same compare-and-set, so the order changes at most once.

use darkroom_core::{PaymentIntentId, PaymentStatus, WebhookEventId};
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use super::ServiceError;
use crate::db::{Clock, Repositories};
use crate::payments::WebhookVerifier;

const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

/// What a delivery did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Event id already processed.
    Duplicate,
    /// An order's payment status changed.
    Applied,
    /// The order exists but was already in a state the event cannot move.
    Unchanged,
    /// No order carries the event's payment intent.
    NoMatchingOrder,
    /// Event type this store does not act on, or an unreadable payload.
    Ignored,
    /// Processing failed after verification. The delivery is still
    /// acknowledged and the event id stays unrecorded, so a manual resend
    /// from the gateway is processed afresh.
    Failed,
}

#[derive(Debug, Deserialize)]
struct GatewayEvent {
    id: WebhookEventId,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: EventData,
}

#[derive(Debug, Default, Deserialize)]
struct EventData {
    #[serde(default)]
    object: EventObject,
}

#[derive(Debug, Default, Deserialize)]
struct EventObject {
    id: Option<PaymentIntentId>,
}

/// Reconciles gateway events with stored orders.
pub struct WebhookService<'a> {
    repos: &'a Repositories,
    verifier: &'a WebhookVerifier,
    clock: &'a dyn Clock,
}

impl<'a> WebhookService<'a> {
    #[must_use]
    pub const fn new(
        repos: &'a Repositories,
        verifier: &'a WebhookVerifier,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            repos,
            verifier,
            clock,
        }
    }

    /// Verify and process one delivery.
    ///
    /// `payload` must be the request body exactly as received.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidSignature` if verification fails.
    /// Nothing is read or written in that case. Every other failure is
    /// logged and reported as [`WebhookOutcome::Failed`].
    #[instrument(skip_all, fields(event_id = tracing::field::Empty))]
    pub async fn handle(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, ServiceError> {
        self.verifier.verify(payload, signature, self.clock.now())?;

        let event: GatewayEvent = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Signed webhook payload is not a readable event");
                return Ok(WebhookOutcome::Ignored);
            }
        };
        tracing::Span::current().record("event_id", event.id.as_str());

        match self.process(&event).await {
            Ok(outcome) => {
                debug!(event_type = %event.event_type, ?outcome, "Webhook processed");
                Ok(outcome)
            }
            Err(e) => {
                error!(error = %e, event_type = %event.event_type, "Webhook processing failed");
                Ok(WebhookOutcome::Failed)
            }
        }
    }

    async fn process(&self, event: &GatewayEvent) -> Result<WebhookOutcome, ServiceError> {
        if self.repos.webhook_events.get(&event.id).await?.is_some() {
            debug!("Duplicate webhook delivery");
            return Ok(WebhookOutcome::Duplicate);
        }

        let intent = event.data.object.id.as_ref();
        let outcome = match event.event_type.as_str() {
            PAYMENT_SUCCEEDED => self.apply_payment(intent, PaymentStatus::Paid).await?,
            PAYMENT_FAILED => self.apply_payment(intent, PaymentStatus::Failed).await?,
            _ => WebhookOutcome::Ignored,
        };

        let created = self
            .repos
            .webhook_events
            .record_if_absent(&event.id, &event.event_type)
            .await?;
        if !created {
            debug!("Webhook event recorded by a concurrent delivery");
        }

        Ok(outcome)
    }

    /// Move the intent's order to `next`.
    ///
    /// The duplicate check in [`Self::process`] is a plain read, so two
    /// deliveries of one event can both get here. Exactly-once effect per
    /// event id rests on the compare-and-set below: of two racing
    /// deliveries only one sees `current` still stored. Any new event
    /// handler must write through a compare-and-set the same way.
    async fn apply_payment(
        &self,
        intent: Option<&PaymentIntentId>,
        next: PaymentStatus,
    ) -> Result<WebhookOutcome, ServiceError> {
        let Some(intent) = intent else {
            warn!("Payment event carries no intent id");
            return Ok(WebhookOutcome::NoMatchingOrder);
        };

        let Some(order) = self.repos.orders.find_by_payment_ref(intent).await? else {
            info!(payment_intent = %intent, "No order for payment intent");
            return Ok(WebhookOutcome::NoMatchingOrder);
        };

        let current = order.payment_status;
        if !current.can_transition_to(next) {
            info!(
                order_id = %order.id,
                from = %current,
                to = %next,
                "Payment status change not allowed, skipping"
            );
            return Ok(WebhookOutcome::Unchanged);
        }

        if self
            .repos
            .orders
            .update_payment_status(&order.id, current, next)
            .await?
        {
            info!(order_id = %order.id, from = %current, to = %next, "Payment status updated");
            Ok(WebhookOutcome::Applied)
        } else {
            info!(order_id = %order.id, "Payment status changed concurrently, skipping");
            Ok(WebhookOutcome::Unchanged)
        }
    }
}
