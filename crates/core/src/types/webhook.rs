//! Processed payment-gateway webhook events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::WebhookEventId;

/// Marker that a gateway event has been handled (`webhookEvents` collection).
///
/// The event id is the idempotency key: a record is written at most once per
/// id, and its presence short-circuits redeliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEventRecord {
    pub id: WebhookEventId,
    pub event_type: String,
    pub received_at: DateTime<Utc>,
}
