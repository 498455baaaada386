// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Billing event envelope parsing.
//!
//! The provider posts `{"meta": {"event_name", "custom_data"}, "data":
//! {"id", "attributes"}}`. The routing key is `custom_data.manager_id`,
//! injected at checkout time; an event without it is acknowledged and
//! dropped.

use bridgeos_core::UserId;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

/// Event kinds the receiver distinguishes. Anything else is `Unknown` and
/// acknowledged with 200 so the provider does not retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Updated,
    Cancelled,
    Expired,
    Paused,
    Resumed,
    PaymentFailed,
    PaymentRecovered,
    PaymentSuccess,
    PlanChanged,
    Unknown(String),
}

impl EventKind {
    fn from_name(name: &str) -> Self {
        match name {
            "subscription_created" => Self::Created,
            "subscription_updated" => Self::Updated,
            "subscription_cancelled" => Self::Cancelled,
            "subscription_expired" => Self::Expired,
            "subscription_paused" => Self::Paused,
            "subscription_resumed" => Self::Resumed,
            "subscription_payment_failed" => Self::PaymentFailed,
            "subscription_payment_recovered" => Self::PaymentRecovered,
            "subscription_payment_success" => Self::PaymentSuccess,
            "subscription_plan_changed" => Self::PlanChanged,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// A parsed billing event.
#[derive(Debug, Clone)]
pub struct BillingEvent {
    pub kind: EventKind,
    pub manager_id: UserId,
    /// Provider-side subscription identifier.
    pub external_id: Option<String>,
    pub renews_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// The `cancelled` attribute flag, relevant for `Updated` events.
    pub cancelled: bool,
    pub customer_portal_url: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    meta: Meta,
    #[serde(default)]
    data: Option<Data>,
}

#[derive(Deserialize)]
struct Meta {
    event_name: String,
    #[serde(default)]
    custom_data: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Data {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    attributes: Option<Attributes>,
}

#[derive(Deserialize, Default)]
struct Attributes {
    #[serde(default)]
    renews_at: Option<String>,
    #[serde(default)]
    ends_at: Option<String>,
    #[serde(default)]
    cancelled: Option<bool>,
    #[serde(default)]
    urls: Option<Urls>,
}

#[derive(Deserialize, Default)]
struct Urls {
    #[serde(default)]
    customer_portal: Option<String>,
}

/// Outcome of parsing an authentic payload.
pub enum ParsedEvent {
    /// A routable event.
    Event(BillingEvent),
    /// Parsed, but no `manager_id` routing key: acknowledge and drop.
    Unroutable { event_name: String },
}

/// Parses the raw (already authenticated) body.
pub fn parse_event(body: &[u8]) -> Result<ParsedEvent, serde_json::Error> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    let event_name = envelope.meta.event_name.clone();

    let Some(manager_id) = manager_id_from_custom_data(envelope.meta.custom_data.as_ref()) else {
        warn!(event_name = %event_name, "billing event without manager_id routing key");
        return Ok(ParsedEvent::Unroutable { event_name });
    };

    let (external_id, attributes) = match envelope.data {
        Some(data) => (data.id, data.attributes.unwrap_or_default()),
        None => (None, Attributes::default()),
    };

    Ok(ParsedEvent::Event(BillingEvent {
        kind: EventKind::from_name(&event_name),
        manager_id,
        external_id,
        renews_at: parse_timestamp(attributes.renews_at.as_deref()),
        ends_at: parse_timestamp(attributes.ends_at.as_deref()),
        cancelled: attributes.cancelled.unwrap_or(false),
        customer_portal_url: attributes.urls.and_then(|u| u.customer_portal),
    }))
}

/// The routing key may arrive as a JSON string or number.
fn manager_id_from_custom_data(custom_data: Option<&serde_json::Value>) -> Option<UserId> {
    let value = custom_data?.get("manager_id")?;
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = value?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
