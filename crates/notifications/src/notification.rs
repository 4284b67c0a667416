//! The outward notification shape.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::EventId;
use serde::{Deserialize, Serialize};

/// Flattened, wire-safe view of a committed event.
///
/// Carries identity and a short display text only. Payload fields never
/// leak into notifications, so internal event changes do not break clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Dispatch name, also used as the SSE `event:` field.
    #[serde(rename = "type")]
    pub notification_type: String,

    pub entity_id: Option<AggregateId>,

    pub event_id: Option<EventId>,

    /// Stream version after the event.
    pub version: Option<i64>,

    pub timestamp: DateTime<Utc>,

    /// Title or name in the default locale, when the event sets one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub display: Option<String>,
}

impl Notification {
    /// Type of the synthetic frame sent when a stream opens.
    pub const CONNECTED: &'static str = "Connected";

    /// Type of the final frame sent to a connection that fell behind.
    /// Receivers should reload whatever they derived from notifications.
    pub const RESYNC: &'static str = "Resync";

    pub fn connected() -> Self {
        Self::synthetic(Self::CONNECTED)
    }

    pub fn resync() -> Self {
        Self::synthetic(Self::RESYNC)
    }

    fn synthetic(notification_type: &str) -> Self {
        Self {
            notification_type: notification_type.to_string(),
            entity_id: None,
            event_id: None,
            version: None,
            timestamp: Utc::now(),
            display: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.notification_type == Self::CONNECTED
    }

    pub fn is_resync(&self) -> bool {
        self.notification_type == Self::RESYNC
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_frame_has_no_identity() {
        let n = Notification::connected();
        assert!(n.is_connected());
        assert!(n.entity_id.is_none());
        assert!(n.event_id.is_none());
    }

    #[test]
    fn wire_format_uses_type_field_and_omits_empty_display() {
        let n = Notification::connected();
        let json: serde_json::Value = serde_json::from_str(&n.to_json().unwrap()).unwrap();

        assert_eq!(json["type"], "Connected");
        assert!(json.get("display").is_none());
    }
}
