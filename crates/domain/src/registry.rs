//! Stored event names and their decoding.
//!
//! Wire names are stable. A renamed event keeps working through the alias
//! table; any other name that the target event type does not know fails the
//! replay instead of being skipped.

use event_store::EventEnvelope;

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Historical names mapped to their current wire name.
const ALIASES: &[(&str, &str)] = &[("BookDeleted", "BookSoftDeleted")];

/// Highest payload schema revision this build can read.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Resolves aliases to the current wire name.
pub fn canonical_event_type(event_type: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == event_type)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(event_type)
}

/// Decodes a stored envelope into the aggregate's event type.
pub fn decode_event<A: Aggregate>(envelope: &EventEnvelope) -> Result<A::Event, DomainError> {
    let event_type = canonical_event_type(&envelope.event_type);

    if !A::Event::EVENT_TYPES.contains(&event_type) {
        return Err(DomainError::UnknownEventType {
            aggregate_type: A::aggregate_type(),
            event_type: envelope.event_type.clone(),
        });
    }

    if envelope.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(DomainError::UnsupportedSchemaVersion {
            event_type: envelope.event_type.clone(),
            schema_version: envelope.schema_version,
        });
    }

    let mut payload = envelope.payload.clone();
    if let Some(object) = payload.as_object_mut() {
        object.insert(
            "type".to_string(),
            serde_json::Value::String(event_type.to_string()),
        );
    }

    Ok(serde_json::from_value(payload)?)
}
