//! The event record flowing through the pipeline.
//!
//! An [`Event`] is immutable once built: fields are private and only exposed
//! through accessors. Moving an event between stores clones it.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an ingested event.
///
/// Strongly typed so event ids are never confused with other strings
/// (client identities, header values).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Generate a fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Header name to first value.
pub type HeaderMap = HashMap<String, String>;

/// A received webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    id: EventId,
    body: String,
    headers: HeaderMap,
    received_at: DateTime<Utc>,
}

impl Event {
    /// Build a new event with a freshly generated id.
    pub fn new(body: impl Into<String>, headers: HeaderMap, received_at: DateTime<Utc>) -> Self {
        Self {
            id: EventId::generate(),
            body: body.into(),
            headers,
            received_at,
        }
    }

    /// Rebuild an event from stored parts.
    pub fn from_parts(
        id: EventId,
        body: String,
        headers: HeaderMap,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            body,
            headers,
            received_at,
        }
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// RFC 3339 text used by the persisted layout.
    ///
    /// Sub-second digits are kept only when present, so parsing the text back
    /// yields the exact same instant.
    pub fn received_at_rfc3339(&self) -> String {
        self.received_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

/// Parse the persisted RFC 3339 timestamp text.
pub fn parse_received_at(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|ts| ts.with_timezone(&Utc))
}
