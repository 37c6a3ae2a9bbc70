use crate::normalize::FlattenedAlertRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{value::RawValue, Value};
use std::{convert::Infallible, fmt, str::FromStr};

/// Integration that emitted a webhook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Meraki alert webhooks, flattened into the alert table
    Meraki,
    /// Greenhouse ATS webhooks, stored as received
    Greenhouse,
    /// Any other integration, stored as received
    Other(String),
}

impl Source {
    /// Tag stored in the envelope's `source` field.
    pub fn as_str(&self) -> &str {
        match self {
            Source::Meraki => "meraki_webhook",
            Source::Greenhouse => "greenhouse_webhook",
            Source::Other(tag) => tag,
        }
    }

    /// Name used in alert subjects.
    pub fn display_name(&self) -> &str {
        match self {
            Source::Meraki => "Meraki Webhook",
            Source::Greenhouse => "Greenhouse Webhook",
            Source::Other(tag) => tag,
        }
    }

    /// Whether payloads of this source are flattened before loading.
    pub fn is_flattened(&self) -> bool {
        matches!(self, Source::Meraki)
    }
}

impl FromStr for Source {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "meraki" | "meraki_webhook" => Source::Meraki,
            "greenhouse" | "greenhouse_webhook" => Source::Greenhouse,
            other => Source::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `WebhookEnvelope` wraps one inbound payload with ingestion metadata.
/// It's built once per call and never modified.
///
/// The payload is kept as the JSON text that was received, so key order,
/// number literals and formatting survive every copy made of it.
#[derive(Clone, Debug)]
pub struct WebhookEnvelope {
    timestamp: String,
    source: String,
    lambda_request_id: String,
    environment: String,
    payload: Box<RawValue>,
}

impl WebhookEnvelope {
    /// Wrap a payload received at `received_at`.
    pub fn new(
        received_at: DateTime<Utc>,
        source: &Source,
        request_id: &str,
        environment: &str,
        payload: Box<RawValue>,
    ) -> WebhookEnvelope {
        WebhookEnvelope {
            timestamp: received_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            source: source.as_str().to_string(),
            lambda_request_id: request_id.to_string(),
            environment: environment.to_string(),
            payload,
        }
    }

    /// Receipt time, ISO-8601 in UTC.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Source tag.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Lambda request id of the call that received the payload.
    pub fn request_id(&self) -> &str {
        &self.lambda_request_id
    }

    /// Deployment environment tag.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// The payload as received.
    pub fn payload(&self) -> &RawValue {
        &self.payload
    }

    fn serialize_entries<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        map.serialize_entry("timestamp", &self.timestamp)?;
        map.serialize_entry("source", &self.source)?;
        map.serialize_entry("lambda_request_id", &self.lambda_request_id)?;
        map.serialize_entry("environment", &self.environment)?;

        // Envelopes are written one per line. A line break in valid JSON can
        // only sit between tokens, so such payloads are written again compact.
        let text = self.payload.get();
        if !text.contains(|c: char| c == '\n' || c == '\r') {
            return map.serialize_entry("payload", &self.payload);
        }
        let value: Value =
            serde_json::from_str(text).map_err(<M::Error as serde::ser::Error>::custom)?;
        map.serialize_entry("payload", &value)
    }
}

impl Serialize for WebhookEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        self.serialize_entries(&mut map)?;
        map.end()
    }
}

/// `CopyJobRow` is the line written for the warehouse COPY job:
/// envelope metadata, the flattened columns and the raw archive location.
#[derive(Clone, Debug)]
pub struct CopyJobRow<'a> {
    /// Envelope of the webhook
    pub envelope: &'a WebhookEnvelope,
    /// Flattened projection of the payload
    pub record: &'a FlattenedAlertRecord,
    /// `s3://` location of the raw archive, if it was written
    pub s3_raw_location: Option<String>,
}

impl<'a> CopyJobRow<'a> {
    /// Newline terminated JSON line.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

impl<'a> Serialize for CopyJobRow<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.envelope.serialize_entries(&mut map)?;
        self.record.serialize_entries(&mut map)?;
        map.serialize_entry("s3_raw_location", &self.s3_raw_location)?;
        map.end()
    }
}
