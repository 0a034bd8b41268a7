use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const TITLE_FIELD: &str = "every_moment_title";
pub const POEM_FIELD: &str = "every_moment_poem";

pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_millis(15_000);
pub const DEFAULT_MAXIMUM_AGE: Duration = Duration::from_millis(60_000);

/// A single geolocation reading in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A position together with the moment it was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub position: Position,
    pub acquired_at: DateTime<Utc>,
}

impl Fix {
    pub fn now(position: Position) -> Self {
        Self {
            position,
            acquired_at: Utc::now(),
        }
    }

    /// Whether the fix is still usable under a `maximum_age` constraint.
    pub fn is_fresh(&self, maximum_age: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(maximum_age) {
            Ok(max_age) => now.signed_duration_since(self.acquired_at) <= max_age,
            Err(_) => true,
        }
    }
}

/// Options passed to the location service on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationOptions {
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOCATION_TIMEOUT,
            maximum_age: DEFAULT_MAXIMUM_AGE,
        }
    }
}

/// A completed HTTP exchange, whatever its status code.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub position: Position,
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Loosely typed view of the poem server's JSON document.
#[derive(Debug, Clone, Default)]
pub struct PoemResponse {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl PoemResponse {
    /// Parses a response body. Any valid JSON is accepted; a document that is
    /// not an object simply has no fields.
    pub fn from_body(body: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        let fields = match value {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Ok(Self { fields })
    }

    /// Reads a field as an opaque string. Missing keys and `null` are `None`;
    /// non-string values are passed through in their JSON text form.
    pub fn field(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn title(&self) -> Option<String> {
        self.field(TITLE_FIELD)
    }

    pub fn poem(&self) -> Option<String> {
        self.field(POEM_FIELD)
    }
}

/// The two-key dictionary delivered to the watch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppMessage {
    #[serde(
        rename = "EVERY_MOMENT_TITLE",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        rename = "EVERY_MOMENT_POEM",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub poem: Option<String>,
}

impl From<&PoemResponse> for AppMessage {
    fn from(response: &PoemResponse) -> Self {
        Self {
            title: response.title(),
            poem: response.poem(),
        }
    }
}

/// Acknowledgement returned by the bridge after a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub delivered_at: DateTime<Utc>,
    pub bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Ready,
    AppMessage,
}

impl TriggerKind {
    pub fn name(&self) -> &'static str {
        match self {
            TriggerKind::Ready => "ready",
            TriggerKind::AppMessage => "appmessage",
        }
    }
}

/// An external event that starts one relay cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Ready,
    /// The payload is carried along but never inspected.
    AppMessage(serde_json::Value),
}

impl Trigger {
    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::Ready => TriggerKind::Ready,
            Trigger::AppMessage(_) => TriggerKind::AppMessage,
        }
    }
}

/// How a single cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Delivered(AppMessage),
    SendFailed(AppMessage),
    LocationFailed,
    ParseFailed,
    /// The request never produced a response.
    Incomplete,
}

impl CycleOutcome {
    /// The message handed to the bridge, if the cycle got that far.
    pub fn message(&self) -> Option<&AppMessage> {
        match self {
            CycleOutcome::Delivered(m) | CycleOutcome::SendFailed(m) => Some(m),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_fields_do_not_leak() {
        let response = PoemResponse::from_body(
            r#"{"every_moment_title": "T", "every_moment_poem": "P", "other": 1}"#,
        )
        .unwrap();
        let message = AppMessage::from(&response);

        assert_eq!(
            message,
            AppMessage {
                title: Some("T".to_string()),
                poem: Some("P".to_string()),
            }
        );
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            serde_json::json!({"EVERY_MOMENT_TITLE": "T", "EVERY_MOMENT_POEM": "P"})
        );
    }

    #[test]
    fn test_missing_poem_is_none() {
        let response = PoemResponse::from_body(r#"{"every_moment_title": "T"}"#).unwrap();
        let message = AppMessage::from(&response);

        assert_eq!(message.title.as_deref(), Some("T"));
        assert_eq!(message.poem, None);
        assert_eq!(
            serde_json::to_string(&message).unwrap(),
            r#"{"EVERY_MOMENT_TITLE":"T"}"#
        );
    }

    #[test]
    fn test_null_and_non_string_values() {
        let response = PoemResponse::from_body(
            r#"{"every_moment_title": null, "every_moment_poem": 42}"#,
        )
        .unwrap();

        assert_eq!(response.title(), None);
        assert_eq!(response.poem().as_deref(), Some("42"));
    }

    #[test]
    fn test_non_object_document_has_no_fields() {
        let response = PoemResponse::from_body("[1, 2, 3]").unwrap();
        assert_eq!(AppMessage::from(&response), AppMessage::default());
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        assert!(PoemResponse::from_body("not json").is_err());
        assert!(PoemResponse::from_body("").is_err());
    }

    #[test]
    fn test_fix_freshness() {
        let fix = Fix::now(Position::new(1.0, 2.0));
        let later = fix.acquired_at + chrono::Duration::seconds(61);

        assert!(fix.is_fresh(DEFAULT_MAXIMUM_AGE, fix.acquired_at));
        assert!(!fix.is_fresh(DEFAULT_MAXIMUM_AGE, later));
        assert!(!fix.is_fresh(Duration::ZERO, fix.acquired_at + chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn test_default_location_options() {
        let options = LocationOptions::default();
        assert_eq!(options.timeout, Duration::from_millis(15000));
        assert_eq!(options.maximum_age, Duration::from_millis(60000));
    }

    #[test]
    fn test_trigger_names() {
        assert_eq!(Trigger::Ready.kind().name(), "ready");
        assert_eq!(
            Trigger::AppMessage(serde_json::json!({"0": 0})).kind().name(),
            "appmessage"
        );
    }
}
