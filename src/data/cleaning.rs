//! Boundary validation of incoming rounds
//!
//! Feed payloads are loosely typed JSON. A round only enters the outcome
//! log after it passes these checks:
//! - color is one of the three known colors (numeric code or name)
//! - roll is an integer in 0..=14 that agrees with the color
//! - timestamp is RFC 3339 text or epoch milliseconds

use crate::error::{PredictorError, Result};
use crate::types::{Color, Outcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Round as delivered by a feed, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOutcome {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub color: Value,
    #[serde(default)]
    pub roll: Value,
    #[serde(default, alias = "timestamp")]
    pub created_at: Value,
}

impl RawOutcome {
    /// Well-formed raw round, as a simulator or fixture would emit it
    pub fn from_parts(id: &str, color: Color, roll: u8, at: DateTime<Utc>) -> Self {
        Self {
            id: Value::String(id.to_string()),
            color: Value::from(color.code()),
            roll: Value::from(roll),
            created_at: Value::String(at.to_rfc3339()),
        }
    }

    /// Best-effort id for log messages about rejected rounds
    pub fn display_id(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            Value::Null => "<no id>".to_string(),
            other => other.to_string(),
        }
    }
}

impl TryFrom<RawOutcome> for Outcome {
    type Error = PredictorError;

    fn try_from(raw: RawOutcome) -> Result<Self> {
        let id = parse_id(&raw.id)?;
        let color = parse_color(&raw.color)
            .map_err(|e| PredictorError::InvalidOutcome(format!("{}: {}", id, e)))?;
        let roll = parse_roll(&raw.roll, color)
            .map_err(|e| PredictorError::InvalidOutcome(format!("{}: {}", id, e)))?;
        let timestamp = parse_timestamp(&raw.created_at)
            .map_err(|e| PredictorError::InvalidOutcome(format!("{}: {}", id, e)))?;

        Ok(Outcome::new(id, color, roll, timestamp))
    }
}

/// Validate a raw round, returning the typed outcome
pub fn validate(raw: RawOutcome) -> Result<Outcome> {
    Outcome::try_from(raw)
}

fn parse_id(value: &Value) -> Result<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(uuid::Uuid::new_v4().to_string()),
        other => Err(PredictorError::InvalidOutcome(format!("bad id {}", other))),
    }
}

fn parse_color(value: &Value) -> std::result::Result<Color, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(Color::from_code)
            .ok_or_else(|| format!("unknown color code {}", n)),
        Value::String(s) => match s.trim().parse::<u64>() {
            Ok(code) => Color::from_code(code).ok_or_else(|| format!("unknown color code {}", code)),
            Err(_) => s.parse::<Color>(),
        },
        Value::Null => Err("missing color".to_string()),
        other => Err(format!("color must be a number or name, got {}", other)),
    }
}

fn parse_roll(value: &Value, color: Color) -> std::result::Result<u8, String> {
    let roll = match value {
        Value::Number(n) => n.as_u64().ok_or_else(|| format!("roll {} is not a whole number", n))?,
        Value::Null => return Err("missing roll".to_string()),
        other => return Err(format!("roll must be a number, got {}", other)),
    };

    let roll = u8::try_from(roll).map_err(|_| format!("roll {} out of range", roll))?;
    match Color::from_roll(roll) {
        Some(expected) if expected == color => Ok(roll),
        Some(expected) => Err(format!("roll {} is {}, not {}", roll, expected, color)),
        None => Err(format!("roll {} out of range", roll)),
    }
}

fn parse_timestamp(value: &Value) -> std::result::Result<DateTime<Utc>, String> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| format!("bad timestamp '{}': {}", s, e)),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| format!("bad epoch timestamp {}", n)),
        Value::Null => Err("missing timestamp".to_string()),
        other => Err(format!("timestamp must be text or epoch millis, got {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawOutcome {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_feed_round() {
        let outcome = validate(raw(json!({
            "id": "abc123",
            "color": 1,
            "roll": 5,
            "created_at": "2024-06-15T12:00:00.123Z"
        })))
        .unwrap();

        assert_eq!(outcome.id, "abc123");
        assert_eq!(outcome.color, Color::Red);
        assert_eq!(outcome.roll, 5);
        assert_eq!(
            outcome.timestamp,
            Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap() + chrono::Duration::milliseconds(123)
        );
        assert!(outcome.was_scored.is_none());
        assert!(outcome.was_correct.is_none());
    }

    #[test]
    fn test_color_names_and_epoch_millis() {
        let outcome = validate(raw(json!({
            "id": 77,
            "color": "white",
            "roll": 0,
            "timestamp": 1718452800000i64
        })))
        .unwrap();

        assert_eq!(outcome.id, "77");
        assert_eq!(outcome.color, Color::White);
        assert_eq!(outcome.timestamp, Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_id_gets_generated() {
        let outcome = validate(raw(json!({
            "color": 2,
            "roll": 11,
            "created_at": "2024-06-15T12:00:00Z"
        })))
        .unwrap();

        assert_eq!(outcome.color, Color::Black);
        assert!(!outcome.id.is_empty());
    }

    #[test]
    fn test_unknown_color_rejected() {
        let err = validate(raw(json!({
            "id": "x", "color": 3, "roll": 4, "created_at": "2024-06-15T12:00:00Z"
        })))
        .unwrap_err();
        assert!(matches!(err, PredictorError::InvalidOutcome(_)));
        assert!(err.to_string().contains("unknown color"));
    }

    #[test]
    fn test_roll_color_mismatch_rejected() {
        let err = validate(raw(json!({
            "id": "x", "color": "red", "roll": 9, "created_at": "2024-06-15T12:00:00Z"
        })))
        .unwrap_err();
        assert!(err.to_string().contains("roll 9 is black"));
    }

    #[test]
    fn test_roll_out_of_range_rejected() {
        let err = validate(raw(json!({
            "id": "x", "color": 2, "roll": 15, "created_at": "2024-06-15T12:00:00Z"
        })))
        .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_ill_typed_fields_rejected() {
        assert!(validate(raw(json!({
            "id": "x", "color": 1, "roll": "five", "created_at": "2024-06-15T12:00:00Z"
        })))
        .is_err());
        assert!(validate(raw(json!({
            "id": "x", "color": 1, "roll": 3, "created_at": "yesterday"
        })))
        .is_err());
        assert!(validate(raw(json!({ "id": "x", "color": 1, "roll": 3 }))).is_err());
        assert!(validate(raw(json!({ "id": "x", "roll": 3, "created_at": "2024-06-15T12:00:00Z" }))).is_err());
    }

    #[test]
    fn test_from_parts_validates() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let raw = RawOutcome::from_parts("sim-1", Color::Black, 12, at);
        assert_eq!(raw.display_id(), "sim-1");

        let outcome = validate(raw).unwrap();
        assert_eq!(outcome, Outcome::new("sim-1", Color::Black, 12, at));
    }
}
