use crate::error::SourceError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One answer from the location utility.
///
/// Only `latitude` and `longitude` are mandatory. Every other field is kept
/// exactly as reported, including sentinel values such as `-1`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationReading {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub vertical_accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub direction: Option<f64>,
    pub address: Option<String>,
}

const ACCURACY_KEYS: &[&str] = &["accuracy", "h_accuracy", "horizontalAccuracy"];
const VERTICAL_ACCURACY_KEYS: &[&str] = &["verticalAccuracy", "v_accuracy", "vertical_accuracy"];
const DIRECTION_KEYS: &[&str] = &["direction", "course"];

impl LocationReading {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..Default::default()
        }
    }

    /// Parse the utility's JSON output.
    ///
    /// Numbers may arrive as JSON numbers or numeric strings, and accuracy
    /// keys come in a few spellings depending on the utility version.
    pub fn from_json(raw: &str) -> Result<Self, SourceError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| SourceError::Malformed {
            what: "location output",
            reason: e.to_string(),
        })?;
        let object = value.as_object().ok_or_else(|| SourceError::Malformed {
            what: "location output",
            reason: "expected a JSON object".to_string(),
        })?;

        let latitude = required_number(object, "latitude")?;
        let longitude = required_number(object, "longitude")?;

        Ok(Self {
            latitude,
            longitude,
            accuracy: optional_number(object, ACCURACY_KEYS)?,
            altitude: optional_number(object, &["altitude"])?,
            vertical_accuracy: optional_number(object, VERTICAL_ACCURACY_KEYS)?,
            speed: optional_number(object, &["speed"])?,
            direction: optional_number(object, DIRECTION_KEYS)?,
            address: optional_text(object, "address"),
        })
    }
}

fn required_number(object: &Map<String, Value>, key: &'static str) -> Result<f64, SourceError> {
    optional_number(object, &[key])?.ok_or_else(|| SourceError::Malformed {
        what: "location output",
        reason: format!("missing field `{key}`"),
    })
}

fn optional_number(object: &Map<String, Value>, keys: &[&str]) -> Result<Option<f64>, SourceError> {
    let Some((key, value)) = keys
        .iter()
        .find_map(|key| object.get(*key).map(|value| (*key, value)))
    else {
        return Ok(None);
    };

    let number = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => Some(s.trim().parse::<f64>().map_err(|_| SourceError::Malformed {
            what: "location output",
            reason: format!("field `{key}` is not a number: {s:?}"),
        })?),
        other => {
            return Err(SourceError::Malformed {
                what: "location output",
                reason: format!("field `{key}` has unexpected type: {other}"),
            })
        }
    };

    // `f64::from_str` accepts "NaN" and "inf", which no store can hold
    match number {
        Some(n) if !n.is_finite() => Err(SourceError::Malformed {
            what: "location output",
            reason: format!("field `{key}` is not finite: {n}"),
        }),
        _ => Ok(number),
    }
}

fn optional_text(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}
