use std::fmt;

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};

use super::catalog::{TravelMode, TripFrequency, TripPurpose};

/// A numeric field as it arrives from a form or a loosely typed client.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NumericInput {
    #[default]
    Empty,
    Parsed(f64),
    Invalid(String),
}

impl NumericInput {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return NumericInput::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) => NumericInput::Parsed(value),
            Err(_) => NumericInput::Invalid(trimmed.to_string()),
        }
    }

    /// The parsed value, if it is a finite number.
    pub fn value(&self) -> Option<f64> {
        match self {
            NumericInput::Parsed(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NumericInput::Empty)
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Parsed(value)
    }
}

impl fmt::Display for NumericInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericInput::Empty => Ok(()),
            NumericInput::Parsed(value) => write!(f, "{value}"),
            NumericInput::Invalid(raw) => write!(f, "{raw}"),
        }
    }
}

struct NumericInputVisitor;

impl<'de> Visitor<'de> for NumericInputVisitor {
    type Value = NumericInput;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number, a numeric string or an empty value")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(NumericInput::Parsed(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(NumericInput::Parsed(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(NumericInput::Parsed(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(NumericInput::parse(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(NumericInput::Invalid(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(NumericInput::Empty)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(NumericInput::Empty)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(NumericInputVisitor)
    }
}

impl<'de> Deserialize<'de> for NumericInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NumericInputVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoordinateInput {
    pub lat: NumericInput,
    pub lon: NumericInput,
}

impl CoordinateInput {
    pub fn new(lat: impl Into<NumericInput>, lon: impl Into<NumericInput>) -> Self {
        Self {
            lat: lat.into(),
            lon: lon.into(),
        }
    }
}

/// A candidate trip before validation. Nothing about it is trusted yet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripDraft {
    pub origin: Option<CoordinateInput>,
    pub destination: Option<CoordinateInput>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub mode: Option<String>,
    pub distance: NumericInput,
    pub purpose: Option<String>,
    pub companions: NumericInput,
    pub frequency: Option<String>,
    pub cost: NumericInput,
}

impl TripDraft {
    /// Initial state of the entry form. `companions` starts at zero while
    /// `cost` starts empty and has to be typed in.
    pub fn form_defaults() -> Self {
        Self {
            origin: Some(CoordinateInput::default()),
            destination: Some(CoordinateInput::default()),
            start_time: None,
            end_time: None,
            mode: Some(TravelMode::Car.to_string()),
            distance: NumericInput::Empty,
            purpose: Some(TripPurpose::Work.to_string()),
            companions: NumericInput::Parsed(0.0),
            frequency: Some(TripFrequency::Daily.to_string()),
            cost: NumericInput::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_input_accepts_numbers_strings_and_blanks() {
        let draft: TripDraft = serde_json::from_str(
            r#"{"distance": 8, "companions": "2", "cost": "", "origin": {"lat": 0, "lon": null}}"#,
        )
        .unwrap();
        assert_eq!(draft.distance, NumericInput::Parsed(8.0));
        assert_eq!(draft.companions, NumericInput::Parsed(2.0));
        assert_eq!(draft.cost, NumericInput::Empty);
        let origin = draft.origin.unwrap();
        assert_eq!(origin.lat, NumericInput::Parsed(0.0));
        assert_eq!(origin.lon, NumericInput::Empty);
        assert!(draft.destination.is_none());
    }

    #[test]
    fn garbage_text_is_kept_as_invalid() {
        assert_eq!(
            NumericInput::parse(" twelve "),
            NumericInput::Invalid("twelve".into())
        );
        assert_eq!(NumericInput::parse("NaN").value(), None);
        assert_eq!(NumericInput::parse("-3.5").value(), Some(-3.5));
    }

    #[test]
    fn form_defaults_prefill_companions_but_not_cost() {
        let draft = TripDraft::form_defaults();
        assert_eq!(draft.companions.value(), Some(0.0));
        assert!(draft.cost.is_empty());
        assert_eq!(draft.mode.as_deref(), Some("Car"));
    }
}
