//! Trip validation.
//!
//! Every rule lives in [`RULES`], keyed by the field it reports on and tagged
//! with the profiles it belongs to. The entry form pre-checks with
//! [`Profile::Interactive`]; anything that gets stored has passed
//! [`Profile::Authoritative`], which adds the required-selection rules.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;

use crate::{
    models::{
        catalog::{TravelMode, TripFrequency, TripPurpose},
        draft::{CoordinateInput, NumericInput, TripDraft},
        trip::{Coordinates, TripDetails},
    },
    time,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TripField {
    Origin,
    Destination,
    StartTime,
    EndTime,
    Distance,
    Companions,
    Cost,
    Mode,
    Purpose,
    Frequency,
}

impl TripField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripField::Origin => "origin",
            TripField::Destination => "destination",
            TripField::StartTime => "startTime",
            TripField::EndTime => "endTime",
            TripField::Distance => "distance",
            TripField::Companions => "companions",
            TripField::Cost => "cost",
            TripField::Mode => "mode",
            TripField::Purpose => "purpose",
            TripField::Frequency => "frequency",
        }
    }
}

impl fmt::Display for TripField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Field name to message, at most one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<TripField, &'static str>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first message reported for a field.
    pub fn add(&mut self, field: TripField, message: &'static str) {
        self.0.entry(field).or_insert(message);
    }

    pub fn get(&self, field: TripField) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn contains(&self, field: TripField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// All messages joined into one line, in field order.
    pub fn summary(&self) -> String {
        self.0.values().copied().collect::<Vec<_>>().join(" ")
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Interactive,
    Authoritative,
}

const EVERYWHERE: &[Profile] = &[Profile::Interactive, Profile::Authoritative];
const SERVER_ONLY: &[Profile] = &[Profile::Authoritative];

pub struct FieldRule {
    pub field: TripField,
    pub profiles: &'static [Profile],
    check: fn(&Candidate) -> Option<&'static str>,
}

impl FieldRule {
    pub fn applies_to(&self, profile: Profile) -> bool {
        self.profiles.contains(&profile)
    }
}

pub static RULES: &[FieldRule] = &[
    FieldRule {
        field: TripField::StartTime,
        profiles: EVERYWHERE,
        check: start_time_rule,
    },
    FieldRule {
        field: TripField::EndTime,
        profiles: EVERYWHERE,
        check: end_time_rule,
    },
    FieldRule {
        field: TripField::Distance,
        profiles: EVERYWHERE,
        check: distance_rule,
    },
    FieldRule {
        field: TripField::Companions,
        profiles: EVERYWHERE,
        check: companions_rule,
    },
    FieldRule {
        field: TripField::Cost,
        profiles: EVERYWHERE,
        check: cost_rule,
    },
    FieldRule {
        field: TripField::Origin,
        profiles: EVERYWHERE,
        check: origin_rule,
    },
    FieldRule {
        field: TripField::Destination,
        profiles: EVERYWHERE,
        check: destination_rule,
    },
    FieldRule {
        field: TripField::Mode,
        profiles: SERVER_ONLY,
        check: mode_required_rule,
    },
    FieldRule {
        field: TripField::Mode,
        profiles: EVERYWHERE,
        check: mode_known_rule,
    },
    FieldRule {
        field: TripField::Purpose,
        profiles: SERVER_ONLY,
        check: purpose_required_rule,
    },
    FieldRule {
        field: TripField::Purpose,
        profiles: EVERYWHERE,
        check: purpose_known_rule,
    },
    FieldRule {
        field: TripField::Frequency,
        profiles: SERVER_ONLY,
        check: frequency_required_rule,
    },
    FieldRule {
        field: TripField::Frequency,
        profiles: EVERYWHERE,
        check: frequency_known_rule,
    },
];

/// Runs every rule of `profile` against the draft.
pub fn check(draft: &TripDraft, profile: Profile) -> FieldErrors {
    check_in(draft, profile, &Local)
}

pub fn check_in<Tz: TimeZone>(draft: &TripDraft, profile: Profile, tz: &Tz) -> FieldErrors {
    collect(&Candidate::read(draft, tz), profile)
}

/// Authoritative validation: either a normalized trip or every field error.
pub fn validate(draft: &TripDraft) -> Result<TripDetails, FieldErrors> {
    validate_in(draft, &Local)
}

pub fn validate_in<Tz: TimeZone>(draft: &TripDraft, tz: &Tz) -> Result<TripDetails, FieldErrors> {
    let candidate = Candidate::read(draft, tz);
    let errors = collect(&candidate, Profile::Authoritative);
    if !errors.is_empty() {
        return Err(errors);
    }
    candidate.into_details().ok_or(errors)
}

fn collect(candidate: &Candidate, profile: Profile) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for rule in RULES.iter().filter(|rule| rule.applies_to(profile)) {
        if let Some(message) = (rule.check)(candidate) {
            errors.add(rule.field, message);
        }
    }
    errors
}

#[derive(Debug, Clone, Copy)]
enum TimeInput {
    Missing,
    Invalid,
    At(DateTime<Utc>),
}

impl TimeInput {
    fn read<Tz: TimeZone>(raw: Option<&str>, tz: &Tz) -> Self {
        match raw.map(str::trim).filter(|value| !value.is_empty()) {
            None => TimeInput::Missing,
            Some(value) => time::parse_timestamp_in(value, tz)
                .map(TimeInput::At)
                .unwrap_or(TimeInput::Invalid),
        }
    }

    fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            TimeInput::At(ts) => Some(*ts),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Choice<T> {
    Missing,
    Unknown,
    Known(T),
}

impl<T: FromStr + Copy> Choice<T> {
    fn read(raw: Option<&str>) -> Self {
        match raw.map(str::trim).filter(|value| !value.is_empty()) {
            None => Choice::Missing,
            Some(value) => value.parse().map(Choice::Known).unwrap_or(Choice::Unknown),
        }
    }

    fn is_missing(&self) -> bool {
        matches!(self, Choice::Missing)
    }

    fn is_unknown(&self) -> bool {
        matches!(self, Choice::Unknown)
    }

    fn known(&self) -> Option<T> {
        match self {
            Choice::Known(value) => Some(*value),
            _ => None,
        }
    }
}

/// The draft with every field read into a strict shape, where possible.
struct Candidate {
    start: TimeInput,
    end: TimeInput,
    origin: Option<Coordinates>,
    destination: Option<Coordinates>,
    distance: Option<f64>,
    companions: Option<u32>,
    cost: Option<f64>,
    mode: Choice<TravelMode>,
    purpose: Choice<TripPurpose>,
    frequency: Choice<TripFrequency>,
}

impl Candidate {
    fn read<Tz: TimeZone>(draft: &TripDraft, tz: &Tz) -> Self {
        Self {
            start: TimeInput::read(draft.start_time.as_deref(), tz),
            end: TimeInput::read(draft.end_time.as_deref(), tz),
            origin: draft.origin.as_ref().and_then(coordinates),
            destination: draft.destination.as_ref().and_then(coordinates),
            distance: non_negative(&draft.distance),
            companions: whole_count(&draft.companions),
            cost: non_negative(&draft.cost),
            mode: Choice::read(draft.mode.as_deref()),
            purpose: Choice::read(draft.purpose.as_deref()),
            frequency: Choice::read(draft.frequency.as_deref()),
        }
    }

    fn into_details(self) -> Option<TripDetails> {
        Some(TripDetails {
            origin: self.origin?,
            destination: self.destination?,
            start_time: self.start.at()?,
            end_time: self.end.at()?,
            mode: self.mode.known()?,
            distance: self.distance?,
            purpose: self.purpose.known()?,
            companions: self.companions?,
            frequency: self.frequency.known()?,
            cost: self.cost?,
        })
    }
}

fn coordinates(input: &CoordinateInput) -> Option<Coordinates> {
    Some(Coordinates {
        lat: input.lat.value()?,
        lon: input.lon.value()?,
    })
}

fn non_negative(input: &NumericInput) -> Option<f64> {
    input.value().filter(|value| *value >= 0.0)
}

fn whole_count(input: &NumericInput) -> Option<u32> {
    non_negative(input)
        .filter(|value| value.fract() == 0.0 && *value <= f64::from(u32::MAX))
        .map(|value| value as u32)
}

fn start_time_rule(c: &Candidate) -> Option<&'static str> {
    match c.start {
        TimeInput::Missing => Some("Start time is required."),
        TimeInput::Invalid => Some("Start time must be a valid date and time."),
        TimeInput::At(_) => None,
    }
}

fn end_time_rule(c: &Candidate) -> Option<&'static str> {
    match (c.start, c.end) {
        (_, TimeInput::Missing) => Some("End time is required."),
        (_, TimeInput::Invalid) => Some("End time must be a valid date and time."),
        (TimeInput::At(start), TimeInput::At(end)) if end <= start => {
            Some("End time must be after start time.")
        }
        _ => None,
    }
}

fn distance_rule(c: &Candidate) -> Option<&'static str> {
    c.distance
        .is_none()
        .then_some("Distance must be a non-negative number.")
}

fn companions_rule(c: &Candidate) -> Option<&'static str> {
    c.companions
        .is_none()
        .then_some("Companions must be a non-negative number.")
}

fn cost_rule(c: &Candidate) -> Option<&'static str> {
    c.cost
        .is_none()
        .then_some("Cost must be a non-negative number.")
}

fn origin_rule(c: &Candidate) -> Option<&'static str> {
    c.origin
        .is_none()
        .then_some("Origin latitude and longitude are required.")
}

fn destination_rule(c: &Candidate) -> Option<&'static str> {
    c.destination
        .is_none()
        .then_some("Destination latitude and longitude are required.")
}

fn mode_required_rule(c: &Candidate) -> Option<&'static str> {
    c.mode.is_missing().then_some("Mode is required.")
}

fn mode_known_rule(c: &Candidate) -> Option<&'static str> {
    c.mode
        .is_unknown()
        .then_some("Mode must be one of the listed options.")
}

fn purpose_required_rule(c: &Candidate) -> Option<&'static str> {
    c.purpose.is_missing().then_some("Purpose is required.")
}

fn purpose_known_rule(c: &Candidate) -> Option<&'static str> {
    c.purpose
        .is_unknown()
        .then_some("Purpose must be one of the listed options.")
}

fn frequency_required_rule(c: &Candidate) -> Option<&'static str> {
    c.frequency.is_missing().then_some("Frequency is required.")
}

fn frequency_known_rule(c: &Candidate) -> Option<&'static str> {
    c.frequency
        .is_unknown()
        .then_some("Frequency must be one of the listed options.")
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use serde_json::json;

    use super::*;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
    }

    fn commute() -> TripDraft {
        serde_json::from_value(json!({
            "origin": { "lat": 12.97, "lon": 77.59 },
            "destination": { "lat": 12.98, "lon": 77.64 },
            "startTime": "2023-10-27T09:00",
            "endTime": "2023-10-27T09:45",
            "mode": "Car",
            "distance": 8,
            "purpose": "Work",
            "companions": 1,
            "frequency": "Daily",
            "cost": 150
        }))
        .unwrap()
    }

    #[test]
    fn accepts_a_complete_commute() {
        let trip = validate_in(&commute(), &ist()).expect("commute should be valid");
        assert_eq!(trip.origin, Coordinates { lat: 12.97, lon: 77.59 });
        assert_eq!(trip.destination, Coordinates { lat: 12.98, lon: 77.64 });
        assert_eq!(trip.distance, 8.0);
        assert_eq!(trip.companions, 1);
        assert_eq!(trip.cost, 150.0);
        assert_eq!(trip.mode, TravelMode::Car);
        assert_eq!(trip.purpose, TripPurpose::Work);
        assert_eq!(trip.frequency, TripFrequency::Daily);
        assert_eq!(time::to_storage(trip.start_time), "2023-10-27T03:30:00.000Z");
        assert_eq!(trip.duration_minutes(), 45);
    }

    #[test]
    fn end_before_start_reports_only_end_time() {
        let mut draft = commute();
        draft.end_time = Some("2023-10-27T08:00".into());
        let errors = validate_in(&draft, &ist()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get(TripField::EndTime),
            Some("End time must be after start time.")
        );
    }

    #[test]
    fn end_equal_to_start_is_rejected() {
        let mut draft = commute();
        draft.end_time = draft.start_time.clone();
        let errors = check_in(&draft, Profile::Interactive, &ist());
        assert!(errors.contains(TripField::EndTime));
    }

    #[test]
    fn missing_times_are_required() {
        let mut draft = commute();
        draft.start_time = None;
        draft.end_time = Some("  ".into());
        let errors = check_in(&draft, Profile::Authoritative, &ist());
        assert_eq!(errors.get(TripField::StartTime), Some("Start time is required."));
        assert_eq!(errors.get(TripField::EndTime), Some("End time is required."));
    }

    #[test]
    fn unparseable_times_are_reported() {
        let mut draft = commute();
        draft.start_time = Some("soon".into());
        let errors = check_in(&draft, Profile::Authoritative, &ist());
        assert_eq!(
            errors.get(TripField::StartTime),
            Some("Start time must be a valid date and time.")
        );
        assert!(!errors.contains(TripField::EndTime));
    }

    #[test]
    fn far_future_years_are_not_valid_times() {
        let mut draft = commute();
        draft.start_time = Some("+12345-01-01T09:00".into());
        draft.end_time = Some("+12345-01-01T10:00".into());
        let errors = validate_in(&draft, &ist()).unwrap_err();
        assert_eq!(
            errors.get(TripField::StartTime),
            Some("Start time must be a valid date and time.")
        );
        assert_eq!(
            errors.get(TripField::EndTime),
            Some("End time must be a valid date and time.")
        );
    }

    #[test]
    fn times_are_compared_at_millisecond_precision() {
        let mut draft = commute();
        draft.start_time = Some("2023-10-27T09:00:00.0001Z".into());
        draft.end_time = Some("2023-10-27T09:00:00.0005Z".into());
        let errors = validate_in(&draft, &ist()).unwrap_err();
        assert_eq!(
            errors.get(TripField::EndTime),
            Some("End time must be after start time.")
        );

        draft.start_time = Some("2023-10-27T09:00:00.0004Z".into());
        draft.end_time = Some("2023-10-27T09:45:00Z".into());
        let trip = validate_in(&draft, &ist()).unwrap();
        assert_eq!(time::to_storage(trip.start_time), "2023-10-27T09:00:00.000Z");
        assert_eq!(
            time::from_storage(&time::to_storage(trip.start_time)).unwrap(),
            trip.start_time
        );
    }

    #[test]
    fn negative_amounts_fail_and_zero_passes() {
        let mut draft = commute();
        draft.distance = NumericInput::Parsed(-0.5);
        draft.companions = NumericInput::Parsed(-1.0);
        draft.cost = NumericInput::Parsed(-10.0);
        let errors = check_in(&draft, Profile::Authoritative, &ist());
        assert_eq!(
            errors.get(TripField::Distance),
            Some("Distance must be a non-negative number.")
        );
        assert_eq!(
            errors.get(TripField::Companions),
            Some("Companions must be a non-negative number.")
        );
        assert_eq!(errors.get(TripField::Cost), Some("Cost must be a non-negative number."));

        draft.distance = 0.0.into();
        draft.companions = 0.0.into();
        draft.cost = 0.0.into();
        let trip = validate_in(&draft, &ist()).unwrap();
        assert_eq!((trip.distance, trip.companions, trip.cost), (0.0, 0, 0.0));
    }

    #[test]
    fn empty_and_garbage_amounts_fail() {
        let mut draft = commute();
        draft.cost = NumericInput::Empty;
        draft.distance = NumericInput::parse("eight");
        draft.companions = NumericInput::Parsed(1.5);
        let errors = check_in(&draft, Profile::Interactive, &ist());
        assert!(errors.contains(TripField::Cost));
        assert!(errors.contains(TripField::Distance));
        assert!(errors.contains(TripField::Companions));
    }

    #[test]
    fn numeric_strings_are_normalized() {
        let mut draft = commute();
        draft.distance = NumericInput::parse("8.5");
        draft.companions = NumericInput::parse("2");
        draft.origin = Some(CoordinateInput::new(NumericInput::parse("12.97"), 77.59));
        let trip = validate_in(&draft, &ist()).unwrap();
        assert_eq!(trip.distance, 8.5);
        assert_eq!(trip.companions, 2);
        assert_eq!(trip.origin.lat, 12.97);
    }

    #[test]
    fn partial_coordinates_are_rejected() {
        let mut draft = commute();
        draft.origin = Some(CoordinateInput::new(12.97, NumericInput::Empty));
        draft.destination = None;
        let errors = check_in(&draft, Profile::Interactive, &ist());
        assert_eq!(
            errors.get(TripField::Origin),
            Some("Origin latitude and longitude are required.")
        );
        assert_eq!(
            errors.get(TripField::Destination),
            Some("Destination latitude and longitude are required.")
        );
    }

    #[test]
    fn null_island_is_a_place() {
        let mut draft = commute();
        draft.origin = Some(CoordinateInput::new(0.0, 0.0));
        assert!(validate_in(&draft, &ist()).is_ok());
    }

    #[test]
    fn selections_are_required_only_by_the_server() {
        let mut draft = commute();
        draft.mode = None;
        draft.purpose = Some(String::new());
        draft.frequency = None;

        let interactive = check_in(&draft, Profile::Interactive, &ist());
        assert!(interactive.is_empty());

        let errors = validate_in(&draft, &ist()).unwrap_err();
        assert_eq!(errors.get(TripField::Mode), Some("Mode is required."));
        assert_eq!(errors.get(TripField::Purpose), Some("Purpose is required."));
        assert_eq!(errors.get(TripField::Frequency), Some("Frequency is required."));
    }

    #[test]
    fn unknown_selections_are_rejected_everywhere() {
        let mut draft = commute();
        draft.mode = Some("Plane".into());
        let errors = check_in(&draft, Profile::Interactive, &ist());
        assert_eq!(
            errors.get(TripField::Mode),
            Some("Mode must be one of the listed options.")
        );
    }

    #[test]
    fn empty_draft_collects_every_error_at_once() {
        let errors = validate_in(&TripDraft::default(), &ist()).unwrap_err();
        assert_eq!(errors.len(), 10);
    }

    #[test]
    fn errors_serialize_as_a_field_map() {
        let mut draft = commute();
        draft.end_time = Some("2023-10-27T08:00".into());
        let errors = validate_in(&draft, &ist()).unwrap_err();
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({ "endTime": "End time must be after start time." })
        );
    }
}
