use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TravelMode {
    Walk,
    Cycle,
    Car,
    Motorbike,
    Bus,
    Train,
    #[serde(rename = "Auto-rickshaw")]
    AutoRickshaw,
    Taxi,
    Other,
}

impl TravelMode {
    pub const ALL: [TravelMode; 9] = [
        TravelMode::Walk,
        TravelMode::Cycle,
        TravelMode::Car,
        TravelMode::Motorbike,
        TravelMode::Bus,
        TravelMode::Train,
        TravelMode::AutoRickshaw,
        TravelMode::Taxi,
        TravelMode::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Walk => "Walk",
            TravelMode::Cycle => "Cycle",
            TravelMode::Car => "Car",
            TravelMode::Motorbike => "Motorbike",
            TravelMode::Bus => "Bus",
            TravelMode::Train => "Train",
            TravelMode::AutoRickshaw => "Auto-rickshaw",
            TravelMode::Taxi => "Taxi",
            TravelMode::Other => "Other",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownLabel {
                kind: "travel mode",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TripPurpose {
    Work,
    Education,
    Shopping,
    Leisure,
    #[serde(rename = "Personal Business")]
    PersonalBusiness,
    Health,
    Social,
    Other,
}

impl TripPurpose {
    pub const ALL: [TripPurpose; 8] = [
        TripPurpose::Work,
        TripPurpose::Education,
        TripPurpose::Shopping,
        TripPurpose::Leisure,
        TripPurpose::PersonalBusiness,
        TripPurpose::Health,
        TripPurpose::Social,
        TripPurpose::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TripPurpose::Work => "Work",
            TripPurpose::Education => "Education",
            TripPurpose::Shopping => "Shopping",
            TripPurpose::Leisure => "Leisure",
            TripPurpose::PersonalBusiness => "Personal Business",
            TripPurpose::Health => "Health",
            TripPurpose::Social => "Social",
            TripPurpose::Other => "Other",
        }
    }
}

impl fmt::Display for TripPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TripPurpose {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|purpose| purpose.as_str() == s)
            .ok_or_else(|| UnknownLabel {
                kind: "trip purpose",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TripFrequency {
    Daily,
    Weekly,
    Monthly,
    Occasionally,
}

impl TripFrequency {
    pub const ALL: [TripFrequency; 4] = [
        TripFrequency::Daily,
        TripFrequency::Weekly,
        TripFrequency::Monthly,
        TripFrequency::Occasionally,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TripFrequency::Daily => "Daily",
            TripFrequency::Weekly => "Weekly",
            TripFrequency::Monthly => "Monthly",
            TripFrequency::Occasionally => "Occasionally",
        }
    }
}

impl fmt::Display for TripFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TripFrequency {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|frequency| frequency.as_str() == s)
            .ok_or_else(|| UnknownLabel {
                kind: "trip frequency",
                value: s.to_string(),
            })
    }
}

/// Every selectable label, in the order the entry form lists them.
#[derive(Debug, Clone, Serialize)]
pub struct TripOptions {
    pub modes: Vec<&'static str>,
    pub purposes: Vec<&'static str>,
    pub frequencies: Vec<&'static str>,
}

impl TripOptions {
    pub fn all() -> Self {
        Self {
            modes: TravelMode::ALL.iter().map(TravelMode::as_str).collect(),
            purposes: TripPurpose::ALL.iter().map(TripPurpose::as_str).collect(),
            frequencies: TripFrequency::ALL
                .iter()
                .map(TripFrequency::as_str)
                .collect(),
        }
    }
}
