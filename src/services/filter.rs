use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use serde_with::{serde_as, NoneAsEmptyString};

use crate::{
    models::{
        catalog::{TravelMode, TripPurpose},
        trip::Trip,
    },
    time,
};

/// Optional criteria narrowing a trip list. An absent or empty value places
/// no constraint on the result.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripFilter {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub mode: Option<TravelMode>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub purpose: Option<TripPurpose>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Inclusive UTC window on a trip's start time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeBounds {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeBounds {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| ts >= from) && self.to.map_or(true, |to| ts <= to)
    }
}

impl TripFilter {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none()
            && self.purpose.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    /// Start of `start_date` and end of `end_date`, as local calendar days.
    pub fn time_bounds(&self) -> TimeBounds {
        self.time_bounds_in(&Local)
    }

    pub fn time_bounds_in<Tz: TimeZone>(&self, tz: &Tz) -> TimeBounds {
        TimeBounds {
            from: self.start_date.map(|date| {
                time::start_of_day_in(date, tz).unwrap_or_else(|| naive_utc(date, NaiveTime::MIN))
            }),
            to: self.end_date.map(|date| {
                time::end_of_day_in(date, tz).unwrap_or_else(|| {
                    let last_milli =
                        NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
                    naive_utc(date, last_milli)
                })
            }),
        }
    }

    pub fn matches(&self, trip: &Trip, bounds: &TimeBounds) -> bool {
        self.mode.map_or(true, |mode| trip.mode() == mode)
            && self.purpose.map_or(true, |purpose| trip.purpose() == purpose)
            && bounds.contains(trip.start_time())
    }

    /// Keeps the matching trips in their original order.
    pub fn apply<I>(&self, trips: I) -> Vec<Trip>
    where
        I: IntoIterator<Item = Trip>,
    {
        self.apply_in(trips, &Local)
    }

    pub fn apply_in<I, Tz>(&self, trips: I, tz: &Tz) -> Vec<Trip>
    where
        I: IntoIterator<Item = Trip>,
        Tz: TimeZone,
    {
        if self.is_empty() {
            return trips.into_iter().collect();
        }
        let bounds = self.time_bounds_in(tz);
        trips
            .into_iter()
            .filter(|trip| self.matches(trip, &bounds))
            .collect()
    }
}

fn naive_utc(date: NaiveDate, at: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(at))
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use uuid::Uuid;

    use super::*;
    use crate::models::{
        catalog::TripFrequency,
        trip::{Coordinates, TripDetails},
    };

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
    }

    fn trip(number: i64, start: &str, mode: TravelMode, purpose: TripPurpose) -> Trip {
        let start_time = time::parse_timestamp_in(start, &ist()).unwrap();
        Trip::new(
            Uuid::new_v4(),
            number,
            TripDetails {
                origin: Coordinates { lat: 12.97, lon: 77.59 },
                destination: Coordinates { lat: 12.98, lon: 77.64 },
                start_time,
                end_time: start_time + chrono::Duration::minutes(30),
                mode,
                distance: 5.0,
                purpose,
                companions: 0,
                frequency: TripFrequency::Weekly,
                cost: 40.0,
            },
        )
    }

    fn sample() -> Vec<Trip> {
        vec![
            trip(1, "2023-10-27T09:00", TravelMode::Car, TripPurpose::Work),
            trip(2, "2023-10-28T00:10", TravelMode::Bus, TripPurpose::Shopping),
            trip(3, "2023-10-28T23:59", TravelMode::Bus, TripPurpose::Work),
            trip(4, "2023-10-29T00:00", TravelMode::Walk, TripPurpose::Leisure),
        ]
    }

    fn numbers(trips: &[Trip]) -> Vec<i64> {
        trips.iter().map(|trip| trip.trip_number).collect()
    }

    #[test]
    fn no_criteria_returns_everything_in_order() {
        let filter = TripFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply_in(sample(), &ist()), sample());
    }

    #[test]
    fn mode_is_an_exact_match() {
        let trips = vec![
            trip(1, "2023-10-27T09:00", TravelMode::Car, TripPurpose::Work),
            trip(2, "2023-10-27T18:00", TravelMode::Bus, TripPurpose::Work),
        ];
        let filter = TripFilter {
            mode: Some(TravelMode::Bus),
            ..Default::default()
        };
        assert_eq!(numbers(&filter.apply_in(trips, &ist())), vec![2]);
    }

    #[test]
    fn criteria_combine() {
        let filter = TripFilter {
            mode: Some(TravelMode::Bus),
            purpose: Some(TripPurpose::Work),
            ..Default::default()
        };
        assert_eq!(numbers(&filter.apply_in(sample(), &ist())), vec![3]);
    }

    #[test]
    fn single_day_range_covers_the_whole_local_day() {
        let day = NaiveDate::from_ymd_opt(2023, 10, 28);
        let filter = TripFilter {
            start_date: day,
            end_date: day,
            ..Default::default()
        };
        assert_eq!(numbers(&filter.apply_in(sample(), &ist())), vec![2, 3]);
    }

    #[test]
    fn open_ended_ranges() {
        let from = TripFilter {
            start_date: NaiveDate::from_ymd_opt(2023, 10, 28),
            ..Default::default()
        };
        assert_eq!(numbers(&from.apply_in(sample(), &ist())), vec![2, 3, 4]);

        let until = TripFilter {
            end_date: NaiveDate::from_ymd_opt(2023, 10, 27),
            ..Default::default()
        };
        assert_eq!(numbers(&until.apply_in(sample(), &ist())), vec![1]);
    }

    #[test]
    fn filtering_twice_changes_nothing() {
        let filter = TripFilter {
            purpose: Some(TripPurpose::Work),
            start_date: NaiveDate::from_ymd_opt(2023, 10, 27),
            ..Default::default()
        };
        let once = filter.apply_in(sample(), &ist());
        let twice = filter.apply_in(once.clone(), &ist());
        assert_eq!(once, twice);
    }

    #[test]
    fn bounds_are_inclusive() {
        let filter = TripFilter {
            start_date: NaiveDate::from_ymd_opt(2023, 10, 28),
            end_date: NaiveDate::from_ymd_opt(2023, 10, 28),
            ..Default::default()
        };
        let bounds = filter.time_bounds_in(&Utc);
        let from = bounds.from.unwrap();
        let to = bounds.to.unwrap();
        assert!(bounds.contains(from));
        assert!(bounds.contains(to));
        assert!(!bounds.contains(to + chrono::Duration::milliseconds(1)));
        assert_eq!(time::to_storage(to), "2023-10-28T23:59:59.999Z");
    }

    #[test]
    fn empty_query_values_are_wildcards() {
        let filter: TripFilter = serde_json::from_value(serde_json::json!({
            "mode": "",
            "purpose": "Personal Business",
            "startDate": "2023-10-28",
            "endDate": ""
        }))
        .unwrap();
        assert_eq!(filter.mode, None);
        assert_eq!(filter.purpose, Some(TripPurpose::PersonalBusiness));
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2023, 10, 28));
        assert_eq!(filter.end_date, None);
    }

    #[test]
    fn unknown_labels_do_not_deserialize() {
        let parsed: Result<TripFilter, _> =
            serde_json::from_value(serde_json::json!({ "mode": "Plane" }));
        assert!(parsed.is_err());
    }
}
