use chrono::{
    DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, SubsecRound,
    TimeZone, Utc,
};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parses an RFC 3339 timestamp, or a naive `datetime-local` value which is
/// read as wall-clock time in `tz`.
///
/// The result is cut to whole milliseconds and must fall in the years
/// 0000-9999 (UTC), which is exactly what [`to_storage`] can write and
/// [`from_storage`] can read back.
pub fn parse_timestamp_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let parsed = match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
            .map(|dt| dt.with_timezone(&Utc)),
    };
    parsed.and_then(storable)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    parse_timestamp_in(raw, &Local)
}

/// 00:00:00.000 of `date` in `tz`.
pub fn start_of_day_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// 23:59:59.999 of `date` in `tz`.
pub fn end_of_day_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Utc>> {
    let last_milli = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?;
    tz.from_local_datetime(&date.and_time(last_milli))
        .latest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Fixed-width UTC form used for storage, so text order equals time order.
pub fn to_storage(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn storable(ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (0..=9999)
        .contains(&ts.year())
        .then(|| ts.trunc_subsecs(3))
}

pub fn from_storage(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

pub fn format_local(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string()
}
