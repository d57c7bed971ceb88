use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| clean_text(&text))
        .filter(|text| !text.is_empty())
}

pub fn to_timezone_datetime(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Tz>> {
    let naive = NaiveDateTime::new(date, time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(dt, _) => Some(dt),
        LocalResult::None => None,
    }
}

/// Wall-clock time in `tz` as a UTC ISO-8601 string (`2025-10-08T02:00:00.000Z`).
/// Times that fall into a DST gap are read as UTC.
pub fn local_to_iso(date: NaiveDate, time: NaiveTime, tz: Tz) -> String {
    let utc = match to_timezone_datetime(date, time, tz) {
        Some(dt) => dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&NaiveDateTime::new(date, time)),
    };
    to_iso(utc)
}

pub fn to_iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    #[test]
    fn converts_venue_local_time_to_utc() {
        let iso = local_to_iso(date(2025, 10, 8), time(19, 0), chrono_tz::America::Boise);
        assert_eq!(iso, "2025-10-09T01:00:00.000Z");
    }

    #[test]
    fn dst_gap_reads_as_utc() {
        let iso = local_to_iso(date(2025, 3, 9), time(2, 30), chrono_tz::America::New_York);
        assert_eq!(iso, "2025-03-09T02:30:00.000Z");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean_text("  Harbor \n  Stage "), "Harbor Stage");
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(Some(" Studio  12".to_string())).as_deref(), Some("Studio 12"));
    }
}
