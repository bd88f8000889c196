//! Week calendar of activities.
//!
//! Weeks run Monday to Sunday. Activities land on the calendar day their due
//! time falls on in the caller's time zone.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::Activity;

/// Monday of the week containing `date`.
///
/// # Errors
///
/// Returns an invalid-value error when that Monday is out of range.
pub fn week_start(date: NaiveDate) -> Result<NaiveDate> {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).ok_or_else(|| out_of_range(date))
}

/// The same weekday one week earlier.
///
/// # Errors
///
/// Returns an invalid-value error past the earliest supported date.
pub fn previous_week(anchor: NaiveDate) -> Result<NaiveDate> {
    anchor
        .checked_sub_days(Days::new(7))
        .ok_or_else(|| out_of_range(anchor))
}

/// The same weekday one week later.
///
/// # Errors
///
/// Returns an invalid-value error past the latest supported date.
pub fn next_week(anchor: NaiveDate) -> Result<NaiveDate> {
    anchor
        .checked_add_days(Days::new(7))
        .ok_or_else(|| out_of_range(anchor))
}

fn out_of_range(date: NaiveDate) -> Error {
    Error::invalid_value("date", format!("the week of {date} is out of range"))
}

/// Activities keyed by the calendar day they are due, each day in due order.
#[must_use]
pub fn group_by_day<'a, Tz: TimeZone>(
    activities: &'a [Activity],
    tz: &Tz,
) -> BTreeMap<NaiveDate, Vec<&'a Activity>> {
    let mut days: BTreeMap<NaiveDate, Vec<&Activity>> = BTreeMap::new();
    for activity in activities {
        let day = activity.due_date.with_timezone(tz).date_naive();
        days.entry(day).or_default().push(activity);
    }
    for list in days.values_mut() {
        list.sort_by_key(|a| a.due_date);
    }
    days
}

/// One day column of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay<'a> {
    /// The date.
    pub date: NaiveDate,
    /// Whether this is the current day.
    pub is_today: bool,
    /// Activities due that day, in due order.
    pub activities: Vec<&'a Activity>,
}

/// Seven days starting on a Monday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekView<'a> {
    /// Monday.
    pub start: NaiveDate,
    /// Sunday.
    pub end: NaiveDate,
    /// The seven days.
    pub days: Vec<CalendarDay<'a>>,
}

impl WeekView<'_> {
    /// Activities across the whole week.
    #[must_use]
    pub fn activity_count(&self) -> usize {
        self.days.iter().map(|d| d.activities.len()).sum()
    }
}

/// Build the week containing `anchor`.
///
/// # Errors
///
/// Returns an invalid-value error when the week runs past the supported
/// date range.
pub fn week_view<'a, Tz: TimeZone>(
    activities: &'a [Activity],
    anchor: NaiveDate,
    today: NaiveDate,
    tz: &Tz,
) -> Result<WeekView<'a>> {
    let start = week_start(anchor)?;
    let end = start
        .checked_add_days(Days::new(6))
        .ok_or_else(|| out_of_range(anchor))?;
    let mut by_day = group_by_day(activities, tz);

    let days: Vec<CalendarDay<'a>> = start
        .iter_days()
        .take(7)
        .map(|date| CalendarDay {
            date,
            is_today: date == today,
            activities: by_day.remove(&date).unwrap_or_default(),
        })
        .collect();

    Ok(WeekView { start, end, days })
}

/// Build a due timestamp from a form's date and `HH:MM` time fields, read
/// in `tz`.
///
/// # Errors
///
/// Returns an invalid-value error when the time does not parse or does not
/// exist on that date in `tz`.
pub fn combine_date_time<Tz: TimeZone>(
    date: NaiveDate,
    time: &str,
    tz: &Tz,
) -> Result<DateTime<Utc>> {
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map_err(|e| Error::invalid_value("time", format!("expected HH:MM: {e}")))?;
    let local = date.and_time(time);
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::invalid_value("time", format!("{local} does not exist in this time zone")))
}

/// Parse a `YYYY-MM-DD` date field.
///
/// # Errors
///
/// Returns an invalid-value error when the date does not parse.
pub fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| Error::invalid_value("date", format!("expected YYYY-MM-DD: {e}")))
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Weekday};

    use super::*;
    use crate::model::ActivityType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn activity(id: &str, due: DateTime<Utc>) -> Activity {
        Activity {
            id: id.into(),
            title: id.into(),
            description: None,
            lead_id: "led-1".into(),
            user_id: "usr-1".into(),
            due_date: due,
            completed: false,
            created_at: due,
            activity_type: ActivityType::Meeting,
        }
    }

    fn due(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_week_starts_on_monday() {
        // 2026-10-19 is a Monday.
        assert_eq!(week_start(date(2026, 10, 19)).unwrap(), date(2026, 10, 19));
        assert_eq!(week_start(date(2026, 10, 22)).unwrap(), date(2026, 10, 19));
        assert_eq!(week_start(date(2026, 10, 25)).unwrap(), date(2026, 10, 19));
        assert_eq!(week_start(date(2026, 10, 26)).unwrap(), date(2026, 10, 26));
        assert_eq!(week_start(date(2026, 10, 22)).unwrap().weekday(), Weekday::Mon);
    }

    #[test]
    fn test_week_navigation() {
        assert_eq!(previous_week(date(2026, 1, 3)).unwrap(), date(2025, 12, 27));
        assert_eq!(next_week(date(2026, 12, 30)).unwrap(), date(2027, 1, 6));
    }

    #[test]
    fn test_week_navigation_at_range_limits() {
        let err = next_week(NaiveDate::MAX).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { field: "date", .. }));
        assert!(previous_week(NaiveDate::MIN).is_err());
        assert!(week_view(&[], NaiveDate::MAX, NaiveDate::MAX, &Utc).is_err());
    }

    #[test]
    fn test_week_view_places_activities() {
        let activities = vec![
            activity("act-tue-late", due(2026, 10, 20, 16)),
            activity("act-tue-early", due(2026, 10, 20, 9)),
            activity("act-sun", due(2026, 10, 25, 23)),
            activity("act-next-week", due(2026, 10, 26, 0)),
        ];

        let view =
            week_view(&activities, date(2026, 10, 23), date(2026, 10, 21), &Utc).unwrap();
        assert_eq!(view.start, date(2026, 10, 19));
        assert_eq!(view.end, date(2026, 10, 25));
        assert_eq!(view.days.len(), 7);
        assert_eq!(view.activity_count(), 3);

        let tuesday: Vec<&str> = view.days[1].activities.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(tuesday, ["act-tue-early", "act-tue-late"]);
        assert_eq!(view.days[6].activities.len(), 1);
        assert!(view.days[2].is_today);
        assert!(view.days.iter().filter(|d| d.is_today).count() == 1);
    }

    #[test]
    fn test_group_by_day_uses_zone() {
        let activities = vec![activity("act-1", due(2026, 10, 25, 23))];
        let east = FixedOffset::east_opt(2 * 3600).unwrap();

        let days = group_by_day(&activities, &east);
        assert!(days.contains_key(&date(2026, 10, 26)));

        let view =
            week_view(&activities, date(2026, 10, 20), date(2026, 10, 20), &east).unwrap();
        assert_eq!(view.activity_count(), 0);
    }

    #[test]
    fn test_combine_date_time() {
        let at = combine_date_time(date(2026, 10, 21), "14:30", &Utc).unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 10, 21, 14, 30, 0).unwrap());

        let west = FixedOffset::west_opt(3 * 3600).unwrap();
        let at = combine_date_time(date(2026, 10, 21), "23:15", &west).unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 10, 22, 2, 15, 0).unwrap());
    }

    #[test]
    fn test_combine_date_time_rejects_garbage() {
        let err = combine_date_time(date(2026, 10, 21), "2pm", &Utc).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { field: "time", .. }));
        assert!(combine_date_time(date(2026, 10, 21), "25:00", &Utc).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(" 2026-10-19 ").unwrap(), date(2026, 10, 19));
        assert!(parse_date("19/10/2026").is_err());
    }
}
