//! Five-field cron expressions evaluated in UTC.
//!
//! Supports `*`, single values, ranges (`1-5`), lists (`1,3,5`) and steps
//! (`*/15`, `0-30/10`). Day-of-week accepts 0-7 with both 0 and 7 meaning
//! Sunday. When day-of-month and day-of-week are both restricted, a day
//! matches if either does, as in classic cron.

use crate::utils::error::{PicksError, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How many days ahead `next_after` searches before giving up.
const SEARCH_HORIZON_DAYS: i64 = 366 * 5;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CronField {
    values: BTreeSet<u32>,
    restricted: bool,
}

impl CronField {
    fn parse(expression: &str, token: &str, name: &str, min: u32, max: u32) -> Result<Self> {
        let fail = |reason: String| PicksError::ScheduleError {
            expression: expression.to_string(),
            reason: format!("{} field '{}': {}", name, token, reason),
        };

        let mut values = BTreeSet::new();
        for part in token.split(',') {
            let (range, step) = match part.split_once('/') {
                Some((range, step)) => {
                    let step: u32 = step
                        .parse()
                        .map_err(|_| fail(format!("invalid step '{}'", step)))?;
                    if step == 0 {
                        return Err(fail("step must be positive".to_string()));
                    }
                    (range, step)
                }
                None => (part, 1),
            };

            let (start, end) = if range == "*" {
                (min, max)
            } else if let Some((a, b)) = range.split_once('-') {
                (parse_value(a, &fail)?, parse_value(b, &fail)?)
            } else {
                let value = parse_value(range, &fail)?;
                // `5/15` means every 15 starting at 5
                if part.contains('/') {
                    (value, max)
                } else {
                    (value, value)
                }
            };

            if start < min || end > max {
                return Err(fail(format!("values must be within {}-{}", min, max)));
            }
            if start > end {
                return Err(fail(format!("range {}-{} is reversed", start, end)));
            }

            values.extend((start..=end).step_by(step as usize));
        }

        Ok(Self {
            values,
            restricted: !token.starts_with('*'),
        })
    }

    fn contains(&self, value: u32) -> bool {
        self.values.contains(&value)
    }
}

fn parse_value<F>(raw: &str, fail: &F) -> Result<u32>
where
    F: Fn(String) -> PicksError,
{
    raw.parse()
        .map_err(|_| fail(format!("'{}' is not a number", raw)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    minutes: CronField,
    hours: CronField,
    days_of_month: CronField,
    months: CronField,
    days_of_week: CronField,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(PicksError::ScheduleError {
                expression: expression.to_string(),
                reason: format!("expected 5 fields, found {}", fields.len()),
            });
        }

        let mut days_of_week = CronField::parse(expression, fields[4], "day-of-week", 0, 7)?;
        if days_of_week.values.remove(&7) {
            days_of_week.values.insert(0);
        }

        Ok(Self {
            expression: fields.join(" "),
            minutes: CronField::parse(expression, fields[0], "minute", 0, 59)?,
            hours: CronField::parse(expression, fields[1], "hour", 0, 23)?,
            days_of_month: CronField::parse(expression, fields[2], "day-of-month", 1, 31)?,
            months: CronField::parse(expression, fields[3], "month", 1, 12)?,
            days_of_week,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        if !self.months.contains(date.month()) {
            return false;
        }

        let dom = self.days_of_month.contains(date.day());
        let dow = self
            .days_of_week
            .contains(date.weekday().num_days_from_sunday());

        if self.days_of_month.restricted && self.days_of_week.restricted {
            dom || dow
        } else {
            dom && dow
        }
    }

    /// Minute precision; seconds are ignored.
    pub fn matches(&self, at: DateTime<Utc>) -> bool {
        self.day_matches(at.date_naive())
            && self.hours.contains(at.hour())
            && self.minutes.contains(at.minute())
    }

    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = after
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))?
            + Duration::minutes(1);

        let mut date = start.date_naive();
        for _ in 0..SEARCH_HORIZON_DAYS {
            if self.day_matches(date) {
                for &hour in &self.hours.values {
                    for &minute in &self.minutes.values {
                        let candidate = Utc.from_utc_datetime(&date.and_hms_opt(hour, minute, 0)?);
                        if candidate >= start {
                            return Some(candidate);
                        }
                    }
                }
            }
            date = date.succ_opt()?;
        }

        None
    }

    pub fn upcoming(&self, from: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        let mut times = Vec::with_capacity(count);
        let mut cursor = from;
        while times.len() < count {
            match self.next_after(cursor) {
                Some(next) => {
                    times.push(next);
                    cursor = next;
                }
                None => break,
            }
        }
        times
    }
}

impl FromStr for CronSchedule {
    type Err = PicksError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Why a job is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    Scheduled { at: DateTime<Utc> },
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Manual => f.write_str("manual dispatch"),
            Trigger::Scheduled { at } => write!(f, "schedule tick at {}", at.format("%Y-%m-%d %H:%M UTC")),
        }
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| PicksError::InvalidConfigValueError {
            field: "schedule.display_timezone".to_string(),
            value: name.to_string(),
            reason: e.to_string(),
        })
}

/// `2025-06-02 03:32 UTC (09:02 IST)` style label.
pub fn describe_fire_time(at: DateTime<Utc>, zone: Tz) -> String {
    let local = at.with_timezone(&zone);
    format!(
        "{} {} ({} {})",
        at.format("%Y-%m-%d %H:%M UTC"),
        at.format("%a"),
        local.format("%H:%M"),
        local.format("%Z")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::DEFAULT_SCHEDULE;
    use chrono::Weekday;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_default_schedule_fires_weekdays_at_0332_utc() {
        let schedule = CronSchedule::parse(DEFAULT_SCHEDULE).unwrap();

        // 2025-06-06 is a Friday
        let next = schedule.next_after(utc(2025, 6, 6, 0, 0)).unwrap();
        assert_eq!(next, utc(2025, 6, 6, 3, 32));

        // After Friday's run the next one is Monday
        let next = schedule.next_after(next).unwrap();
        assert_eq!(next, utc(2025, 6, 9, 3, 32));
        assert_eq!(next.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_default_schedule_covers_exactly_monday_to_friday() {
        let schedule = CronSchedule::parse(DEFAULT_SCHEDULE).unwrap();
        let week = schedule.upcoming(utc(2025, 6, 1, 12, 0), 10);

        assert_eq!(week.len(), 10);
        for at in &week {
            assert_eq!((at.hour(), at.minute()), (3, 32));
            assert!(!matches!(at.weekday(), Weekday::Sat | Weekday::Sun));
        }
        assert!(!schedule.matches(utc(2025, 6, 7, 3, 32)));
        assert!(schedule.matches(utc(2025, 6, 5, 3, 32)));
        assert!(!schedule.matches(utc(2025, 6, 5, 3, 33)));
    }

    #[test]
    fn test_default_schedule_is_0902_in_kolkata() {
        let schedule = CronSchedule::parse(DEFAULT_SCHEDULE).unwrap();
        let next = schedule.next_after(utc(2025, 6, 2, 0, 0)).unwrap();
        let label = describe_fire_time(next, parse_timezone("Asia/Kolkata").unwrap());

        assert_eq!(label, "2025-06-02 03:32 UTC Mon (09:02 IST)");
    }

    #[test]
    fn test_next_after_is_strict() {
        let schedule = CronSchedule::parse("*/15 * * * *").unwrap();
        assert_eq!(
            schedule.next_after(utc(2025, 1, 1, 10, 15)).unwrap(),
            utc(2025, 1, 1, 10, 30)
        );
        assert_eq!(
            schedule.next_after(utc(2025, 1, 1, 23, 50)).unwrap(),
            utc(2025, 1, 2, 0, 0)
        );
    }

    #[test]
    fn test_sunday_as_seven() {
        let schedule = CronSchedule::parse("0 12 * * 7").unwrap();
        let next = schedule.next_after(utc(2025, 6, 2, 0, 0)).unwrap();
        assert_eq!(next.weekday(), Weekday::Sun);
    }

    #[test]
    fn test_day_of_month_or_day_of_week() {
        // 1st of the month OR any Monday
        let schedule = CronSchedule::parse("0 0 1 * 1").unwrap();
        assert!(schedule.matches(utc(2025, 6, 1, 0, 0))); // Sunday the 1st
        assert!(schedule.matches(utc(2025, 6, 2, 0, 0))); // Monday the 2nd
        assert!(!schedule.matches(utc(2025, 6, 3, 0, 0)));
    }

    #[test]
    fn test_lists_and_stepped_ranges() {
        let schedule = CronSchedule::parse("0,30 9-17/4 * * *").unwrap();
        let times = schedule.upcoming(utc(2025, 1, 1, 0, 0), 4);
        let hm: Vec<(u32, u32)> = times.iter().map(|t| (t.hour(), t.minute())).collect();
        assert_eq!(hm, vec![(9, 0), (9, 30), (13, 0), (13, 30)]);
    }

    #[test]
    fn test_impossible_date_never_fires() {
        let schedule = CronSchedule::parse("0 0 30 2 *").unwrap();
        assert!(schedule.next_after(utc(2025, 1, 1, 0, 0)).is_none());
        assert!(schedule.upcoming(utc(2025, 1, 1, 0, 0), 3).is_empty());
    }

    #[test]
    fn test_rejects_malformed_expressions() {
        for bad in [
            "32 3 * *",
            "32 3 * * 1-5 extra",
            "60 3 * * *",
            "32 24 * * *",
            "32 3 0 * *",
            "32 3 * 13 *",
            "32 3 * * 8",
            "32 3 * * 5-1",
            "*/0 * * * *",
            "a 3 * * *",
        ] {
            let err = CronSchedule::parse(bad).unwrap_err();
            assert!(
                matches!(err, PicksError::ScheduleError { .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_trigger_display() {
        assert_eq!(Trigger::Manual.to_string(), "manual dispatch");
        let at = utc(2025, 6, 2, 3, 32);
        assert_eq!(
            Trigger::Scheduled { at }.to_string(),
            "schedule tick at 2025-06-02 03:32 UTC"
        );
    }
}
