use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::NotifyError;

const DAY_NAMES: [&str; 7] = [
    "måndag", "tisdag", "onsdag", "torsdag", "fredag", "lördag", "söndag",
];

pub fn parse_time(s: &str) -> Result<NaiveTime, NotifyError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| NotifyError::InvalidSchedule(format!("time '{s}' is not HH:MM")))
}

/// Parse `all`, `weekdays`, `weekends` or a comma list of day numbers
/// (0 = Monday).
pub fn parse_weekdays(input: &str) -> Result<Vec<u8>, NotifyError> {
    let days = match input.trim().to_lowercase().as_str() {
        "all" => (0..7).collect(),
        "weekdays" => (0..5).collect(),
        "weekends" => vec![5, 6],
        list => {
            let mut days = Vec::new();
            for part in list.split(',') {
                let day: u8 = part.trim().parse().map_err(|_| {
                    NotifyError::InvalidSchedule(format!("'{}' is not a day number", part.trim()))
                })?;
                if day > 6 {
                    return Err(NotifyError::InvalidSchedule(format!(
                        "day {day} is out of range 0-6"
                    )));
                }
                if !days.contains(&day) {
                    days.push(day);
                }
            }
            days.sort_unstable();
            days
        }
    };
    Ok(days)
}

fn weekday_of(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// Next send time: today at `time` if today is a send day and `time`
/// has not passed, otherwise the next send day.
pub fn next_scheduled_time(weekdays: &[u8], time: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let mut date = now.date();
    if !weekdays.contains(&weekday_of(date)) || now.time() > time {
        for _ in 0..8 {
            date += Duration::days(1);
            if weekdays.contains(&weekday_of(date)) {
                break;
            }
        }
    }
    date.and_time(time)
}

/// Most recent send slot at or before `now`, looking back one week.
pub fn previous_scheduled_time(weekdays: &[u8], time: NaiveTime, now: NaiveDateTime) -> Option<NaiveDateTime> {
    (0..8)
        .map(|back| now.date() - Duration::days(back))
        .filter(|date| weekdays.contains(&weekday_of(*date)))
        .map(|date| date.and_time(time))
        .find(|slot| *slot <= now)
}

/// Whether a scheduled report should go out now.
pub fn is_due(weekdays: &[u8], time: NaiveTime, last_sent: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
    match last_sent {
        None => true,
        Some(last) => previous_scheduled_time(weekdays, time, now).is_some_and(|slot| slot > last),
    }
}

/// Accepts `%Y-%m-%d %H:%M:%S`, `%Y-%m-%d %H:%M` or a bare date.
pub fn parse_last_sent(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn format_weekdays(weekdays: &[u8]) -> String {
    if weekdays.len() == 7 {
        return "alla dagar".to_string();
    }
    if weekdays.len() == 5 && weekdays.iter().all(|d| *d < 5) {
        return "vardagar".to_string();
    }
    let mut sorted: Vec<u8> = weekdays.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .filter_map(|d| DAY_NAMES.get(*d as usize))
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}
