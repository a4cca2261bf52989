use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

/// Default length of a freshly created project.
pub const DEFAULT_PROJECT_DAYS: i64 = 90;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DISPLAY_DATE: &[BorrowedFormatItem<'static>] = format_description!("[day].[month].[year]");

/// Today's calendar date in the local timezone, falling back to UTC when the
/// local offset cannot be determined.
pub fn today() -> Date {
    let now = OffsetDateTime::now_utc();
    match UtcOffset::current_local_offset() {
        Ok(offset) => now.to_offset(offset).date(),
        Err(_) => now.date(),
    }
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`).
///
/// A date-time such as `2024-01-08T09:30:00` is accepted as well; only the
/// date part is kept.
pub fn parse_iso_date(value: &str) -> Option<Date> {
    let value = value.trim();
    if let Ok(date) = Date::parse(value, ISO_DATE) {
        return Some(date);
    }
    let (head, tail) = (value.get(..10)?, &value[10..]);
    if tail.starts_with('T') || tail.starts_with(' ') {
        Date::parse(head, ISO_DATE).ok()
    } else {
        None
    }
}

/// `dd.mm.yyyy`, the format used in list labels.
pub fn format_display_date(date: Date) -> String {
    date.format(DISPLAY_DATE).unwrap_or_default()
}

pub fn add_days(date: Date, days: i64) -> Date {
    date.checked_add(Duration::days(days)).unwrap_or(date)
}

/// Signed number of whole days from `from` to `to`.
pub fn days_between(from: Date, to: Date) -> i64 {
    (to - from).whole_days()
}

/// Two-letter German weekday abbreviation.
pub fn weekday_short(date: Date) -> &'static str {
    match date.weekday().number_from_monday() {
        1 => "Mo",
        2 => "Di",
        3 => "Mi",
        4 => "Do",
        5 => "Fr",
        6 => "Sa",
        _ => "So",
    }
}
