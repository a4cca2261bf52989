//! Date-driven project progress.

use serde::Serialize;
use time::Date;

use crate::time_utils::{days_between, parse_iso_date};
use crate::types::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidRange {
    UnparsableStart,
    UnparsableEnd,
    EndBeforeStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Progress {
    Percent(u8),
    Invalid(InvalidRange),
}

/// Progress for dates given as ISO strings.
pub fn progress(start: &str, end: &str, today: Date) -> Progress {
    let Some(start) = parse_iso_date(start) else {
        return Progress::Invalid(InvalidRange::UnparsableStart);
    };
    let Some(end) = parse_iso_date(end) else {
        return Progress::Invalid(InvalidRange::UnparsableEnd);
    };
    progress_between(start, end, today)
}

/// Share of the project's run time that has elapsed by `today`, floored to a
/// whole percent.
pub fn progress_between(start: Date, end: Date, today: Date) -> Progress {
    if end < start {
        return Progress::Invalid(InvalidRange::EndBeforeStart);
    }
    if today <= start {
        return Progress::Percent(0);
    }
    if today >= end {
        return Progress::Percent(100);
    }

    let total = days_between(start, end).max(1);
    let elapsed = days_between(start, today);
    let pct = (100 * elapsed / total).clamp(0, 100);
    Progress::Percent(pct as u8)
}

pub fn project_progress(project: &Project, today: Date) -> Progress {
    progress_between(project.start_date, project.end_date, today)
}
