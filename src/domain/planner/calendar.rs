//! Month-calendar rendering.
//!
//! Pure text rendering for the `/calendar` view: a Monday-first grid with a
//! `*` marker on days that carry at least one deadline.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Number of days in the given month, or `None` for an invalid year/month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next_first.signed_duration_since(first).num_days() as u32)
}

/// Monday-first week rows for the month; `None` cells pad the first and
/// last weeks.
pub fn month_grid(year: i32, month: u32) -> Option<Vec<[Option<u32>; 7]>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let days = days_in_month(year, month)?;
    let lead = first.weekday().num_days_from_monday() as usize;

    let mut weeks = Vec::new();
    let mut week = [None; 7];
    let mut col = lead;

    for day in 1..=days {
        week[col] = Some(day);
        col += 1;
        if col == 7 {
            weeks.push(week);
            week = [None; 7];
            col = 0;
        }
    }
    if col > 0 {
        weeks.push(week);
    }
    Some(weeks)
}

/// Renders the month as monospace text with `*` after marked days.
///
/// Returns `None` for an invalid year/month.
pub fn render_month(year: i32, month: u32, marked: &BTreeSet<u32>) -> Option<String> {
    let weeks = month_grid(year, month)?;

    let mut out = String::from("Mo  Tu  We  Th  Fr  Sa  Su\n");
    for week in weeks {
        let mut row = String::new();
        for cell in week {
            match cell {
                Some(day) => {
                    let marker = if marked.contains(&day) { '*' } else { ' ' };
                    row.push_str(&format!("{:2}{} ", day, marker));
                }
                None => row.push_str("    "),
            }
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }
    Some(out)
}
