//! Lenient parsing of the date cells found in expense sheets.
//!
//! Sheets hold dates as whatever the author typed or whatever the sheet's locale rendered, so a
//! single column can contain `2024-01-31`, `31/01/2024`, `31 Jan 2024` or `2024-01-31 09:15:00`.
//! Anything that cannot be read as a calendar date is `None`, never an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Decides how an ambiguous numeric date such as `01/02/2024` is read.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `01/02/2024` is the 1st of February.
    #[default]
    DayFirst,
    /// `01/02/2024` is the 2nd of January.
    MonthFirst,
}

serde_plain::derive_display_from_serialize!(DateOrder);
serde_plain::derive_fromstr_from_deserialize!(DateOrder);

/// Formats with a written month name. Commas are removed before these are tried.
const NAMED_MONTH_FORMATS: &[&str] = &["%d %B %Y", "%B %d %Y", "%A %d %B %Y", "%A %B %d %Y"];

/// Parses `s` into a calendar date, returning `None` if that is not possible.
///
/// Numeric dates may be separated by `/`, `-` or `.`. A leading four-digit year is always read as
/// year-month-day. Otherwise `order` decides between day-first and month-first, and if the
/// preferred reading is not a real date the other one is tried. Two-digit years are placed in
/// 1970–2069. A time of day after the date is ignored.
pub fn parse_date(s: &str, order: DateOrder) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let without_commas = trimmed.replace(',', " ");
    let words = without_commas.split_whitespace().collect::<Vec<_>>().join(" ");
    for format in NAMED_MONTH_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&words, format) {
            return Some(date);
        }
    }

    // Anything after a space or a 'T' is a time of day.
    let date_part = trimmed
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(trimmed);
    parse_numeric(date_part, order)
}

fn parse_numeric(s: &str, order: DateOrder) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split(['/', '-', '.']).collect();
    if parts.len() != 3 {
        return None;
    }
    if parts
        .iter()
        .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }

    if parts[0].len() == 4 {
        let year = parts[0].parse().ok()?;
        let month = parts[1].parse().ok()?;
        let day = parts[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let year = match parts[2].len() {
        4 => parts[2].parse().ok()?,
        2 => {
            let yy: i32 = parts[2].parse().ok()?;
            if yy < 70 {
                2000 + yy
            } else {
                1900 + yy
            }
        }
        _ => return None,
    };
    let first: u32 = parts[0].parse().ok()?;
    let second: u32 = parts[1].parse().ok()?;
    let (day, month) = match order {
        DateOrder::DayFirst => (first, second),
        DateOrder::MonthFirst => (second, first),
    };
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| NaiveDate::from_ymd_opt(year, day, month))
}
