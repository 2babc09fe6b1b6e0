//! Date keys used by upstream headers and file names

use chrono::NaiveDate;

/// Parse a time-series column header such as `1/22/20` or `3/5/2021`.
///
/// Month and day are zero-padded and two-digit years are read as `20YY`.
pub fn parse_header_date(header: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = header.trim().split('/').collect();
    if parts.len() != 3 {
        return None;
    }

    let month: u32 = parts[0].trim().parse().ok()?;
    let day: u32 = parts[1].trim().parse().ok()?;
    let year_part = parts[2].trim();
    let year: i32 = match year_part.len() {
        2 => 2000 + year_part.parse::<i32>().ok()?,
        4 => year_part.parse().ok()?,
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Daily report file stem, e.g. `04-01-2020`
pub fn daily_file_stem(date: NaiveDate) -> String {
    date.format("%m-%d-%Y").to_string()
}

/// Human-readable label used for report dates, e.g. `Apr 01, 2020`
pub fn display_date(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}
