//! Cell-level parsing shared by the normalizers: dates, times, durations,
//! header names and free text.

use calllog_io::Cell;
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

/// Day zero of the Excel 1900 date system (accounts for the 1900 leap bug).
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Largest serial Excel accepts (9999-12-31).
const MAX_SERIAL: f64 = 2_958_466.0;

const DATE_FORMATS: &[&str] = &[
    // Two-digit year first: "%Y" would read "1/5/24" as year 24
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%b-%Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I:%M:%S %p",
];

const TIME_FORMATS: &[&str] = &[
    "%I:%M %p",
    "%I:%M:%S %p",
    "%I:%M%p",
    "%I:%M:%S%p",
    "%H:%M:%S",
    "%H:%M",
    "%H:%M:%S%.f",
];

/// Capitalize-first-letter header convention: trimmed, first character
/// upper-case, the rest lower-case ("IN/OUT NUMBER" -> "In/out number").
pub fn header_name(raw: &str) -> String {
    let raw = raw.trim();
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Cell display text; whitespace-only text is absent.
pub fn text(cell: &Cell) -> Option<String> {
    cell.text()
}

/// Cell text with runs of whitespace collapsed to single spaces.
pub fn collapse_whitespace(cell: &Cell) -> Option<String> {
    let raw = cell.text()?;
    let joined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// A non-negative whole number. Whole-valued floats (`12.0`) are accepted,
/// fractional or negative values are not.
pub fn parse_count(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Number(n) => whole_non_negative(*n),
        Cell::Text(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return (n >= 0).then_some(n);
            }
            s.parse::<f64>().ok().and_then(whole_non_negative)
        }
        Cell::Empty | Cell::Bool(_) | Cell::DateTime(_) => None,
    }
}

fn whole_non_negative(n: f64) -> Option<i64> {
    if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n < i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

/// Calendar date from a text date, a text date-time, or an Excel serial.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Number(n) | Cell::DateTime(n) => serial_date(*n),
        Cell::Text(s) => {
            let s = s.trim();
            for fmt in DATE_FORMATS {
                if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                    return Some(d);
                }
            }
            for fmt in DATETIME_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(dt.date());
                }
            }
            s.parse::<f64>().ok().and_then(serial_date)
        }
        Cell::Empty | Cell::Bool(_) => None,
    }
}

/// Time of day from text ("2:05 PM", "14:05", "14:05:09"), a text date-time,
/// or the fractional part of an Excel serial.
pub fn parse_time(cell: &Cell) -> Option<NaiveTime> {
    match cell {
        Cell::Number(n) | Cell::DateTime(n) => serial_time(*n),
        Cell::Text(s) => {
            let mut s = s.trim().to_uppercase();
            // Carrier reports sometimes abbreviate the meridiem to A/P
            if s.ends_with('A') || s.ends_with('P') {
                s.push('M');
            }
            for fmt in TIME_FORMATS {
                if let Ok(t) = NaiveTime::parse_from_str(&s, fmt) {
                    return Some(t);
                }
            }
            for fmt in DATETIME_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(&s, fmt) {
                    return Some(dt.time());
                }
            }
            // Only a bare day fraction; "0930" or "14" is not a time
            s.parse::<f64>()
                .ok()
                .filter(|f| (0.0..1.0).contains(f))
                .and_then(serial_time)
        }
        Cell::Empty | Cell::Bool(_) => None,
    }
}

fn serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..MAX_SERIAL).contains(&serial) {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(serial.floor() as u64))
}

fn serial_time(serial: f64) -> Option<NaiveTime> {
    if !serial.is_finite() || serial < 0.0 || serial >= MAX_SERIAL {
        return None;
    }
    let secs = ((serial - serial.floor()) * 86_400.0).round() as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs.min(86_399), 0)
}
