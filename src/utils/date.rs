// src/utils/date.rs

//! Lenient date parsing and cutoff-window computation.
//!
//! Listing pages show dates in half a dozen formats ("Jun 09, 2025",
//! "09 Jun 2025", "2025-06-09", with or without ordinal suffixes), so
//! parsing tries a fixed list of formats before falling back to regex.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;
use std::sync::OnceLock;

const FORMATS: &[&str] = &[
    "%d %B %Y",  // 01 January 2025
    "%d %b %Y",  // 01 Jan 2025
    "%B %d, %Y", // January 01, 2025
    "%b %d, %Y", // Jan 01, 2025
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
];

fn dmy_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2})[-./](\d{1,2})[-./](\d{4})").expect("valid regex"))
}

fn ymd_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})[-./](\d{1,2})[-./](\d{1,2})").expect("valid regex"))
}

fn ordinal_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)(st|nd|rd|th)").expect("valid regex"))
}

/// Parse a published-date string in any of the supported formats.
///
/// Returns `None` for empty, "N/A", or unrecognizable input; callers
/// treat unparseable dates as out of scope rather than crashing.
pub fn parse_listing_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.trim();
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("n/a") {
        return None;
    }
    let cleaned = ordinal_pattern().replace_all(cleaned, "$1");

    for fmt in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned.trim(), fmt) {
            return Some(date);
        }
    }

    // Regex fallback for dates embedded in longer text
    if let Some(caps) = ymd_pattern().captures(&cleaned) {
        let (y, m, d) = (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some(caps) = dmy_pattern().captures(&cleaned) {
        let (d, m, y) = (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    None
}

/// The publication window in scope for one run.
///
/// Normal days cover yesterday only; a Monday run covers the weekend
/// (Saturday and Sunday) since neither publisher posts on weekends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoffWindow {
    /// Earliest date in scope
    pub start: NaiveDate,
    /// Latest date in scope
    pub end: NaiveDate,
}

impl CutoffWindow {
    /// Window for a run started on `today`.
    pub fn for_run_date(today: NaiveDate) -> Self {
        let yesterday = today - Duration::days(1);
        if today.weekday() == Weekday::Mon {
            Self {
                start: today - Duration::days(2),
                end: yesterday,
            }
        } else {
            Self {
                start: yesterday,
                end: yesterday,
            }
        }
    }

    /// Whether a published date falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Whether a published date is older than the window, the walker's
    /// exit condition on a reverse-chronological listing.
    pub fn is_past(&self, date: NaiveDate) -> bool {
        date < self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_publisher_formats() {
        assert_eq!(parse_listing_date("Jun 09, 2025"), Some(d(2025, 6, 9)));
        assert_eq!(parse_listing_date("09 Jun 2025"), Some(d(2025, 6, 9)));
        assert_eq!(parse_listing_date("2025-06-09"), Some(d(2025, 6, 9)));
        assert_eq!(parse_listing_date("09/06/2025"), Some(d(2025, 6, 9)));
        assert_eq!(parse_listing_date("9th Jun 2025"), Some(d(2025, 6, 9)));
    }

    #[test]
    fn rejects_junk() {
        assert_eq!(parse_listing_date(""), None);
        assert_eq!(parse_listing_date("N/A"), None);
        assert_eq!(parse_listing_date("pinned"), None);
    }

    #[test]
    fn regex_fallback_in_longer_text() {
        assert_eq!(
            parse_listing_date("Published on 2025-06-09 by staff"),
            Some(d(2025, 6, 9))
        );
    }

    #[test]
    fn weekday_window_is_yesterday() {
        // 2025-06-11 is a Wednesday
        let w = CutoffWindow::for_run_date(d(2025, 6, 11));
        assert_eq!(w.start, d(2025, 6, 10));
        assert_eq!(w.end, d(2025, 6, 10));
        assert!(w.contains(d(2025, 6, 10)));
        assert!(!w.contains(d(2025, 6, 11)));
        assert!(w.is_past(d(2025, 6, 9)));
    }

    #[test]
    fn monday_window_covers_weekend() {
        // 2025-06-09 is a Monday
        let w = CutoffWindow::for_run_date(d(2025, 6, 9));
        assert_eq!(w.start, d(2025, 6, 7));
        assert_eq!(w.end, d(2025, 6, 8));
        assert!(w.contains(d(2025, 6, 7)));
        assert!(w.contains(d(2025, 6, 8)));
        assert!(w.is_past(d(2025, 6, 6)));
    }
}
