use std::sync::OnceLock;

use chrono::{Datelike, Local, NaiveDate, Utc};
use regex::Regex;

/// Token every receipt number starts with.
pub const RECEIPT_PREFIX: &str = "BKGK";

/// Source of "today". Numbering and finalization read the date only through
/// this trait so tests can pin the calendar.
pub trait Clock {
    fn today(&self) -> NaiveDate;

    /// Unix epoch milliseconds, used for history timestamps.
    fn now_millis(&self) -> i64;

    fn year(&self) -> i32 {
        self.today().year()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub date: NaiveDate,
    pub millis: i64,
}

#[cfg(test)]
impl FixedClock {
    pub fn on(year: i32, month: u32, day: u32) -> Self {
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        let millis = date
            .and_hms_opt(9, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        Self { date, millis }
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }

    fn now_millis(&self) -> i64 {
        self.millis
    }
}

/// `BKGK/<year>/<number>`, with the number zero-padded to at least 4 digits.
pub fn format_receipt_number(year: i32, number: u32) -> String {
    format!("{RECEIPT_PREFIX}/{year}/{number:04}")
}

/// Next receipt number for a counter last advanced in `last_year`.
/// The sequence restarts at 1 whenever the calendar year has moved on.
pub fn next_receipt_number(last_number: u32, last_year: i32, clock: &dyn Clock) -> String {
    let year = clock.year();
    let next = if year == last_year {
        last_number.saturating_add(1)
    } else {
        1
    };
    format_receipt_number(year, next)
}

fn sequence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/(\d+)$").expect("static pattern"))
}

/// Numeric suffix after the final `/`, if the receipt number ends in digits.
pub fn parse_sequence(receipt_no: &str) -> Option<u32> {
    sequence_re()
        .captures(receipt_no)
        .and_then(|caps| caps[1].parse().ok())
}
