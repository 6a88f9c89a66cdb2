//! Calendar date parsing for player and tournament fields

use chrono::{Local, NaiveDate};

use crate::error::{ClubError, Result};

/// Accepted input formats: club convention first, then ISO 8601
const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

/// Parse a calendar date, naming `field` in the error
pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| {
            ClubError::validation(field, format!("'{raw}' is not a date (expected DD/MM/YYYY)"))
        })
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
