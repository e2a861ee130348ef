//! Validates the `year` and `month` query parameters of the summary
//! endpoints and turns them into date ranges.

use std::ops::RangeInclusive;

use serde::Deserialize;
use time::{Date, Month};

use crate::Error;

/// The smallest year accepted in a summary request.
pub const MIN_YEAR: i32 = 1000;
/// The largest year accepted in a summary request.
pub const MAX_YEAR: i32 = 9999;

/// The raw query parameters of a summary request.
///
/// The values are kept as strings so that bad input is reported with the
/// summary error messages instead of a generic query rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    /// The year to summarise.
    pub year: Option<String>,
    /// The month to summarise, 1 for January.
    pub month: Option<String>,
}

/// Parse a year, falling back to `default` when no year was given.
///
/// # Errors
///
/// Returns [Error::InvalidYear] if the year is not an integer between
/// [MIN_YEAR] and [MAX_YEAR].
pub fn parse_year(raw_year: Option<&str>, default: i32) -> Result<i32, Error> {
    let Some(raw_year) = raw_year else {
        return Ok(default);
    };

    match raw_year.trim().parse::<i32>() {
        Ok(year) if (MIN_YEAR..=MAX_YEAR).contains(&year) => Ok(year),
        _ => Err(Error::InvalidYear),
    }
}

/// Parse an optional month. An empty value counts as no month.
///
/// # Errors
///
/// Returns [Error::InvalidMonth] if the month is not an integer from 1 to 12.
pub fn parse_month(raw_month: Option<&str>) -> Result<Option<Month>, Error> {
    let raw_month = match raw_month.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw_month) => raw_month,
    };

    raw_month
        .parse::<u8>()
        .ok()
        .and_then(|month| Month::try_from(month).ok())
        .map(Some)
        .ok_or(Error::InvalidMonth)
}

/// The days in `month` of `year`, or the whole year if `month` is `None`.
///
/// # Errors
///
/// Returns [Error::InvalidYear] if `year` is outside the range of supported dates.
pub fn date_range(year: i32, month: Option<Month>) -> Result<RangeInclusive<Date>, Error> {
    let (first_month, last_month) = match month {
        Some(month) => (month, month),
        None => (Month::January, Month::December),
    };

    let start = Date::from_calendar_date(year, first_month, 1).map_err(|_| Error::InvalidYear)?;
    let end = (28..=31)
        .rev()
        .find_map(|day| Date::from_calendar_date(year, last_month, day).ok())
        .ok_or(Error::InvalidYear)?;

    Ok(start..=end)
}
